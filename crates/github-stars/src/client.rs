//! GitHub stargazers HTTP client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GithubConfig;
use crate::error::GithubError;
use crate::EndorserSource;

const USER_AGENT: &str = concat!("budgetbot/", env!("CARGO_PKG_VERSION"));

/// One entry of the `/stargazers` listing.
#[derive(Debug, Deserialize)]
struct Stargazer {
    login: String,
}

/// Fetches the stargazers of the configured repository.
#[derive(Clone)]
pub struct StargazerClient {
    http: Client,
    config: GithubConfig,
}

impl StargazerClient {
    /// Create a client for the configured repository.
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Build from environment variables.
    pub fn from_env() -> Result<Self, GithubError> {
        Self::new(GithubConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// Public web URL of the gating repository.
    pub fn repository_url(&self) -> String {
        self.config.repository_url()
    }

    /// Fetch every stargazer login, following pagination links.
    ///
    /// `config.timeout` bounds the whole lookup, however many pages it takes.
    pub async fn fetch_stargazers(&self) -> Result<Vec<String>, GithubError> {
        let deadline = self.config.timeout;
        tokio::time::timeout(deadline, self.fetch_all_pages())
            .await
            .map_err(|_| GithubError::Timeout(deadline))?
    }

    async fn fetch_all_pages(&self) -> Result<Vec<String>, GithubError> {
        let mut logins = Vec::new();
        let mut next = Some(self.config.stargazers_url());
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            if pages >= self.config.max_pages {
                warn!(
                    "Stopped after {} stargazer pages for {}/{}; list may be incomplete",
                    pages, self.config.owner, self.config.repo
                );
                break;
            }

            let (page, next_url) = self.fetch_page(&url).await?;
            pages += 1;
            logins.extend(page.into_iter().map(|s| s.login));
            next = next_url;
        }

        debug!(
            "Fetched {} stargazers for {}/{} in {} page(s)",
            logins.len(),
            self.config.owner,
            self.config.repo,
            pages
        );
        Ok(logins)
    }

    async fn fetch_page(&self, url: &str) -> Result<(Vec<Stargazer>, Option<String>), GithubError> {
        debug!("Fetching stargazers page: {}", url);

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(ref token) = self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_url);

        let page: Vec<Stargazer> = response.json().await?;
        Ok((page, next))
    }
}

#[async_trait]
impl EndorserSource for StargazerClient {
    async fn fetch_endorsers(&self) -> Result<Vec<String>, GithubError> {
        self.fetch_stargazers().await
    }

    fn endorsement_url(&self) -> String {
        self.repository_url()
    }
}

impl std::fmt::Debug for StargazerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StargazerClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Extract the `rel="next"` target from a GitHub `Link` header.
pub fn next_page_url(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|param| param.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
