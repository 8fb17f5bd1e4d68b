//! Configuration for the stargazer client.

use std::env;
use std::time::Duration;

use crate::error::GithubError;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Configuration identifying the repository whose stargazers may register.
#[derive(Clone)]
pub struct GithubConfig {
    /// REST API base URL.
    pub api_url: String,
    /// Repository owner (user or organisation).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Optional token; raises the rate limit from 60 to 5000 requests/hour.
    pub token: Option<String>,
    /// Deadline for a whole stargazer lookup, all pages included.
    pub timeout: Duration,
    /// Stargazers requested per page (GitHub caps this at 100).
    pub per_page: u32,
    /// Upper bound on pages fetched per lookup.
    pub max_pages: u32,
}

impl GithubConfig {
    /// Create a configuration for `owner/repo` with default settings.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: None,
            timeout: Duration::from_secs(10),
            per_page: 100,
            max_pages: 50,
        }
    }

    /// Set an API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GITHUB_REPO_OWNER`
    /// - `GITHUB_REPO_NAME`
    ///
    /// Optional env vars:
    /// - `GITHUB_TOKEN`
    /// - `GITHUB_API_URL` (default: https://api.github.com)
    /// - `GITHUB_TIMEOUT_SECS` (default: 10)
    /// - `GITHUB_MAX_PAGES` (default: 50)
    pub fn from_env() -> Result<Self, GithubError> {
        let owner = env::var("GITHUB_REPO_OWNER")
            .map_err(|_| GithubError::Config("GITHUB_REPO_OWNER not set".to_string()))?;
        let repo = env::var("GITHUB_REPO_NAME")
            .map_err(|_| GithubError::Config("GITHUB_REPO_NAME not set".to_string()))?;

        let mut config = Self::new(owner, repo);

        if let Ok(url) = env::var("GITHUB_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }

        config.token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        if let Some(secs) = env::var("GITHUB_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(pages) = env::var("GITHUB_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_pages = pages;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), GithubError> {
        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(GithubError::Config(
                "repository owner and name must not be empty".to_string(),
            ));
        }
        if self.per_page == 0 || self.per_page > 100 {
            return Err(GithubError::Config(format!(
                "per_page must be between 1 and 100, got {}",
                self.per_page
            )));
        }
        if self.max_pages == 0 {
            return Err(GithubError::Config("max_pages must be at least 1".to_string()));
        }
        Ok(())
    }

    /// URL of the first stargazers page.
    pub fn stargazers_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/stargazers?per_page={}",
            self.api_url, self.owner, self.repo, self.per_page
        )
    }

    /// Public web URL of the repository.
    pub fn repository_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("per_page", &self.per_page)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}
