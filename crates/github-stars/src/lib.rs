//! GitHub stargazer lookup for registration gating.
//!
//! Registration with the bot is limited to people who starred a configured
//! repository. This crate provides:
//!
//! - [`EndorserSource`] - the trait the bot consults when a user registers
//! - [`StargazerClient`] - the GitHub REST implementation (paginated)
//! - [`is_endorser`] - case-insensitive membership test
//!
//! # Example
//!
//! ```no_run
//! use github_stars::{is_endorser, GithubConfig, StargazerClient};
//!
//! # async fn example() -> Result<(), github_stars::GithubError> {
//! let client = StargazerClient::new(GithubConfig::new("octocat", "hello-world"))?;
//! let stargazers = client.fetch_stargazers().await?;
//! println!("octocat starred it: {}", is_endorser("OctoCat", &stargazers));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{next_page_url, StargazerClient};
pub use config::GithubConfig;
pub use error::GithubError;

use async_trait::async_trait;

/// A source of handles allowed to register.
#[async_trait]
pub trait EndorserSource: Send + Sync {
    /// Fetch the complete, current list of endorser handles.
    ///
    /// Called once per registration attempt; implementations should not cache.
    async fn fetch_endorsers(&self) -> Result<Vec<String>, GithubError>;

    /// Where a user can go to become an endorser.
    fn endorsement_url(&self) -> String;
}

/// Check whether `handle` appears in `endorsers`, ignoring ASCII case.
pub fn is_endorser(handle: &str, endorsers: &[String]) -> bool {
    let handle = handle.trim();
    !handle.is_empty() && endorsers.iter().any(|e| e.eq_ignore_ascii_case(handle))
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
