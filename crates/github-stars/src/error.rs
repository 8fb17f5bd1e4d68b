//! Error types for github-stars.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while fetching stargazers.
#[derive(Debug, Error)]
pub enum GithubError {
    /// HTTP request failed, timed out, or the body was not valid JSON.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The whole stargazer lookup did not finish in time.
    #[error("GitHub lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
