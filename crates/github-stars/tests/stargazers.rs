//! Integration tests for github-stars.
//!
//! The network tests are ignored by default. Run them with:
//!   GITHUB_REPO_OWNER=rust-lang GITHUB_REPO_NAME=rustlings \
//!     cargo test -p github-stars --test stargazers -- --ignored

use std::env;
use std::time::Duration;

use github_stars::{EndorserSource, GithubConfig, GithubError, StargazerClient};

// ============================================================================
// Configuration (no network required)
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GithubConfig::new("octocat", "hello-world");
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.per_page, 100);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_config_urls() {
        let config = GithubConfig::new("octocat", "hello-world");
        assert_eq!(
            config.stargazers_url(),
            "https://api.github.com/repos/octocat/hello-world/stargazers?per_page=100"
        );
        assert_eq!(
            config.repository_url(),
            "https://github.com/octocat/hello-world"
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(GithubConfig::new("octocat", "hello-world").validate().is_ok());
        assert!(matches!(
            GithubConfig::new("", "hello-world").validate(),
            Err(GithubError::Config(_))
        ));

        let mut config = GithubConfig::new("octocat", "hello-world");
        config.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endorsement_url() {
        let client = StargazerClient::new(GithubConfig::new("octocat", "hello-world")).unwrap();
        assert_eq!(
            client.endorsement_url(),
            "https://github.com/octocat/hello-world"
        );
    }
}

// ============================================================================
// Local server (loopback only)
// ============================================================================

mod deadline_tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Answer every request after `delay` with one stargazer and a `next` link.
    async fn serve_slow_pages(listener: TcpListener, delay: Duration) {
        let addr = listener.local_addr().unwrap();
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(serve_connection(stream, addr.to_string(), delay));
        }
    }

    async fn serve_connection(mut stream: TcpStream, host: String, delay: Duration) {
        let mut page = 1u32;
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            buf.clear();

            tokio::time::sleep(delay).await;
            page += 1;
            let body = format!("[{{\"login\":\"user{}\"}}]", page);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                 Link: <http://{}/stargazers?page={}>; rel=\"next\"\r\n\
                 Content-Length: {}\r\n\r\n{}",
                host,
                page,
                body.len(),
                body
            );
            if stream.write_all(response.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_deadline_covers_all_pages() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_slow_pages(listener, Duration::from_millis(60)));

        // Each page answers well inside the deadline; the full walk does not.
        let mut config = GithubConfig::new("octocat", "hello-world");
        config.api_url = format!("http://{}", addr);
        config.timeout = Duration::from_millis(300);
        let client = StargazerClient::new(config).unwrap();

        let started = Instant::now();
        let result = client.fetch_endorsers().await;

        assert!(
            matches!(result, Err(GithubError::Timeout(d)) if d == Duration::from_millis(300)),
            "{:?}",
            result
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}

// ============================================================================
// Network tests
// ============================================================================

#[tokio::test]
#[ignore] // Requires network
async fn test_fetch_stargazers() {
    let _ = dotenvy::dotenv();
    let owner = env::var("GITHUB_REPO_OWNER").unwrap_or_else(|_| "rust-lang".to_string());
    let repo = env::var("GITHUB_REPO_NAME").unwrap_or_else(|_| "rustlings".to_string());

    let mut config = GithubConfig::new(owner, repo);
    config.max_pages = 2;
    let client = StargazerClient::new(config).unwrap();

    let stargazers = client.fetch_endorsers().await.unwrap();
    assert!(!stargazers.is_empty());
}

#[tokio::test]
#[ignore] // Requires network
async fn test_unknown_repository_is_an_error() {
    let client = StargazerClient::new(GithubConfig::new(
        "this-owner-should-not-exist-4f1c",
        "nor-this-repo",
    ))
    .unwrap();

    let result = client.fetch_stargazers().await;
    assert!(matches!(result, Err(GithubError::Status { status: 404, .. })));
}
