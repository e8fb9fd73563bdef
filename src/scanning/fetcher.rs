//! Page fetcher for feature extraction
//!
//! Single-attempt HTTP fetching with hard time budgets:
//! - The target page, redirects followed manually so hops can be counted
//! - The site's robots.txt, reduced to a present/absent flag

use std::time::{Duration, Instant};

use reqwest::header::LOCATION;
use thiserror::Error;
use url::Url;

use crate::config::ScanningConfig;

/// Errors that can occur during fetching
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(usize),
    #[error("Failed to parse URL: {0}")]
    InvalidUrl(String),
}

/// Result of a successful page fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the body was finally served from
    pub final_url: Url,
    /// Final HTTP status code (always 2xx)
    pub status_code: u16,
    /// Response body as text
    pub body: String,
    /// Redirect hops followed before the final response
    pub redirect_count: usize,
    /// Status codes of the redirect responses, in order
    pub history: Vec<u16>,
    /// Time taken to fetch
    pub fetch_duration: Duration,
}

/// HTTP fetcher for target pages and robots.txt checks
pub struct PageFetcher {
    /// Client that never follows redirects on its own
    page_client: reqwest::Client,
    /// Client for robots.txt, follows redirects like a browser would
    robots_client: reqwest::Client,
    page_timeout: Duration,
    robots_timeout: Duration,
    max_redirects: usize,
    max_content_size: usize,
}

impl PageFetcher {
    /// Create a new fetcher
    pub fn new(config: &ScanningConfig) -> Result<Self, FetchError> {
        let page_timeout = Duration::from_secs(config.page_timeout_secs);
        let robots_timeout = Duration::from_secs(config.robots_timeout_secs);

        let page_client = reqwest::Client::builder()
            .timeout(page_timeout)
            .connect_timeout(page_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        let robots_client = reqwest::Client::builder()
            .timeout(robots_timeout)
            .connect_timeout(robots_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            page_client,
            robots_client,
            page_timeout,
            robots_timeout,
            max_redirects: config.max_redirects,
            max_content_size: config.max_content_size,
        })
    }

    /// Fetch `url`, following redirects, within the page time budget.
    ///
    /// Fails on network errors, timeouts, redirect loops, oversized bodies
    /// and any non-2xx final status.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        match tokio::time::timeout(self.page_timeout, self.fetch_following(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.page_timeout)),
        }
    }

    async fn fetch_following(&self, mut url: Url) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        let mut history = Vec::new();

        loop {
            let mut response = self.page_client.get(url.as_str()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.to_string());

                // A redirect status without a usable Location is the final response
                if let Some(location) = location {
                    if history.len() >= self.max_redirects {
                        return Err(FetchError::TooManyRedirects(self.max_redirects));
                    }
                    let next = url
                        .join(&location)
                        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", location, e)))?;
                    tracing::debug!("Redirect {} -> {} ({})", url, next, status.as_u16());
                    history.push(status.as_u16());
                    url = next;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            if let Some(len) = response.content_length() {
                if len as usize > self.max_content_size {
                    return Err(FetchError::ContentTooLarge(len as usize));
                }
            }

            // Chunked or close-delimited bodies carry no length; stop reading
            // as soon as the cap is crossed
            let mut bytes = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                let total = bytes.len() + chunk.len();
                if total > self.max_content_size {
                    return Err(FetchError::ContentTooLarge(total));
                }
                bytes.extend_from_slice(&chunk);
            }
            let body = String::from_utf8_lossy(&bytes).into_owned();

            return Ok(FetchedPage {
                final_url: url,
                status_code: status.as_u16(),
                body,
                redirect_count: history.len(),
                history,
                fetch_duration: start.elapsed(),
            });
        }
    }

    /// Whether `<origin>/robots.txt` answers with exactly HTTP 200.
    ///
    /// Every failure, including a malformed URL, counts as absent.
    pub async fn has_robots_txt(&self, url: &str) -> bool {
        let Some(robots_url) = robots_url(url) else {
            return false;
        };

        let request = self.robots_client.get(robots_url.as_str()).send();
        match tokio::time::timeout(self.robots_timeout, request).await {
            Ok(Ok(response)) => response.status().as_u16() == 200,
            Ok(Err(e)) => {
                tracing::debug!("robots.txt check failed for {}: {}", robots_url, e);
                false
            }
            Err(_) => {
                tracing::debug!("robots.txt check timed out for {}", robots_url);
                false
            }
        }
    }
}

/// Build the robots.txt URL at the origin of `url`
pub fn robots_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    if !parsed.has_host() || !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.join("/robots.txt").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_url_uses_origin() {
        let url = robots_url("https://example.com:8443/a/b?c=d#e").unwrap();
        assert_eq!(url.as_str(), "https://example.com:8443/robots.txt");
    }

    #[test]
    fn test_robots_url_rejects_non_http() {
        assert!(robots_url("ftp://example.com/file").is_none());
        assert!(robots_url("not a url").is_none());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let fetcher = PageFetcher::new(&ScanningConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let fetcher = PageFetcher::new(&ScanningConfig::default()).unwrap();
        let err = fetcher.fetch("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    /// Serve one close-delimited response (no Content-Length) of `size` bytes
    async fn serve_unsized_body(size: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n")
                .await;
            for _ in 0..size / 64 {
                if socket.write_all(&[b'a'; 64]).await.is_err() {
                    return;
                }
            }
            let _ = socket.shutdown().await;
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_unsized_body_is_capped_while_streaming() {
        let config = ScanningConfig {
            max_content_size: 1024,
            ..Default::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();

        let url = serve_unsized_body(64 * 1024).await;
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::ContentTooLarge(n) if n > 1024));
    }

    #[tokio::test]
    async fn test_unsized_body_under_cap_is_read() {
        let config = ScanningConfig {
            max_content_size: 1024,
            ..Default::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();

        let url = serve_unsized_body(512).await;
        let page = fetcher.fetch(&url).await.unwrap();
        assert_eq!(page.body.len(), 512);
        assert_eq!(page.redirect_count, 0);
    }

    #[tokio::test]
    async fn test_robots_check_tolerates_bad_url() {
        let fetcher = PageFetcher::new(&ScanningConfig::default()).unwrap();
        assert!(!fetcher.has_robots_txt("::garbage::").await);
    }
}
