//! Outbound HTTP for caption resources
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Response body plus status; non-success statuses are not errors at this level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
}

/// Trait for issuing GET requests
#[async_trait(?Send)]
pub trait HttpFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

/// GET `url` and return the body only when the status is a success
pub async fn fetch_text(fetcher: &dyn HttpFetcher, url: &Url) -> Result<String, FetchError> {
    let response = fetcher.get(url).await?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response.body)
}

/// reqwest-backed fetcher
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Create a new fetcher with the given request timeout and user agent
    pub fn new(timeout_seconds: u64, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new(30, DEFAULT_USER_AGENT)
    }
}

#[async_trait(?Send)]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        debug!("GET {}", url);

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        debug!("📥 {} returned HTTP {} ({} bytes)", url, status, body.len());
        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFetcher(FetchResponse);

    #[async_trait(?Send)]
    impl HttpFetcher for FixedFetcher {
        async fn get(&self, _url: &Url) -> Result<FetchResponse, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_success_range() {
        assert!(FetchResponse::new(200, "").is_success());
        assert!(FetchResponse::new(204, "").is_success());
        assert!(!FetchResponse::new(404, "").is_success());
        assert!(!FetchResponse::new(500, "").is_success());
    }

    #[test]
    fn test_fetch_text_maps_status() {
        let url = Url::parse("https://example.com/a.vtt").unwrap();

        let ok = FixedFetcher(FetchResponse::new(200, "WEBVTT"));
        assert_eq!(tokio_test::block_on(fetch_text(&ok, &url)).unwrap(), "WEBVTT");

        let missing = FixedFetcher(FetchResponse::new(404, "nope"));
        let err = tokio_test::block_on(fetch_text(&missing, &url)).unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                url: url.to_string(),
                status: 404
            }
        );
    }
}
