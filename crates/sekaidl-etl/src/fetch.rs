//! Network fetch capability.
//!
//! Every component that touches the network takes an `Arc<dyn Fetch>` so
//! tests can swap in canned pages.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::{PipelineError, PipelineResult};

/// Status code and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Return the body, or [`PipelineError::Fetch`] for a non-2xx status.
    ///
    /// # Errors
    /// Fails when the status is outside 200..=299.
    pub fn into_success(self, url: &str) -> PipelineResult<Vec<u8>> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(PipelineError::Fetch {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// A GET-only HTTP capability.
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status, and `Err` only when no response was obtained.
#[async_trait]
pub trait Fetch: Send + Sync + std::fmt::Debug {
    async fn get(&self, url: &str) -> PipelineResult<FetchResponse>;
}

/// [`Fetch`] backed by `reqwest`, sending the same identifying headers on
/// every request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    retries: usize,
}

impl HttpFetcher {
    /// Create a fetcher from the HTTP section of the config.
    ///
    /// # Errors
    /// Returns an error if a header value is not valid ASCII or the client
    /// cannot be built.
    pub fn new(config: &HttpConfig) -> PipelineResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("user_agent", &config.user_agent)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("accept_language", &config.accept_language)?,
        );
        headers.insert(REFERER, header_value("referer", &config.referer)?);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            retries: config.retries,
        })
    }

    async fn get_once(&self, url: &str) -> Result<FetchResponse, reqwest::Error> {
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(FetchResponse { status, body })
    }
}

fn header_value(field: &str, value: &str) -> PipelineResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        PipelineError::Model(sekaidl_core::Error::InvalidData(format!(
            "http.{field} is not a valid header value: {e}"
        )))
    })
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> PipelineResult<FetchResponse> {
        let response = (|| self.get_once(url))
            .retry(ExponentialBuilder::default().with_max_times(self.retries))
            .when(|e: &reqwest::Error| e.is_timeout() || e.is_connect())
            .notify(|e: &reqwest::Error, wait: Duration| {
                log::warn!("Retrying {} in {:?} after error: {}", url, wait, e);
            })
            .await
            .map_err(|source| PipelineError::Transport {
                url: url.to_string(),
                source,
            })?;

        log::debug!("GET {} -> {}", url, response.status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_creation() {
        let fetcher = HttpFetcher::new(&HttpConfig::default());
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_http_fetcher_rejects_bad_header() {
        let config = HttpConfig {
            referer: "bad\nvalue".to_string(),
            ..HttpConfig::default()
        };
        assert!(HttpFetcher::new(&config).is_err());
    }

    #[test]
    fn test_into_success_passes_2xx_body() {
        let body = FetchResponse::new(200, b"ok".to_vec()).into_success("https://x");
        assert_eq!(body.unwrap(), b"ok".to_vec());
    }

    #[test]
    fn test_into_success_maps_status_to_fetch_error() {
        let err = FetchResponse::new(503, Vec::new())
            .into_success("https://wiki.test/x")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Fetch { status: 503, .. }));
    }
}
