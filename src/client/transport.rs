//! Transport abstraction over the raw HTTP layer
//!
//! The retry and classification logic in [`super::ApiClient`] is written
//! against this trait, so tests can drive it with scripted responses while
//! production uses a reqwest-backed [`HttpTransport`].

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A raw HTTP response, reduced to what classification needs
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,

    /// Parsed `Retry-After` header, if the server sent one.
    pub retry_after: Option<Duration>,

    pub body: String,
}

/// Errors raised below the HTTP status level
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Other(String),
}

/// Minimal outbound interface the client needs: an authenticated GET.
pub trait Transport {
    fn get(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Production transport backed by reqwest, attaching the bearer credential
/// to every request.
pub struct HttpTransport {
    client: Client,
    token: String,
}

impl HttpTransport {
    /// Builds the transport with the externally supplied API token.
    pub fn new(token: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_transport() {
        let transport = HttpTransport::new("test-token");
        assert!(transport.is_ok());
    }
}
