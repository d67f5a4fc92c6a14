//! Rate-limit-aware API client
//!
//! Wraps every outbound call with retry/backoff and HTTP error
//! classification:
//! - 200 with a JSON body succeeds
//! - 404 returns `NotFound` immediately, no retries
//! - 401/403 return `Unauthorized` immediately (bad credential or denied key)
//! - 429 retries with backoff, honoring a `Retry-After` hint when present
//! - 5xx and network failures retry with backoff
//! - anything else fails as `UnexpectedStatus` without retrying

mod backoff;
mod transport;

pub use backoff::{Backoff, RetryPolicy};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};

use crate::api::MemberList;
use crate::tag;
use serde_json::Value;
use thiserror::Error;

/// Classified failures of a logical fetch
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Rate limited on {path} after {attempts} attempts")]
    RateLimited { path: String, attempts: u32 },

    #[error("Entity not found: {path}")]
    NotFound { path: String },

    #[error("Unauthorized (HTTP {status}); check the API credential")]
    Unauthorized { status: u16 },

    #[error("Transient failure on {path} after {attempts} attempts: {last_error}")]
    Transient {
        path: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Failed to parse response from {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unexpected HTTP status {status} from {path}")]
    UnexpectedStatus { path: String, status: u16 },
}

/// API client generic over its transport
pub struct ApiClient<T> {
    transport: T,
    base_url: String,
    policy: RetryPolicy,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        let base_url = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    /// Fetches the member roster of a clan, returning canonical player tags.
    pub async fn clan_members(&self, clan_tag: &str) -> Result<Vec<String>, ClientError> {
        let path = format!("clans/{}/members", tag::encode_for_path(clan_tag));
        let body = self.get_json(&path).await?;

        let list: MemberList =
            serde_json::from_value(body).map_err(|e| ClientError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Ok(list
            .items
            .into_iter()
            .map(|m| tag::canonical(&m.tag))
            .collect())
    }

    /// Fetches a player's battle log as raw JSON values.
    ///
    /// Entries are kept raw so the normalizer can skip malformed battles
    /// individually instead of failing the whole log.
    pub async fn battle_log(&self, player_tag: &str) -> Result<Vec<Value>, ClientError> {
        let path = format!("players/{}/battlelog", tag::encode_for_path(player_tag));
        let body = self.get_json(&path).await?;

        match body {
            Value::Array(battles) => Ok(battles),
            other => Err(ClientError::Parse {
                path,
                message: format!("expected a JSON array of battles, got {}", kind_of(&other)),
            }),
        }
    }

    /// One logical fetch: issues the request, classifies the outcome, and
    /// retries per the policy. Backoff state is fresh per call.
    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut backoff = Backoff::new(self.policy);

        loop {
            match self.transport.get(&url).await {
                Ok(response) => match response.status {
                    200 => {
                        return serde_json::from_str(&response.body).map_err(|e| {
                            ClientError::Parse {
                                path: path.to_string(),
                                message: e.to_string(),
                            }
                        });
                    }
                    404 => {
                        return Err(ClientError::NotFound {
                            path: path.to_string(),
                        });
                    }
                    status @ (401 | 403) => {
                        return Err(ClientError::Unauthorized { status });
                    }
                    429 => match backoff.next_delay(response.retry_after) {
                        Some(delay) => {
                            tracing::warn!(
                                "Rate limited on {}, retrying in {:?} (attempt {})",
                                path,
                                delay,
                                backoff.attempts()
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(ClientError::RateLimited {
                                path: path.to_string(),
                                attempts: backoff.attempts(),
                            });
                        }
                    },
                    status if status >= 500 => match backoff.next_delay(None) {
                        Some(delay) => {
                            tracing::warn!(
                                "HTTP {} on {}, retrying in {:?} (attempt {})",
                                status,
                                path,
                                delay,
                                backoff.attempts()
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(ClientError::Transient {
                                path: path.to_string(),
                                attempts: backoff.attempts(),
                                last_error: format!("HTTP {}", status),
                            });
                        }
                    },
                    status => {
                        return Err(ClientError::UnexpectedStatus {
                            path: path.to_string(),
                            status,
                        });
                    }
                },
                Err(transport_error) => match backoff.next_delay(None) {
                    Some(delay) => {
                        tracing::warn!(
                            "Request to {} failed ({}), retrying in {:?} (attempt {})",
                            path,
                            transport_error,
                            delay,
                            backoff.attempts()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(ClientError::Transient {
                            path: path.to_string(),
                            attempts: backoff.attempts(),
                            last_error: transport_error.to_string(),
                        });
                    }
                },
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
