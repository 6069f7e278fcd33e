// crates/remote/src/client.rs
//! HTTP client for the fleet REST API
//!
//! Outbound writes (POST/PUT/DELETE) retry transient failures up to the
//! policy bound and never retry an explicit 4xx rejection. Collection
//! fetches are single-shot: a failed fetch aborts the reconciliation pass
//! for that entity type, and the pass itself is re-runnable.

use crate::error::{RemoteError, RemoteResult};
use crate::response::parse_created_id;
use chrono::{DateTime, Utc};
use fleetsync_resilience::{with_retry, RetryError, RetryPolicy};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Outcome of a remote delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The remote removed the record
    Deleted,
    /// The remote never had (or no longer has) the record
    NotFound,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Budget for full-collection fetches
    pub collection_timeout: Duration,
    /// Budget for single-record calls
    pub record_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retry policy for outbound writes
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            collection_timeout: Duration::from_secs(30),
            record_timeout: Duration::from_secs(10),
            user_agent: format!("FleetSync/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: RetryPolicy::new(3).with_initial_delay(Duration::from_millis(200)),
        }
    }
}

/// REST client with retry on transient failures
#[derive(Clone)]
pub struct ApiClient {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl ApiClient {
    /// Creates a new client with default configuration
    pub fn new() -> RemoteResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> RemoteResult<Self> {
        let client = ReqwestClient::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(RemoteError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Fetches a full collection, optionally filtered by a watermark
    ///
    /// Single attempt: fetch failures abort the caller's pass rather than
    /// being papered over by retries.
    pub async fn fetch_collection(
        &self,
        url: &str,
        since: Option<DateTime<Utc>>,
    ) -> RemoteResult<Vec<Value>> {
        let mut request = self
            .inner
            .get(url)
            .timeout(self.config.collection_timeout)
            .header("Content-Type", "application/json");
        if let Some(since) = since {
            request = request.query(&[("updatedSince", since.to_rfc3339())]);
        }

        log::info!("Fetching collection from {url}");
        let response = request.send().await.map_err(RemoteError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(RemoteError::Http)?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(items)) => {
                log::info!("Remote returned {} records from {url}", items.len());
                Ok(items)
            }
            Ok(other) => Err(RemoteError::MalformedResponse(format!(
                "expected a JSON array, got {other}"
            ))),
            Err(e) => Err(RemoteError::MalformedResponse(e.to_string())),
        }
    }

    /// POSTs a new record and returns the remote-assigned identifier
    pub async fn create(&self, url: &str, entity: &str, body: &Value) -> RemoteResult<i64> {
        let text = self
            .send_with_retry(Method::POST, url, Some(body), |status| status.is_success())
            .await?;
        parse_created_id(entity, &text)
    }

    /// PUTs the full current payload; 200/201/204 all count as success
    pub async fn update(&self, url: &str, body: &Value) -> RemoteResult<()> {
        self.send_with_retry(Method::PUT, url, Some(body), |status| {
            matches!(
                status,
                StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
            )
        })
        .await?;
        Ok(())
    }

    /// DELETEs a record; 404 is reported as `NotFound`, not a failure
    pub async fn delete(&self, url: &str) -> RemoteResult<DeleteOutcome> {
        let result = self
            .send_with_retry(Method::DELETE, url, None, |status| {
                matches!(status, StatusCode::OK | StatusCode::NO_CONTENT)
            })
            .await;

        match result {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(RemoteError::Rejected { status: 404, .. }) => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e),
        }
    }

    /// Sends a write with bounded retry
    ///
    /// Transient transport errors and 5xx responses are retried with the
    /// policy's backoff; 4xx rejections are final on the first occurrence.
    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        is_success: impl Fn(StatusCode) -> bool,
    ) -> RemoteResult<String> {
        let result = with_retry(
            &self.config.retry_policy,
            || self.send_once(&method, url, body, &is_success),
            RemoteError::is_retryable,
        )
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(RetryError::Rejected(e)) => Err(e),
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => match last_error {
                // A final 5xx keeps its status; transport errors surface
                // as exhausted retries
                e @ RemoteError::UnexpectedStatus { .. } => Err(e),
                other => Err(RemoteError::RetriesExhausted {
                    attempts,
                    last_error: other.to_string(),
                }),
            },
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        is_success: &impl Fn(StatusCode) -> bool,
    ) -> RemoteResult<String> {
        let mut request = self
            .inner
            .request(method.clone(), url)
            .timeout(self.config.record_timeout)
            .header("Content-Type", "application/json; charset=utf-8");
        if let Some(body) = body {
            request = request.json(body);
        }

        log::info!("Sending {method} request to {url}");
        let response = request.send().await.map_err(RemoteError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(RemoteError::Http)?;
        log::debug!("{method} {url} answered {status}: {text}");

        if is_success(status) {
            Ok(text)
        } else {
            Err(status_error(status, text))
        }
    }
}

/// Maps a non-success status to the matching error variant
fn status_error(status: StatusCode, body: String) -> RemoteError {
    if status.is_client_error() {
        RemoteError::Rejected {
            status: status.as_u16(),
            body,
        }
    } else {
        RemoteError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.collection_timeout, Duration::from_secs(30));
        assert_eq!(config.record_timeout, Duration::from_secs(10));
        assert_eq!(config.retry_policy.max_attempts(), 3);
    }

    #[test]
    fn test_client_creation() {
        assert!(ApiClient::new().is_ok());
    }

    #[test]
    fn test_status_error_split() {
        let err = status_error(StatusCode::BAD_REQUEST, "nope".to_string());
        assert!(matches!(err, RemoteError::Rejected { status: 400, .. }));
        assert!(!err.is_retryable());

        let err = status_error(StatusCode::BAD_GATEWAY, "gateway".to_string());
        assert!(matches!(
            err,
            RemoteError::UnexpectedStatus { status: 502, .. }
        ));
        assert!(err.is_retryable());
    }
}
