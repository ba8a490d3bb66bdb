//! Transport Client
//!
//! Sends one protocol message to a counterpart URL and returns its response
//! body. One round trip, no retry: the engines decide what a failure means.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProtocolError;

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and return the decoded response body.
    ///
    /// A counterpart that answers with a non-success status is a `Transport`
    /// failure; the remote error code and reasons are kept in the message.
    async fn send(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ProtocolError>;
}

/// Join a callback base address and an endpoint path
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Error body shape returned by a rejecting counterpart
#[derive(Deserialize)]
struct RemoteError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    reason: Vec<String>,
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ProtocolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProtocolError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ProtocolError> {
        debug!(url = %url, "Sending protocol message");

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProtocolError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = match serde_json::from_slice::<RemoteError>(&bytes) {
                Ok(remote) => format!("{} {:?}", remote.code, remote.reason),
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            warn!(url = %url, status = status.as_u16(), "Counterpart rejected message");
            return Err(ProtocolError::Transport(format!(
                "counterpart returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            ProtocolError::InvalidAcknowledgment(format!("response is not JSON: {}", e))
        })
    }
}
