//! HTTP client for the RiskWatch server.

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use riskwatch_core::{AlertRecord, RiskCheckRequest, RiskReport};

use crate::decoder::RecordDecoder;
use crate::error::ClientError;
use crate::tracker::RunTracker;

const EVENT_STREAM: &str = "text/event-stream";

/// Client for the risk check API.
#[derive(Debug, Clone)]
pub struct RiskClient {
    inner: reqwest::Client,
    base_url: String,
}

impl RiskClient {
    /// Create a new client.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client over a preconfigured `reqwest::Client`.
    pub fn with_client(inner: reqwest::Client, base_url: &str) -> Self {
        Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a streaming risk check, folding every event into `tracker`.
    ///
    /// `on_update` is called after every state change. Transport failures
    /// fail the tracker and are also returned. If the stream ends without a
    /// terminal event the tracker is left loading; callers decide how long
    /// to wait.
    pub async fn stream_check<F>(
        &self,
        request: &RiskCheckRequest,
        tracker: &mut RunTracker,
        mut on_update: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&RunTracker),
    {
        tracker.begin();
        on_update(&*tracker);

        let url = format!("{}/api/check-risk-stream", self.base_url);
        debug!(url = %url, location = %request.location, "Opening risk stream");

        let sent = self
            .inner
            .post(&url)
            .header(ACCEPT, EVENT_STREAM)
            .json(request)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                tracker.fail_transport(format!("Connection failed: {}", e));
                on_update(&*tracker);
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracker.fail_transport(format!("Server returned HTTP {}", status.as_u16()));
            on_update(&*tracker);
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(EVENT_STREAM) {
            let message = format!("Expected an event stream, got '{}'", content_type);
            tracker.fail_transport(message.clone());
            on_update(&*tracker);
            return Err(ClientError::UnexpectedBody(message));
        }

        let mut decoder = RecordDecoder::new();
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in decoder.push(&bytes) {
                        tracker.apply(event);
                        on_update(&*tracker);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Risk stream interrupted");
                    tracker.fail_transport(format!("Connection lost: {}", e));
                    on_update(&*tracker);
                    return Err(e.into());
                }
            }
        }

        if let Some(event) = decoder.finish() {
            tracker.apply(event);
            on_update(&*tracker);
        }

        if decoder.dropped_records() > 0 {
            warn!(
                dropped = decoder.dropped_records(),
                "Skipped malformed records in risk stream"
            );
        }
        if tracker.is_loading() {
            warn!("Risk stream ended without a result or error");
        }

        Ok(())
    }

    /// Run a risk check and wait for the full report.
    pub async fn check(&self, request: &RiskCheckRequest) -> Result<RiskReport, ClientError> {
        let url = format!("{}/api/check-risk", self.base_url);
        debug!(url = %url, "POST request");

        let response = self.inner.post(&url).json(request).send().await?;
        Self::json_body(response).await
    }

    /// Most recent alerts logged for a user.
    pub async fn alert_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, ClientError> {
        let url = format!("{}/api/users/{}/alerts", self.base_url, user_id);
        debug!(url = %url, limit, "GET request");

        let response = self
            .inner
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::json_body(response).await
    }

    /// Check if the server is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking health");

        let response = self.inner.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    async fn json_body<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}
