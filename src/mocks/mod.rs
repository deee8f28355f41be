//! Mock transport for tests.
//!
//! Queues canned responses per path and records every call with its
//! timestamp, so tests can assert call counts, ordering, and the spacing
//! the rate governor enforced.

use crate::errors::{ExportError, ExportResult, ResponseError};
use crate::transport::{ApiRequest, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::HeaderMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::time::Instant;

/// One recorded transport call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Request URL
    pub url: String,
    /// Form parameters (empty for downloads)
    pub params: Vec<(String, String)>,
    /// When the call arrived
    pub at: Instant,
}

impl RecordedCall {
    /// Value of a form parameter, if present
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory transport returning queued responses in FIFO order.
#[derive(Default)]
pub struct MockHttpTransport {
    api_responses: Mutex<VecDeque<ExportResult<serde_json::Value>>>,
    download_responses: Mutex<VecDeque<ExportResult<Bytes>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHttpTransport {
    /// Create an empty mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful API response body
    pub fn push_response(&self, body: serde_json::Value) {
        self.api_responses.lock().push_back(Ok(body));
    }

    /// Queue an API error
    pub fn push_error(&self, error: crate::errors::ExportError) {
        self.api_responses.lock().push_back(Err(error));
    }

    /// Queue a successful download body
    pub fn push_download(&self, body: impl Into<Bytes>) {
        self.download_responses.lock().push_back(Ok(body.into()));
    }

    /// Queue a download error
    pub fn push_download_error(&self, error: crate::errors::ExportError) {
        self.download_responses.lock().push_back(Err(error));
    }

    /// All recorded calls, in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Recorded calls whose URL ends with the given suffix
    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.url.ends_with(endpoint))
            .cloned()
            .collect()
    }

    /// Whether every queued response has been consumed
    pub fn is_drained(&self) -> bool {
        self.api_responses.lock().is_empty() && self.download_responses.lock().is_empty()
    }

    fn record(&self, url: &str, params: Vec<(String, String)>) {
        self.calls.lock().push(RecordedCall {
            url: url.to_string(),
            params,
            at: Instant::now(),
        });
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn call_api(&self, request: ApiRequest) -> ExportResult<serde_json::Value> {
        self.record(&request.url, request.params.clone());
        let next = self.api_responses.lock().pop_front().unwrap_or_else(|| {
            Err(ResponseError::UnexpectedResponse {
                message: format!("no mock response queued for {}", request.url),
            }
            .into())
        });

        // Same envelope contract as the real transport: an `ok: false`
        // body surfaces as the mapped semantic error.
        match next {
            Ok(body) if body.get("ok").and_then(|v| v.as_bool()) == Some(false) => {
                let code = body
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown_error");
                let retry_after = body.get("retry_after").and_then(|v| v.as_u64());
                Err(ExportError::from_slack_error(code, retry_after))
            }
            other => other,
        }
    }

    async fn download(&self, url: &str, _headers: HeaderMap) -> ExportResult<Bytes> {
        self.record(url, Vec::new());
        self.download_responses.lock().pop_front().unwrap_or_else(|| {
            Err(ResponseError::UnexpectedResponse {
                message: format!("no mock download queued for {}", url),
            }
            .into())
        })
    }
}

impl std::fmt::Debug for MockHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpTransport")
            .field("recorded_calls", &self.calls.lock().len())
            .finish()
    }
}
