//! HTTP transport layer.
//!
//! Two distinct paths: JSON Web API calls (Slack `ok`/`error` envelope,
//! rate-limit headers) and raw file downloads. File URLs redirect across
//! hosts and the bearer token must only ever reach the originating host, so
//! downloads follow redirects manually instead of trusting client defaults.

use crate::errors::{ExportError, ExportResult, NetworkError, ResponseError};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{redirect, Client, ClientBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Maximum redirect hops followed for a file download
const MAX_REDIRECTS: usize = 10;

/// A Web API request (form-encoded, per Slack convention)
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Full endpoint URL
    pub url: String,
    /// Request headers (authorization included)
    pub headers: HeaderMap,
    /// Form parameters
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a new API request
    pub fn new(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            url: url.into(),
            headers,
            params: Vec::new(),
        }
    }

    /// Add a form parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Add a form parameter when the value is present
    pub fn opt_param(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }
}

/// HTTP transport trait; the seam the mock transport plugs into
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a Web API request and return the parsed envelope body
    async fn call_api(&self, request: ApiRequest) -> ExportResult<serde_json::Value>;

    /// Download a file, following redirects; the authorization header is sent
    /// only to the host the URL originally pointed at
    async fn download(&self, url: &str, headers: HeaderMap) -> ExportResult<Bytes>;
}

/// Default transport implementation using reqwest
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeouts.
    ///
    /// Redirects are disabled at the client level; downloads follow them
    /// manually so header propagation stays under our control.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> ExportResult<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ExportError::Network(NetworkError::Http(e.to_string())))?;

        Ok(Self { client })
    }

    fn retry_after_header(response: &Response) -> Option<Duration> {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Parse a Web API response: HTTP status first, then the `ok` envelope
    async fn parse_api_response(response: Response) -> ExportResult<serde_json::Value> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExportError::RateLimited {
                retry_after: Self::retry_after_header(&response),
            });
        }
        if status.is_server_error() {
            return Err(ExportError::Server {
                status: status.as_u16(),
            });
        }
        if status.is_client_error() {
            return Err(ExportError::PermanentClient {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("client error").to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExportError::Network(NetworkError::Http(e.to_string())))?;

        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ExportError::Response(ResponseError::DeserializationError {
                message: e.to_string(),
            })
        })?;

        match json.get("ok").and_then(|v| v.as_bool()) {
            Some(true) => Ok(json),
            Some(false) => {
                let code = json
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown_error");
                let retry_after = json.get("retry_after").and_then(|v| v.as_u64());
                Err(ExportError::from_slack_error(code, retry_after))
            }
            None => Err(ExportError::Response(ResponseError::UnexpectedResponse {
                message: "missing 'ok' field in response".to_string(),
            })),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn call_api(&self, request: ApiRequest) -> ExportResult<serde_json::Value> {
        let response = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .form(&request.params)
            .send()
            .await
            .map_err(ExportError::from)?;

        Self::parse_api_response(response).await
    }

    #[instrument(skip(self, headers), fields(url = %crate::observability::redact_url(url)))]
    async fn download(&self, url: &str, headers: HeaderMap) -> ExportResult<Bytes> {
        let first = Url::parse(url)
            .map_err(|e| ExportError::Network(NetworkError::Http(format!("invalid URL: {}", e))))?;
        let origin = first.origin();
        let mut current = first;

        for hop in 0..MAX_REDIRECTS {
            // Full origin (scheme, host, port): a redirect to the same host
            // name on another port is a different server.
            let same_origin = current.origin() == origin;

            let mut builder = self.client.get(current.clone());
            // The bearer token authorizes the originating origin only;
            // redirect targets carry their own signed URLs.
            if same_origin {
                builder = builder.headers(headers.clone());
            }

            let response = builder.send().await.map_err(ExportError::from)?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        ExportError::Response(ResponseError::UnexpectedResponse {
                            message: format!("redirect ({}) without Location header", status),
                        })
                    })?;
                let next = current.join(location).map_err(|e| {
                    ExportError::Network(NetworkError::Http(format!(
                        "invalid redirect target: {}",
                        e
                    )))
                })?;
                debug!(hop, target = %crate::observability::redact_url(next.as_str()), "Following redirect");
                current = next;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ExportError::RateLimited {
                    retry_after: Self::retry_after_header(&response),
                });
            }
            if status.is_server_error() {
                return Err(ExportError::Server {
                    status: status.as_u16(),
                });
            }
            if status.is_client_error() {
                warn!(status = %status, "File download rejected");
                return Err(ExportError::PermanentClient {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("client error").to_string(),
                });
            }

            return response
                .bytes()
                .await
                .map_err(|e| ExportError::Network(NetworkError::Http(e.to_string())));
        }

        Err(ExportError::Network(NetworkError::Http(
            "too many redirects".to_string(),
        )))
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_request_builder() {
        let request = ApiRequest::new("https://slack.com/api/conversations.history", HeaderMap::new())
            .param("channel", "C123")
            .param("limit", "15")
            .opt_param("cursor", None::<String>);

        assert_eq!(request.params.len(), 2);
        assert_eq!(request.params[1], ("limit".to_string(), "15".to_string()));
    }

    #[test]
    fn test_opt_param_present() {
        let request = ApiRequest::new("https://slack.com/api/conversations.history", HeaderMap::new())
            .opt_param("cursor", Some("abc"));
        assert_eq!(request.params[0], ("cursor".to_string(), "abc".to_string()));
    }
}
