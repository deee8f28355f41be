//! Conversations service implementation.

use super::{
    HistoryRequest, HistoryResponse, ListConversationsRequest, ListConversationsResponse,
    RepliesRequest, RepliesResponse,
};
use crate::auth::AuthManager;
use crate::errors::ExportResult;
use crate::resilience::{ApiCategory, Resilience};
use crate::transport::{ApiRequest, HttpTransport};
use crate::types::Channel;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Conversations service
#[derive(Clone)]
pub struct ConversationsService {
    transport: Arc<dyn HttpTransport>,
    auth: AuthManager,
    base_url: String,
    resilience: Arc<Resilience>,
}

impl ConversationsService {
    /// Create a new conversations service
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: AuthManager,
        base_url: String,
        resilience: Arc<Resilience>,
    ) -> Self {
        Self {
            transport,
            auth,
            base_url,
            resilience,
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// Fetch one page of the conversation list
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        request: ListConversationsRequest,
    ) -> ExportResult<ListConversationsResponse> {
        let url = self.build_url("conversations.list");
        let headers = self.auth.headers()?;
        let transport = self.transport.clone();

        let value = self
            .resilience
            .execute(ApiCategory::General, || {
                let req = ApiRequest::new(url.clone(), headers.clone())
                    .param("types", request.types.clone())
                    .param("limit", request.limit.to_string())
                    .opt_param("cursor", request.cursor.as_ref().map(|c| c.to_string()));
                let transport = transport.clone();
                async move { transport.call_api(req).await }
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    /// Fetch every conversation visible to the token, following pagination
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> ExportResult<Vec<Channel>> {
        let limit = self.resilience.page_limit(ApiCategory::General);
        let mut channels = Vec::new();
        let mut cursor = None;

        loop {
            let mut request = ListConversationsRequest::all_types(limit);
            if let Some(c) = cursor {
                request = request.cursor(c);
            }

            let response = self.list(request).await?;
            channels.extend(response.channels.iter().cloned());

            match response.next_cursor() {
                Some(next) => {
                    debug!(cursor = %next, "Fetching next conversation page");
                    cursor = Some(next);
                }
                None => break,
            }
        }

        debug!(count = channels.len(), "Conversation list fetched");
        Ok(channels)
    }

    /// Fetch one page of a conversation's message history
    #[instrument(skip(self), fields(channel = %request.channel))]
    pub async fn history(&self, request: HistoryRequest) -> ExportResult<HistoryResponse> {
        let url = self.build_url("conversations.history");
        let headers = self.auth.headers()?;
        let transport = self.transport.clone();

        let value = self
            .resilience
            .execute(ApiCategory::ConversationHistory, || {
                let req = ApiRequest::new(url.clone(), headers.clone())
                    .param("channel", request.channel.to_string())
                    .param("limit", request.limit.to_string())
                    .opt_param("cursor", request.cursor.as_ref().map(|c| c.to_string()));
                let transport = transport.clone();
                async move { transport.call_api(req).await }
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    /// Fetch one page of a thread's replies
    #[instrument(skip(self), fields(channel = %request.channel, ts = %request.ts))]
    pub async fn replies(&self, request: RepliesRequest) -> ExportResult<RepliesResponse> {
        let url = self.build_url("conversations.replies");
        let headers = self.auth.headers()?;
        let transport = self.transport.clone();

        let value = self
            .resilience
            .execute(ApiCategory::ConversationHistory, || {
                let req = ApiRequest::new(url.clone(), headers.clone())
                    .param("channel", request.channel.to_string())
                    .param("ts", request.ts.to_string())
                    .param("limit", request.limit.to_string())
                    .opt_param("cursor", request.cursor.as_ref().map(|c| c.to_string()));
                let transport = transport.clone();
                async move { transport.call_api(req).await }
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }
}

impl std::fmt::Debug for ConversationsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationsService")
            .field("base_url", &self.base_url)
            .finish()
    }
}
