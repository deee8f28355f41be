//! Response types for the conversations service.

use crate::types::{Channel, Cursor, Message, ResponseMetadata};
use serde::Deserialize;

/// Response from `conversations.list`
#[derive(Debug, Clone, Deserialize)]
pub struct ListConversationsResponse {
    /// Success indicator
    pub ok: bool,
    /// Conversations on this page
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Response metadata for pagination
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl ListConversationsResponse {
    /// The continuation cursor, if any pages remain
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.response_metadata.as_ref().and_then(|m| m.cursor())
    }
}

/// Response from `conversations.history`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    /// Success indicator
    pub ok: bool,
    /// Messages on this page, newest first (server order)
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Whether more pages remain
    #[serde(default)]
    pub has_more: bool,
    /// Response metadata for pagination
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl HistoryResponse {
    /// The continuation cursor, if any pages remain
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.response_metadata.as_ref().and_then(|m| m.cursor())
    }
}

/// Response from `conversations.replies`
#[derive(Debug, Clone, Deserialize)]
pub struct RepliesResponse {
    /// Success indicator
    pub ok: bool,
    /// Thread messages on this page; includes the parent, which callers
    /// filter back out
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Whether more pages remain
    #[serde(default)]
    pub has_more: bool,
    /// Response metadata for pagination
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl RepliesResponse {
    /// The continuation cursor, if any pages remain
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.response_metadata.as_ref().and_then(|m| m.cursor())
    }
}
