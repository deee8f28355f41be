//! Request types for the conversations service.

use crate::types::{ChannelId, Cursor, Timestamp};

/// Conversation types requested from `conversations.list`; the export covers
/// the full workspace surface.
pub const ALL_CONVERSATION_TYPES: &str = "public_channel,private_channel,mpim,im";

/// Request for `conversations.list`
#[derive(Debug, Clone)]
pub struct ListConversationsRequest {
    /// Comma-separated conversation types
    pub types: String,
    /// Pagination cursor
    pub cursor: Option<Cursor>,
    /// Page size
    pub limit: u32,
}

impl ListConversationsRequest {
    /// Create a request covering all conversation types
    pub fn all_types(limit: u32) -> Self {
        Self {
            types: ALL_CONVERSATION_TYPES.to_string(),
            cursor: None,
            limit,
        }
    }

    /// Set the pagination cursor
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Request for `conversations.history`
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    /// Conversation ID
    pub channel: ChannelId,
    /// Pagination cursor
    pub cursor: Option<Cursor>,
    /// Page size cap for the active mode
    pub limit: u32,
}

impl HistoryRequest {
    /// Create a new request
    pub fn new(channel: impl Into<ChannelId>, limit: u32) -> Self {
        Self {
            channel: channel.into(),
            cursor: None,
            limit,
        }
    }

    /// Set the pagination cursor
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Request for `conversations.replies`
#[derive(Debug, Clone)]
pub struct RepliesRequest {
    /// Conversation ID
    pub channel: ChannelId,
    /// Thread parent timestamp
    pub ts: Timestamp,
    /// Pagination cursor
    pub cursor: Option<Cursor>,
    /// Page size cap for the active mode
    pub limit: u32,
}

impl RepliesRequest {
    /// Create a new request
    pub fn new(channel: impl Into<ChannelId>, ts: impl Into<Timestamp>, limit: u32) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
            cursor: None,
            limit,
        }
    }

    /// Set the pagination cursor
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}
