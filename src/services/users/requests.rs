//! Request types for the users service.

use crate::types::Cursor;

/// Request for `users.list`
#[derive(Debug, Clone, Default)]
pub struct ListUsersRequest {
    /// Pagination cursor
    pub cursor: Option<Cursor>,
    /// Page size
    pub limit: Option<u32>,
}

impl ListUsersRequest {
    /// Create a new request
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pagination cursor
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Set the page size
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
