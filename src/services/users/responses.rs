//! Response types for the users service.

use crate::types::{Cursor, ResponseMetadata, User};
use serde::Deserialize;

/// Response from `users.list`
#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersResponse {
    /// Success indicator
    pub ok: bool,
    /// Workspace members
    #[serde(default)]
    pub members: Vec<User>,
    /// Response metadata for pagination
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl ListUsersResponse {
    /// The continuation cursor, if any pages remain
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.response_metadata.as_ref().and_then(|m| m.cursor())
    }
}
