//! Common types for the Slack API surface the exporter consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod channel;
pub mod message;
pub mod user;

pub use channel::*;
pub use message::*;
pub use user::*;

/// Slack timestamp (ts) - unique identifier for messages
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl Timestamp {
    /// Create a new timestamp
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    /// Get the timestamp as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the timestamp's whole-second part to a UTC datetime
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs_str = self.0.split('.').next()?;
        let secs = secs_str.parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Calendar day (UTC) this timestamp falls on, as `YYYY-MM-DD`
    pub fn day(&self) -> Option<String> {
        self.to_datetime().map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

impl From<String> for Timestamp {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slack channel ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Create a new channel ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slack user ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque pagination cursor returned by listing calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl Cursor {
    /// Create a new cursor
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }

    /// Get the cursor as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response metadata carrying the continuation cursor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Next page cursor; empty string means exhausted
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl ResponseMetadata {
    /// The continuation cursor, with Slack's empty-string sentinel mapped to `None`
    pub fn cursor(&self) -> Option<Cursor> {
        self.next_cursor
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(Cursor::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_day() {
        let ts = Timestamp::new("1700000000.000100");
        assert_eq!(ts.day().unwrap(), "2023-11-14");
    }

    #[test]
    fn test_timestamp_ordering_matches_server_order() {
        let a = Timestamp::new("1700000000.000100");
        let b = Timestamp::new("1700000001.000000");
        assert!(a < b);
    }

    #[test]
    fn test_response_metadata_empty_cursor_is_exhausted() {
        let meta = ResponseMetadata {
            next_cursor: Some(String::new()),
        };
        assert!(meta.cursor().is_none());

        let meta = ResponseMetadata {
            next_cursor: Some("dXNlcjpVMDYxTkZUVDI=".to_string()),
        };
        assert_eq!(meta.cursor().unwrap().as_str(), "dXNlcjpVMDYxTkZUVDI=");
    }
}
