//! Message-related types.
//!
//! Only the fields the export pipeline inspects are typed; everything else is
//! kept in `extra` so the written JSON preserves whatever the server sent.

use super::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Slack message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message timestamp (unique ID within a conversation)
    pub ts: Timestamp,
    /// Message type
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    /// Message text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// User who sent the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    /// Thread timestamp (parent ts if in a thread)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<Timestamp>,
    /// Reply count (present on thread parents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<i32>,
    /// Files attached to the message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileObject>,
    /// Everything else, preserved verbatim for the output contract
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Check if this message is a thread parent with replies
    pub fn is_thread_parent(&self) -> bool {
        self.thread_ts.as_ref() == Some(&self.ts)
    }

    /// Check if this message is a thread reply
    pub fn is_thread_reply(&self) -> bool {
        self.thread_ts.is_some() && self.thread_ts.as_ref() != Some(&self.ts)
    }
}

/// File attachment reference within a message.
///
/// Created when a message is parsed, consumed exactly once by the file
/// fetcher; the downloaded bytes are the durable artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    /// File ID, unique workspace-wide
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Authenticated download URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_private: Option<String>,
    /// File mode; `tombstone` marks a deleted file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Everything else, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileObject {
    /// Check if this file was deleted and left a tombstone
    pub fn is_tombstone(&self) -> bool {
        self.mode.as_deref() == Some("tombstone")
    }

    /// Output file name, ID-prefixed to avoid collisions between files with
    /// the same display name
    pub fn output_name(&self) -> String {
        format!("{}_{}", self.id, self.name.as_deref().unwrap_or("unnamed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_parent_detection() {
        let json = r#"{"ts":"1.000","thread_ts":"1.000","type":"message","reply_count":2}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.is_thread_parent());
        assert!(!msg.is_thread_reply());

        let json = r#"{"ts":"2.000","thread_ts":"1.000","type":"message"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(!msg.is_thread_parent());
        assert!(msg.is_thread_reply());
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let json = r#"{"ts":"1.000","type":"message","text":"hi","reactions":[{"name":"wave","count":1}]}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["reactions"][0]["name"], "wave");
        assert_eq!(back["text"], "hi");
    }

    #[test]
    fn test_file_output_name() {
        let file = FileObject {
            id: "F123".to_string(),
            name: Some("notes.txt".to_string()),
            url_private: None,
            mode: None,
            extra: Default::default(),
        };
        assert_eq!(file.output_name(), "F123_notes.txt");
    }

    #[test]
    fn test_tombstone() {
        let json = r#"{"id":"F1","mode":"tombstone"}"#;
        let file: FileObject = serde_json::from_str(json).unwrap();
        assert!(file.is_tombstone());
    }
}
