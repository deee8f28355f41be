//! User types.

use super::UserId;
use serde::{Deserialize, Serialize};

/// Workspace member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Username
    #[serde(default)]
    pub name: Option<String>,
    /// Full display name
    #[serde(default)]
    pub real_name: Option<String>,
    /// Whether the user is deleted
    #[serde(default)]
    pub deleted: bool,
    /// Everything else, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Best available human-readable name
    pub fn display_name(&self) -> &str {
        self.real_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref())
            .unwrap_or(self.id.as_str())
    }
}
