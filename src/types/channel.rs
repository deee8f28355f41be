//! Conversation (channel/DM/group) types.

use super::{ChannelId, UserId};
use serde::{Deserialize, Serialize};

/// A Slack conversation: public channel, private channel, DM, or group DM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Channel ID
    pub id: ChannelId,
    /// Channel name; absent for DMs
    #[serde(default)]
    pub name: Option<String>,
    /// Whether this is a direct message
    #[serde(default)]
    pub is_im: bool,
    /// Whether this is a group direct message
    #[serde(default)]
    pub is_mpim: bool,
    /// Whether this is a private channel
    #[serde(default)]
    pub is_private: bool,
    /// Counterpart user for DMs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    /// Everything else, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Channel {
    /// Directory/display name for the export layout.
    ///
    /// DMs have no `name`, so the counterpart's real name is substituted with
    /// an `@` prefix; unnamed group DMs get an `mpdm-` prefix. Both keep a
    /// flat viewer namespace free of collisions with public channel names.
    pub fn export_name(&self, resolve_user: impl Fn(&UserId) -> Option<String>) -> String {
        if self.is_im {
            let counterpart = self
                .user
                .as_ref()
                .and_then(|u| resolve_user(u))
                .unwrap_or_else(|| {
                    self.user
                        .as_ref()
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| self.id.to_string())
                });
            format!("@{}", counterpart)
        } else if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            name.to_string()
        } else if self.is_mpim {
            format!("mpdm-{}", self.id)
        } else {
            self.id.to_string()
        }
    }
}
