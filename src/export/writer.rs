//! Export output layout and durable message writes.
//!
//! Layout under `<output>/<run_id>/`:
//!
//! ```text
//! users.json
//! channels.json
//! <channel name>/
//!     2024-01-15.json        (split by day, UTC)
//!     messages.json          (when day splitting is off)
//!     files/
//!         F0XXXX_name.ext
//! ```
//!
//! Message writes are idempotent merges keyed by `ts`, so replaying a page
//! after a crash-and-resume never duplicates messages.

use crate::errors::ExportResult;
use crate::types::Message;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const UNDATED_BUCKET: &str = "undated";

/// Writes export artifacts under a run's output directory.
#[derive(Debug, Clone)]
pub struct ExportWriter {
    root: PathBuf,
    split_by_day: bool,
}

impl ExportWriter {
    /// Create a writer rooted at `<output>/<run_id>`
    pub fn new(root: impl Into<PathBuf>, split_by_day: bool) -> Self {
        Self {
            root: root.into(),
            split_by_day,
        }
    }

    /// Root directory of this run's output
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the user directory as pretty JSON
    #[instrument(skip(self, users))]
    pub fn save_users<T: serde::Serialize>(&self, users: &[T]) -> ExportResult<()> {
        self.write_json(&self.root.join("users.json"), users)
    }

    /// Write the conversation list as pretty JSON
    #[instrument(skip(self, channels))]
    pub fn save_channels<T: serde::Serialize>(&self, channels: &[T]) -> ExportResult<()> {
        self.write_json(&self.root.join("channels.json"), channels)
    }

    /// Directory holding one conversation's messages
    pub fn channel_dir(&self, channel_name: &str) -> PathBuf {
        self.root.join(sanitize_component(channel_name))
    }

    /// Directory holding one conversation's downloaded files
    pub fn files_dir(&self, channel_name: &str) -> PathBuf {
        self.channel_dir(channel_name).join("files")
    }

    /// Merge a page of messages into the conversation's output files.
    ///
    /// Messages land in per-day files (UTC) or a single `messages.json`.
    /// Existing messages with the same `ts` are replaced, the merged set is
    /// sorted by `ts`, and each file is rewritten atomically.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub fn append_messages(&self, channel_name: &str, messages: &[Message]) -> ExportResult<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let dir = self.channel_dir(channel_name);
        fs::create_dir_all(&dir)?;

        let mut buckets: BTreeMap<String, Vec<&Message>> = BTreeMap::new();
        for message in messages {
            let bucket = if self.split_by_day {
                message
                    .ts
                    .day()
                    .unwrap_or_else(|| UNDATED_BUCKET.to_string())
            } else {
                "messages".to_string()
            };
            buckets.entry(bucket).or_default().push(message);
        }

        for (bucket, page_messages) in buckets {
            let path = dir.join(format!("{bucket}.json"));
            let mut merged: BTreeMap<_, Message> = self
                .read_existing(&path)?
                .into_iter()
                .map(|m| (m.ts.clone(), m))
                .collect();
            for message in page_messages {
                merged.insert(message.ts.clone(), message.clone());
            }

            let sorted: Vec<&Message> = merged.values().collect();
            self.write_json(&path, &sorted)?;
            debug!(path = %path.display(), total = sorted.len(), "Messages written");
        }

        Ok(())
    }

    /// All messages currently written for a conversation, merged across its
    /// message files and sorted by `ts`.
    ///
    /// Covers pages written by an earlier interrupted run as well as the
    /// current one; an absent conversation directory yields an empty list.
    pub fn read_messages(&self, channel_name: &str) -> ExportResult<Vec<Message>> {
        let dir = self.channel_dir(channel_name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut messages = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |e| e == "json") {
                messages.extend(self.read_existing(&path)?);
            }
        }
        messages.sort_by(|a, b| a.ts.cmp(&b.ts));
        Ok(messages)
    }

    fn read_existing(&self, path: &Path) -> ExportResult<Vec<Message>> {
        match fs::read(path) {
            Ok(body) => Ok(serde_json::from_slice(&body)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, path: &Path, value: &T) -> ExportResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Replace characters that would break the directory layout. Channel
/// export names may carry user-supplied text (DM display names).
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}
