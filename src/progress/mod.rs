//! Durable run progress for crash-safe resume.
//!
//! Progress is checkpointed to `progress_<run_id>.json` in the output
//! directory after every acknowledged page. Writes go through a temp file
//! and an atomic rename so a crash mid-write leaves the previous
//! checkpoint intact.

use crate::errors::{ExportError, ExportResult, ResponseError};
use crate::pagination::ConversationCursor;
use crate::types::ChannelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Serialized state of one export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Run identifier, also the output subdirectory name
    pub run_id: String,
    /// Whether the user directory has been fetched and written
    #[serde(default)]
    pub users_fetched: bool,
    /// Whether the conversation list has been fetched and written
    #[serde(default)]
    pub channels_fetched: bool,
    /// Conversations fully exported, including their files
    #[serde(default)]
    pub completed_conversation_ids: BTreeSet<ChannelId>,
    /// Conversations abandoned after non-fatal errors; retried on resume
    #[serde(default)]
    pub failed_conversation_ids: BTreeSet<ChannelId>,
    /// Pagination position within the conversation currently being exported
    #[serde(default)]
    pub in_progress: Option<ConversationCursor>,
}

impl ProgressRecord {
    /// Fresh record for a new run
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            users_fetched: false,
            channels_fetched: false,
            completed_conversation_ids: BTreeSet::new(),
            failed_conversation_ids: BTreeSet::new(),
            in_progress: None,
        }
    }

    /// Whether the given conversation was already fully exported
    pub fn is_complete(&self, id: &ChannelId) -> bool {
        self.completed_conversation_ids.contains(id)
    }

    /// Mark a conversation fully exported
    pub fn mark_complete(&mut self, id: ChannelId) {
        self.failed_conversation_ids.remove(&id);
        self.completed_conversation_ids.insert(id);
        self.in_progress = None;
    }

    /// Mark a conversation abandoned for this run
    pub fn mark_failed(&mut self, id: ChannelId) {
        self.failed_conversation_ids.insert(id);
        self.in_progress = None;
    }
}

/// Reads and writes progress checkpoints in the output directory.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    /// Create a store rooted at the given output directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("progress_{run_id}.json"))
    }

    /// Persist a checkpoint atomically.
    #[instrument(skip(self, record), fields(run_id = %record.run_id))]
    pub fn checkpoint(&self, record: &ProgressRecord) -> ExportResult<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&record.run_id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(record)?;

        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), "Progress checkpointed");
        Ok(())
    }

    /// Load the checkpoint for a specific run
    pub fn load(&self, run_id: &str) -> ExportResult<ProgressRecord> {
        let path = self.path_for(run_id);
        let body = fs::read(&path)?;
        let record: ProgressRecord = serde_json::from_slice(&body)?;

        if record.run_id != run_id {
            return Err(ExportError::Response(ResponseError::UnexpectedResponse {
                message: format!(
                    "progress file {} names run {}",
                    path.display(),
                    record.run_id
                ),
            }));
        }
        Ok(record)
    }

    /// Load the most recent checkpoint, if any run has one.
    ///
    /// Run IDs are sortable timestamps, so the lexicographically greatest
    /// file name is the latest run. Unreadable files are skipped.
    #[instrument(skip(self))]
    pub fn load_latest(&self) -> ExportResult<Option<ProgressRecord>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut latest: Option<PathBuf> = None;
        for entry in entries {
            let path = entry?.path();
            if is_progress_file(&path) && latest.as_ref().map_or(true, |l| path > **l) {
                latest = Some(path);
            }
        }

        let Some(path) = latest else {
            return Ok(None);
        };

        let body = fs::read(&path)?;
        match serde_json::from_slice(&body) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(path = %path.display(), %err, "Skipping unreadable progress file");
                Ok(None)
            }
        }
    }

    /// Remove the checkpoint for a finished run
    pub fn remove(&self, run_id: &str) -> ExportResult<()> {
        let path = self.path_for(run_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_progress_file(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "json")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("progress_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_record(run_id: &str) -> ProgressRecord {
        let mut record = ProgressRecord::new(run_id);
        record.users_fetched = true;
        record.channels_fetched = true;
        record.mark_complete(ChannelId::from("C001"));
        record.mark_failed(ChannelId::from("C002"));
        record.in_progress = Some(ConversationCursor::new("C003"));
        record
    }

    #[test]
    fn checkpoint_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path());
        let record = sample_record("2024-01-15_120000");

        store.checkpoint(&record).unwrap();
        let loaded = store.load("2024-01-15_120000").unwrap();
        assert_eq!(record, loaded);
    }

    #[test]
    fn checkpoint_overwrites_previous() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path());

        let mut record = sample_record("run");
        store.checkpoint(&record).unwrap();

        record.mark_complete(ChannelId::from("C003"));
        store.checkpoint(&record).unwrap();

        let loaded = store.load("run").unwrap();
        assert!(loaded.is_complete(&ChannelId::from("C003")));
        assert!(loaded.in_progress.is_none());
    }

    #[test]
    fn load_latest_picks_newest_run() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path());

        store
            .checkpoint(&sample_record("2024-01-14_090000"))
            .unwrap();
        store
            .checkpoint(&sample_record("2024-01-15_120000"))
            .unwrap();

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.run_id, "2024-01-15_120000");
    }

    #[test]
    fn load_latest_on_missing_dir_is_none() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("nope"));
        assert!(store.load_latest().unwrap().is_none());
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path());
        store.checkpoint(&sample_record("run")).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn mark_complete_clears_failed_state() {
        let mut record = ProgressRecord::new("run");
        record.mark_failed(ChannelId::from("C001"));
        record.mark_complete(ChannelId::from("C001"));
        assert!(record.is_complete(&ChannelId::from("C001")));
        assert!(record.failed_conversation_ids.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path());
        store.checkpoint(&sample_record("run")).unwrap();
        store.remove("run").unwrap();
        store.remove("run").unwrap();
        assert!(store.load("run").is_err());
    }
}
