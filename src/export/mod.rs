//! Export orchestration.
//!
//! Drives a full workspace export: user directory, conversation list, then
//! per-conversation history, threads, and file attachments, checkpointing
//! progress after every durable page so an interrupted run resumes without
//! refetching acknowledged work.

mod writer;

pub use writer::ExportWriter;

use crate::client::ExportClient;
use crate::errors::ExportResult;
use crate::pagination::{ConversationCursor, Paginator};
use crate::progress::{ProgressRecord, ProgressStore};
use crate::resilience::ApiCategory;
use crate::types::{Channel, FileObject, User, UserId};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Outcome counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Conversations fully exported during this run
    pub completed: usize,
    /// Conversations abandoned after non-fatal errors
    pub failed: usize,
    /// Conversations skipped because an earlier run finished them
    pub skipped: usize,
    /// Files written to disk
    pub files_downloaded: usize,
    /// Files skipped (tombstones, missing URLs, permanent errors)
    pub files_skipped: usize,
}

/// Orchestrates a complete, resumable workspace export.
pub struct Exporter {
    client: ExportClient,
    store: ProgressStore,
}

impl Exporter {
    /// Create an exporter over a configured client
    pub fn new(client: ExportClient) -> Self {
        let store = ProgressStore::new(client.config().output_path.clone());
        Self { client, store }
    }

    /// Run the export.
    ///
    /// With `resume` set, the latest checkpoint in the output directory is
    /// picked up and its completed conversations are skipped; previously
    /// failed conversations are retried. Without it a fresh run starts
    /// under a new timestamped directory.
    #[instrument(skip(self))]
    pub async fn run(&self, resume: bool) -> ExportResult<ExportSummary> {
        let mut record = self.open_record(resume)?;
        info!(run_id = %record.run_id, resume, "Starting export");

        let writer = ExportWriter::new(
            self.client.config().output_path.join(&record.run_id),
            self.client.config().split_by_day,
        );

        let users = self.fetch_users(&mut record, &writer).await?;
        let channels = self.fetch_channels(&mut record, &writer).await?;

        let user_names: HashMap<UserId, String> = users
            .iter()
            .map(|u| (u.id.clone(), u.display_name().to_string()))
            .collect();

        // The in-progress conversation goes first: its stored cursor lives
        // in the single in-progress slot, which later checkpoints reuse.
        let in_progress_id = record.in_progress.as_ref().map(|c| c.conversation_id.clone());
        let mut ordered: Vec<&Channel> = Vec::with_capacity(channels.len());
        if let Some(id) = &in_progress_id {
            ordered.extend(channels.iter().filter(|c| &c.id == id));
        }
        ordered.extend(
            channels
                .iter()
                .filter(|c| Some(&c.id) != in_progress_id.as_ref()),
        );

        let mut summary = ExportSummary::default();
        for channel in ordered {
            if record.is_complete(&channel.id) {
                summary.skipped += 1;
                continue;
            }

            let name = channel.export_name(|id| user_names.get(id).cloned());
            match self
                .export_conversation(channel, &name, &mut record, &writer)
                .await
            {
                Ok((downloaded, skipped)) => {
                    record.mark_complete(channel.id.clone());
                    self.store.checkpoint(&record)?;
                    summary.completed += 1;
                    summary.files_downloaded += downloaded;
                    summary.files_skipped += skipped;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(channel = %channel.id, %err, "Conversation abandoned");
                    record.mark_failed(channel.id.clone());
                    self.store.checkpoint(&record)?;
                    summary.failed += 1;
                }
            }
        }

        if record.failed_conversation_ids.is_empty() {
            self.store.remove(&record.run_id)?;
        }

        info!(
            run_id = %record.run_id,
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            files_downloaded = summary.files_downloaded,
            files_skipped = summary.files_skipped,
            "Export finished"
        );
        Ok(summary)
    }

    fn open_record(&self, resume: bool) -> ExportResult<ProgressRecord> {
        if resume {
            if let Some(record) = self.store.load_latest()? {
                return Ok(record);
            }
        }
        let run_id = Utc::now().format("%Y-%m-%d_%H%M%S").to_string();
        Ok(ProgressRecord::new(run_id))
    }

    async fn fetch_users(
        &self,
        record: &mut ProgressRecord,
        writer: &ExportWriter,
    ) -> ExportResult<Vec<User>> {
        let path = writer.root().join("users.json");
        if record.users_fetched {
            if let Some(users) = read_json_if_present::<Vec<User>>(&path)? {
                info!(count = users.len(), "Reusing user directory from checkpointed run");
                return Ok(users);
            }
        }

        let users = self.client.users().list_all().await?;
        writer.save_users(&users)?;
        record.users_fetched = true;
        self.store.checkpoint(record)?;
        Ok(users)
    }

    async fn fetch_channels(
        &self,
        record: &mut ProgressRecord,
        writer: &ExportWriter,
    ) -> ExportResult<Vec<Channel>> {
        let path = writer.root().join("channels.json");
        if record.channels_fetched {
            if let Some(channels) = read_json_if_present::<Vec<Channel>>(&path)? {
                info!(
                    count = channels.len(),
                    "Reusing conversation list from checkpointed run"
                );
                return Ok(channels);
            }
        }

        let channels = self.client.conversations().list_all().await?;
        writer.save_channels(&channels)?;
        record.channels_fetched = true;
        self.store.checkpoint(record)?;
        Ok(channels)
    }

    /// Export one conversation's messages, threads, and files.
    ///
    /// Returns `(files_downloaded, files_skipped)` on success. Each page is
    /// written before its cursor is checkpointed, so resume replays at most
    /// one already-written page and the writer's merge absorbs it. The
    /// attachment list comes from the merged on-disk messages, so pages
    /// acknowledged by an interrupted run still get their files.
    #[instrument(skip_all, fields(channel = %channel.id, name = %name))]
    async fn export_conversation(
        &self,
        channel: &Channel,
        name: &str,
        record: &mut ProgressRecord,
        writer: &ExportWriter,
    ) -> ExportResult<(usize, usize)> {
        let cursor = match record.in_progress.take() {
            Some(cursor) if cursor.conversation_id == channel.id => {
                info!(channel = %channel.id, "Resuming conversation mid-pagination");
                cursor
            }
            other => {
                record.in_progress = other;
                ConversationCursor::new(channel.id.clone())
            }
        };

        let limit = self
            .client
            .resilience()
            .page_limit(ApiCategory::ConversationHistory);
        let mut paginator = Paginator::new(self.client.conversations().clone(), cursor, limit);

        while let Some(batch) = paginator.next_page().await? {
            writer.append_messages(name, &batch.messages)?;

            record.in_progress = Some(paginator.cursor().clone());
            self.store.checkpoint(record)?;
        }

        let files: Vec<FileObject> = writer
            .read_messages(name)?
            .iter()
            .flat_map(|m| m.files.iter().cloned())
            .collect();

        let (downloaded, skipped) = self
            .client
            .files()
            .fetch_all(&files, &writer.files_dir(name))
            .await?;

        Ok((downloaded, skipped))
    }
}

fn read_json_if_present<T: serde::de::DeserializeOwned>(path: &Path) -> ExportResult<Option<T>> {
    match fs::read(path) {
        Ok(body) => Ok(Some(serde_json::from_slice(&body)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter").finish()
    }
}
