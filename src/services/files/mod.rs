//! File fetcher: downloads message attachments to disk.

use crate::auth::AuthManager;
use crate::errors::{ExportError, ExportResult};
use crate::resilience::{ApiCategory, Resilience};
use crate::transport::HttpTransport;
use crate::types::FileObject;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Downloads file attachments referenced by exported messages.
///
/// Downloads flow through the same rate governor and retry engine as API
/// calls, under the general category.
#[derive(Clone)]
pub struct FileFetcher {
    transport: Arc<dyn HttpTransport>,
    auth: AuthManager,
    resilience: Arc<Resilience>,
}

impl FileFetcher {
    /// Create a new file fetcher
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: AuthManager,
        resilience: Arc<Resilience>,
    ) -> Self {
        Self {
            transport,
            auth,
            resilience,
        }
    }

    /// Download a single file into `dest_dir`.
    ///
    /// Returns `Ok(None)` for tombstoned files and files without a private
    /// URL. Returns the written path on success. Permanent client errors
    /// propagate so the caller can log and skip the file without failing
    /// the conversation.
    #[instrument(skip(self, file), fields(file_id = %file.id))]
    pub async fn fetch(&self, file: &FileObject, dest_dir: &Path) -> ExportResult<Option<PathBuf>> {
        if file.is_tombstone() {
            debug!(file_id = %file.id, "Skipping tombstoned file");
            return Ok(None);
        }
        let url = match &file.url_private {
            Some(url) => url.clone(),
            None => {
                debug!(file_id = %file.id, "File has no private URL, skipping");
                return Ok(None);
            }
        };

        let headers = self.auth.headers()?;
        let transport = self.transport.clone();

        let bytes = self
            .resilience
            .execute(ApiCategory::General, || {
                let url = url.clone();
                let headers = headers.clone();
                let transport = transport.clone();
                async move { transport.download(&url, headers).await }
            })
            .await?;

        let path = dest_dir.join(sanitize_file_name(&file.output_name()));
        std::fs::create_dir_all(dest_dir).map_err(ExportError::Io)?;
        std::fs::write(&path, &bytes).map_err(ExportError::Io)?;

        debug!(path = %path.display(), size = bytes.len(), "File downloaded");
        Ok(Some(path))
    }

    /// Download every file attached to the given messages into `dest_dir`.
    ///
    /// Permanent per-file failures are logged and skipped; retryable
    /// exhaustion and fatal errors propagate. Returns the count of files
    /// written and the count skipped.
    #[instrument(skip(self, files))]
    pub async fn fetch_all(
        &self,
        files: &[FileObject],
        dest_dir: &Path,
    ) -> ExportResult<(usize, usize)> {
        let mut downloaded = 0;
        let mut skipped = 0;

        for file in files {
            match self.fetch(file, dest_dir).await {
                Ok(Some(_)) => downloaded += 1,
                Ok(None) => skipped += 1,
                Err(ExportError::PermanentClient { status, .. }) => {
                    warn!(file_id = %file.id, status, "File inaccessible, skipping");
                    skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        Ok((downloaded, skipped))
    }
}

/// Replace path separators and parent references so a server-supplied file
/// name cannot escape the destination directory.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}

impl std::fmt::Debug for FileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileFetcher").finish()
    }
}
