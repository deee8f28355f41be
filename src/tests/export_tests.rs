//! End-to-end orchestration tests over the mock transport and a temp
//! output directory.

use crate::client::ExportClient;
use crate::config::ExportConfigBuilder;
use crate::errors::ExportError;
use crate::export::{ExportWriter, Exporter};
use crate::fixtures;
use crate::mocks::MockHttpTransport;
use crate::pagination::ConversationCursor;
use crate::progress::{ProgressRecord, ProgressStore};
use crate::types::{ChannelId, Cursor, Message};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn client_with(transport: Arc<MockHttpTransport>, output: &Path) -> ExportClient {
    let config = ExportConfigBuilder::new()
        .user_token("xoxp-test")
        .unwrap()
        .output_path(output)
        .build_unchecked();
    ExportClient::with_transport(config, transport)
}

fn run_dir(output: &Path) -> std::path::PathBuf {
    std::fs::read_dir(output)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.is_dir())
        .unwrap()
}

fn read_messages(path: &Path) -> Vec<Message> {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

fn ts(n: u64) -> String {
    format!("{}.000000", 1_700_000_000 + n)
}

#[tokio::test(start_paused = true)]
async fn full_export_writes_users_channels_messages_and_files() {
    let output = TempDir::new().unwrap();
    let mock = Arc::new(MockHttpTransport::new());

    mock.push_response(fixtures::users_response(
        vec![fixtures::user("U001", "Jordan Doe")],
        None,
    ));
    mock.push_response(fixtures::conversations_response(
        vec![fixtures::channel("C001", "general"), fixtures::im("D001", "U001")],
        None,
    ));
    // general: one page with a file attachment
    mock.push_response(fixtures::history_response(
        vec![
            fixtures::message(&ts(0), "hello"),
            fixtures::message_with_file(
                &ts(1),
                "F001",
                "notes.txt",
                "https://files.slack.com/files-pri/T1-F001/notes.txt",
            ),
        ],
        None,
    ));
    // DM with Jordan: one plain page
    mock.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(2), "dm hello")],
        None,
    ));
    mock.push_download(&b"file body"[..]);

    let client = client_with(mock.clone(), output.path());
    let summary = Exporter::new(client).run(false).await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.files_downloaded, 1);

    let run = run_dir(output.path());
    assert!(run.join("users.json").exists());
    assert!(run.join("channels.json").exists());

    let day = run.join("general/2023-11-14.json");
    assert_eq!(read_messages(&day).len(), 2);

    // DM directory named after the counterpart's real name
    assert!(run.join("@Jordan Doe/2023-11-14.json").exists());

    let file = run.join("general/files/F001_notes.txt");
    assert_eq!(std::fs::read(&file).unwrap(), b"file body");

    // Clean finish leaves no progress file behind.
    let progress: Vec<_> = std::fs::read_dir(output.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .collect();
    assert!(progress.is_empty());
    assert!(mock.is_drained());
}

#[tokio::test(start_paused = true)]
async fn inaccessible_conversation_is_skipped_not_fatal() {
    let output = TempDir::new().unwrap();
    let mock = Arc::new(MockHttpTransport::new());

    mock.push_response(fixtures::users_response(vec![], None));
    mock.push_response(fixtures::conversations_response(
        vec![
            fixtures::channel("C001", "locked"),
            fixtures::channel("C002", "open"),
        ],
        None,
    ));
    mock.push_response(fixtures::error_response("channel_not_found"));
    mock.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(0), "still here")],
        None,
    ));

    let client = client_with(mock.clone(), output.path());
    let summary = Exporter::new(client).run(false).await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 1);

    let run = run_dir(output.path());
    assert!(run.join("open/2023-11-14.json").exists());
    assert!(!run.join("locked").exists());

    // A failed conversation keeps the checkpoint for a later --resume.
    let progress: Vec<_> = std::fs::read_dir(output.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .collect();
    assert_eq!(progress.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn auth_failure_aborts_the_run() {
    let output = TempDir::new().unwrap();
    let mock = Arc::new(MockHttpTransport::new());
    mock.push_response(fixtures::error_response("token_revoked"));

    let client = client_with(mock.clone(), output.path());
    let result = Exporter::new(client).run(false).await;

    assert!(matches!(result, Err(ExportError::Authentication(_))));
}

#[tokio::test(start_paused = true)]
async fn permanent_file_error_does_not_abort_the_conversation() {
    let output = TempDir::new().unwrap();
    let mock = Arc::new(MockHttpTransport::new());

    mock.push_response(fixtures::users_response(vec![], None));
    mock.push_response(fixtures::conversations_response(
        vec![fixtures::channel("C001", "general")],
        None,
    ));
    mock.push_response(fixtures::history_response(
        vec![
            fixtures::message_with_file(
                &ts(0),
                "F001",
                "gone.txt",
                "https://files.slack.com/files-pri/T1-F001/gone.txt",
            ),
            fixtures::message_with_file(
                &ts(1),
                "F002",
                "here.txt",
                "https://files.slack.com/files-pri/T1-F002/here.txt",
            ),
        ],
        None,
    ));
    mock.push_download_error(ExportError::PermanentClient {
        status: 404,
        message: "not found".to_string(),
    });
    mock.push_download(&b"second file"[..]);

    let client = client_with(mock.clone(), output.path());
    let summary = Exporter::new(client).run(false).await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.files_downloaded, 1);
    assert_eq!(summary.files_skipped, 1);

    let run = run_dir(output.path());
    assert!(run.join("general/files/F002_here.txt").exists());
    assert!(!run.join("general/files/F001_gone.txt").exists());
}

#[tokio::test(start_paused = true)]
async fn resume_skips_completed_conversations() {
    let output = TempDir::new().unwrap();

    // First run: channel B fails, channel A completes.
    let mock = Arc::new(MockHttpTransport::new());
    mock.push_response(fixtures::users_response(
        vec![fixtures::user("U001", "Jordan Doe")],
        None,
    ));
    mock.push_response(fixtures::conversations_response(
        vec![
            fixtures::channel("C001", "alpha"),
            fixtures::channel("C002", "beta"),
        ],
        None,
    ));
    mock.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(0), "alpha message")],
        None,
    ));
    mock.push_response(fixtures::error_response("channel_not_found"));

    let client = client_with(mock.clone(), output.path());
    let summary = Exporter::new(client).run(false).await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 1);

    // Resume: only beta is refetched; alpha is skipped without any call.
    let mock2 = Arc::new(MockHttpTransport::new());
    mock2.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(1), "beta message")],
        None,
    ));

    let client2 = client_with(mock2.clone(), output.path());
    let summary2 = Exporter::new(client2).run(true).await.unwrap();

    assert_eq!(summary2.skipped, 1);
    assert_eq!(summary2.completed, 1);
    assert_eq!(summary2.failed, 0);

    let history_calls = mock2.calls_to("conversations.history");
    assert_eq!(history_calls.len(), 1);
    assert_eq!(history_calls[0].param("channel"), Some("C002"));
    assert!(mock2.calls_to("users.list").is_empty());
    assert!(mock2.calls_to("conversations.list").is_empty());

    let run = run_dir(output.path());
    assert!(run.join("beta/2023-11-14.json").exists());
}

/// Lay down the on-disk state a run leaves behind when it dies
/// mid-conversation: directory listings, already-written pages, and a
/// checkpoint pointing at the interrupted cursor.
fn seed_interrupted_run(
    output: &Path,
    run_id: &str,
    channels: Vec<serde_json::Value>,
    written: &[(&str, Message)],
    record: &ProgressRecord,
) {
    let writer = ExportWriter::new(output.join(run_id), true);
    writer.save_users::<serde_json::Value>(&[]).unwrap();
    writer.save_channels(&channels).unwrap();
    for (name, message) in written {
        writer.append_messages(name, &[message.clone()]).unwrap();
    }
    ProgressStore::new(output).checkpoint(record).unwrap();
}

#[tokio::test(start_paused = true)]
async fn resume_downloads_attachments_from_pages_written_before_the_crash() {
    let output = TempDir::new().unwrap();
    let run_id = "2024-01-15_120000";

    // The interrupted run already wrote a page whose message carries a
    // file, then checkpointed the cursor before fetching any attachments.
    let written: Message = serde_json::from_value(fixtures::message_with_file(
        &ts(0),
        "F001",
        "notes.txt",
        "https://files.slack.com/files-pri/T1-F001/notes.txt",
    ))
    .unwrap();
    let mut record = ProgressRecord::new(run_id);
    record.users_fetched = true;
    record.channels_fetched = true;
    let mut cursor = ConversationCursor::new("C001");
    cursor.next_cursor = Some(Cursor::from("c1"));
    record.in_progress = Some(cursor);
    seed_interrupted_run(
        output.path(),
        run_id,
        vec![fixtures::channel("C001", "general")],
        &[("general", written)],
        &record,
    );

    // The resumed run fetches only the remaining page, which has no files.
    let mock = Arc::new(MockHttpTransport::new());
    mock.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(1), "last page")],
        None,
    ));
    mock.push_download(&b"notes body"[..]);

    let client = client_with(mock.clone(), output.path());
    let summary = Exporter::new(client).run(true).await.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.files_downloaded, 1);

    let history_calls = mock.calls_to("conversations.history");
    assert_eq!(history_calls.len(), 1);
    assert_eq!(history_calls[0].param("cursor"), Some("c1"));

    // The attachment named only in the pre-crash page still lands on disk.
    let file = output.path().join(run_id).join("general/files/F001_notes.txt");
    assert_eq!(std::fs::read(&file).unwrap(), b"notes body");
    assert!(mock.is_drained());
}

#[tokio::test(start_paused = true)]
async fn in_progress_cursor_survives_retrying_an_earlier_failed_conversation() {
    let output = TempDir::new().unwrap();
    let run_id = "2024-01-15_120000";

    // The interrupted run gave up on alpha, then died while paging beta.
    let mut record = ProgressRecord::new(run_id);
    record.users_fetched = true;
    record.channels_fetched = true;
    record.mark_failed(ChannelId::from("C001"));
    let mut cursor = ConversationCursor::new("C002");
    cursor.next_cursor = Some(Cursor::from("c1"));
    record.in_progress = Some(cursor);
    seed_interrupted_run(
        output.path(),
        run_id,
        vec![
            fixtures::channel("C001", "alpha"),
            fixtures::channel("C002", "beta"),
        ],
        &[],
        &record,
    );

    let mock = Arc::new(MockHttpTransport::new());
    // beta resumes first, from its stored cursor; alpha restarts after.
    mock.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(0), "beta tail")],
        None,
    ));
    mock.push_response(fixtures::history_response(
        vec![fixtures::message(&ts(1), "alpha retry")],
        None,
    ));

    let client = client_with(mock.clone(), output.path());
    let summary = Exporter::new(client).run(true).await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);

    let history_calls = mock.calls_to("conversations.history");
    assert_eq!(history_calls.len(), 2);
    assert_eq!(history_calls[0].param("channel"), Some("C002"));
    assert_eq!(history_calls[0].param("cursor"), Some("c1"));
    assert_eq!(history_calls[1].param("channel"), Some("C001"));
    assert_eq!(history_calls[1].param("cursor"), None);
    assert!(mock.is_drained());
}
