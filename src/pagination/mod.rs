//! Resumable cursor pagination over conversation history and threads.
//!
//! [`Paginator`] is an explicit state machine making exactly one API call
//! per [`Paginator::next_page`] invocation. Its full position, including
//! partially drained threads, lives in a serializable
//! [`ConversationCursor`], so an export interrupted mid-conversation can
//! be reconstructed from the last checkpoint without refetching
//! acknowledged pages.

use crate::errors::ExportResult;
use crate::services::ConversationsService;
use crate::services::conversations::{HistoryRequest, RepliesRequest};
use crate::types::{ChannelId, Cursor, Message, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Serializable pagination position within one conversation.
///
/// `thread_cursors` maps each thread parent timestamp awaiting replies to
/// its continuation cursor. `None` means the thread has not been started;
/// entries are removed once a thread is fully drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationCursor {
    /// Conversation being paged
    pub conversation_id: ChannelId,
    /// Continuation cursor for the next history page
    #[serde(default)]
    pub next_cursor: Option<Cursor>,
    /// Whether the top-level history has been fully paged
    #[serde(default)]
    pub history_done: bool,
    /// Threads with replies still to fetch, keyed by parent timestamp
    #[serde(default)]
    pub thread_cursors: BTreeMap<Timestamp, Option<Cursor>>,
}

impl ConversationCursor {
    /// Start-of-conversation cursor
    pub fn new(conversation_id: impl Into<ChannelId>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            next_cursor: None,
            history_done: false,
            thread_cursors: BTreeMap::new(),
        }
    }

    /// Whether every history page and every registered thread has been
    /// fetched
    pub fn is_exhausted(&self) -> bool {
        self.history_done && self.thread_cursors.is_empty()
    }
}

/// What a page batch was fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A top-level history page
    History,
    /// A replies page for the thread rooted at the given timestamp
    Thread(Timestamp),
}

/// One fetched page of messages
#[derive(Debug, Clone)]
pub struct PageBatch {
    /// Messages in this page, in server order
    pub messages: Vec<Message>,
    /// Source of the page
    pub kind: PageKind,
}

/// Drives pagination for one conversation.
pub struct Paginator {
    service: ConversationsService,
    cursor: ConversationCursor,
    limit: u32,
}

impl Paginator {
    /// Create a paginator resuming from the given cursor position
    pub fn new(service: ConversationsService, cursor: ConversationCursor, limit: u32) -> Self {
        Self {
            service,
            cursor,
            limit,
        }
    }

    /// The current pagination position, suitable for checkpointing.
    ///
    /// The returned cursor reflects every page already yielded by
    /// [`next_page`](Self::next_page); persisting it after the page's
    /// messages are durable makes the page acknowledged.
    pub fn cursor(&self) -> &ConversationCursor {
        &self.cursor
    }

    /// Fetch the next page, making exactly one API call.
    ///
    /// Pending thread pages are drained before the next history page is
    /// requested. Returns `None` once the conversation is exhausted.
    #[instrument(skip(self), fields(channel = %self.cursor.conversation_id))]
    pub async fn next_page(&mut self) -> ExportResult<Option<PageBatch>> {
        if let Some((ts, thread_cursor)) = self
            .cursor
            .thread_cursors
            .iter()
            .next()
            .map(|(ts, c)| (ts.clone(), c.clone()))
        {
            return self.thread_page(ts, thread_cursor).await.map(Some);
        }

        if !self.cursor.history_done {
            return self.history_page().await.map(Some);
        }

        Ok(None)
    }

    async fn history_page(&mut self) -> ExportResult<PageBatch> {
        let mut request = HistoryRequest::new(self.cursor.conversation_id.clone(), self.limit);
        if let Some(c) = self.cursor.next_cursor.clone() {
            request = request.cursor(c);
        }

        let response = self.service.history(request).await?;

        for message in &response.messages {
            if message.is_thread_parent() {
                self.cursor
                    .thread_cursors
                    .entry(message.ts.clone())
                    .or_insert(None);
            }
        }

        self.cursor.next_cursor = response.next_cursor();
        self.cursor.history_done = self.cursor.next_cursor.is_none();

        debug!(
            count = response.messages.len(),
            done = self.cursor.history_done,
            pending_threads = self.cursor.thread_cursors.len(),
            "History page fetched"
        );

        Ok(PageBatch {
            messages: response.messages,
            kind: PageKind::History,
        })
    }

    async fn thread_page(
        &mut self,
        ts: Timestamp,
        thread_cursor: Option<Cursor>,
    ) -> ExportResult<PageBatch> {
        let mut request = RepliesRequest::new(
            self.cursor.conversation_id.clone(),
            ts.clone(),
            self.limit,
        );
        if let Some(c) = thread_cursor {
            request = request.cursor(c);
        }

        let response = self.service.replies(request).await?;
        let next = response.next_cursor();

        // The parent already appeared in its history page.
        let messages: Vec<Message> = response
            .messages
            .into_iter()
            .filter(|m| m.ts != ts)
            .collect();

        match next {
            Some(cursor) => {
                self.cursor.thread_cursors.insert(ts.clone(), Some(cursor));
            }
            None => {
                self.cursor.thread_cursors.remove(&ts);
            }
        }

        debug!(
            thread = %ts,
            count = messages.len(),
            pending_threads = self.cursor.thread_cursors.len(),
            "Thread page fetched"
        );

        Ok(PageBatch {
            messages,
            kind: PageKind::Thread(ts),
        })
    }
}
