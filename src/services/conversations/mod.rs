//! Conversations service: listing, history, and thread replies.

mod requests;
mod responses;
mod service;

pub use requests::{HistoryRequest, ListConversationsRequest, RepliesRequest};
pub use responses::{HistoryResponse, ListConversationsResponse, RepliesResponse};
pub use service::ConversationsService;
