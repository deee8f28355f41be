//! Canned API response bodies for tests.

use serde_json::{json, Value};

/// A `users.list` page
pub fn users_response(members: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "ok": true,
        "members": members,
        "response_metadata": { "next_cursor": next_cursor.unwrap_or("") }
    })
}

/// A workspace member
pub fn user(id: &str, real_name: &str) -> Value {
    json!({
        "id": id,
        "name": real_name.to_lowercase().replace(' ', "."),
        "real_name": real_name,
        "deleted": false
    })
}

/// A `conversations.list` page
pub fn conversations_response(channels: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "ok": true,
        "channels": channels,
        "response_metadata": { "next_cursor": next_cursor.unwrap_or("") }
    })
}

/// A named channel
pub fn channel(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "is_im": false, "is_mpim": false })
}

/// A direct message conversation with the given counterpart
pub fn im(id: &str, user_id: &str) -> Value {
    json!({ "id": id, "is_im": true, "user": user_id })
}

/// A `conversations.history` or `conversations.replies` page
pub fn history_response(messages: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "ok": true,
        "messages": messages,
        "has_more": next_cursor.is_some(),
        "response_metadata": { "next_cursor": next_cursor.unwrap_or("") }
    })
}

/// A plain message
pub fn message(ts: &str, text: &str) -> Value {
    json!({ "type": "message", "ts": ts, "user": "U001", "text": text })
}

/// A thread parent with replies
pub fn thread_parent(ts: &str, reply_count: u32) -> Value {
    json!({
        "type": "message",
        "ts": ts,
        "thread_ts": ts,
        "user": "U001",
        "text": "thread root",
        "reply_count": reply_count
    })
}

/// A reply within the thread rooted at `parent_ts`
pub fn thread_reply(ts: &str, parent_ts: &str) -> Value {
    json!({
        "type": "message",
        "ts": ts,
        "thread_ts": parent_ts,
        "user": "U002",
        "text": "reply"
    })
}

/// A message carrying one file attachment
pub fn message_with_file(ts: &str, file_id: &str, file_name: &str, url: &str) -> Value {
    json!({
        "type": "message",
        "ts": ts,
        "user": "U001",
        "text": "file attached",
        "files": [{ "id": file_id, "name": file_name, "url_private": url }]
    })
}

/// An `ok: false` error body
pub fn error_response(code: &str) -> Value {
    json!({ "ok": false, "error": code })
}
