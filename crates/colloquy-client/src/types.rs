use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

static MESSAGE_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `MessageRole` values.
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Public struct `Thread` used across Colloquy components.
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Public struct `Message` used across Colloquy components.
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Builds the optimistic user message inserted locally when a send
    /// starts, before the service has acknowledged anything.
    pub fn local_user(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: local_message_id("local-user"),
            thread_id: thread_id.into(),
            role: MessageRole::User,
            content: content.into(),
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Builds the finalized assistant message for a completed stream.
    pub fn local_assistant(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: local_message_id("local-assistant"),
            thread_id: thread_id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }
}

/// Generates a locally unique message id of the form `{prefix}-{millis}-{n}`.
fn local_message_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let count = MESSAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{millis}-{count}")
}

#[derive(Debug, Error)]
/// Enumerates supported `ChatClientError` values.
pub enum ChatClientError {
    #[error("a send is already streaming for this session")]
    Busy,
    #[error("message content is empty")]
    EmptyMessage,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat service returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("response stream ended without a terminal event")]
    TruncatedStream,
    #[error("assistant failed to generate a response")]
    GenerationFailed,
}
