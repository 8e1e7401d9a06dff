//! In-memory transcript state for one chat session.

use crate::types::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Enumerates supported `DraftStatus` values.
pub enum DraftStatus {
    /// No send is in flight.
    #[default]
    Idle,
    /// A send is in flight and content may still arrive.
    Streaming,
    /// The stream reached its `done` event; the draft is being finalized.
    Done,
    /// The stream failed; the draft is being discarded.
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Public struct `Draft` used across Colloquy components.
pub struct Draft {
    pub content: String,
    pub status: DraftStatus,
}

/// Finalized messages plus the at-most-one in-flight draft.
///
/// The store only records state; the session controller decides when the
/// draft is promoted to a message or rolled back. All operations are
/// synchronous and never block on I/O.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
    draft: Draft,
    last_error: Option<String>,
}

impl TranscriptStore {
    /// Creates an empty store with an idle draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the finalized messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends a finalized message.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Removes the message with the given id; true when one was removed.
    pub fn remove_message(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|message| message.id != id);
        self.messages.len() != before
    }

    /// Replaces the finalized messages wholesale, e.g. with server history.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Returns the in-flight draft.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Opens an empty streaming draft for a new send.
    pub fn begin_draft(&mut self) {
        self.draft = Draft {
            content: String::new(),
            status: DraftStatus::Streaming,
        };
    }

    /// Appends a decoded delta, returning the full accumulated content.
    pub fn append_draft(&mut self, delta: &str) -> String {
        self.draft.content.push_str(delta);
        self.draft.content.clone()
    }

    /// Marks the draft's terminal disposition before it is cleared.
    pub fn set_draft_status(&mut self, status: DraftStatus) {
        self.draft.status = status;
    }

    /// Destroys the draft: content cleared, status back to idle.
    pub fn clear_draft(&mut self) {
        self.draft = Draft::default();
    }

    /// Returns the live draft content while a send is in flight.
    ///
    /// `Some("")` right after a send starts, growing as deltas arrive, and
    /// `None` once the draft has been finalized or discarded.
    pub fn streaming_content(&self) -> Option<String> {
        match self.draft.status {
            DraftStatus::Idle => None,
            _ => Some(self.draft.content.clone()),
        }
    }

    /// Returns true while a send may still mutate the draft.
    pub fn is_streaming(&self) -> bool {
        self.draft.status == DraftStatus::Streaming
    }

    /// Records (or clears) the most recent send failure.
    pub fn set_last_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }

    /// Returns the most recent send failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
