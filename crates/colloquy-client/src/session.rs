//! Session controller driving one streaming send at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use colloquy_stream::{
    classify_line, LineSplitter, StreamAssembler, StreamOutcome, Utf8ChunkDecoder,
};
use futures_util::StreamExt;

use crate::transcript::{DraftStatus, TranscriptStore};
use crate::transport::ChatTransport;
use crate::types::{ChatClientError, Message};

/// Callback invoked with the full accumulated draft content after every
/// applied content delta. Snapshots grow monotonically until the send ends.
pub type DraftUpdateHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Cooperative cancellation signal for an in-flight send.
///
/// `cancel` sets a flag and wakes the pending chunk await; the session
/// observes it at the next suspension point and applies no frame afterwards.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl CancelToken {
    /// Creates a new, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token as cancelled and wakes the chunk await.
    ///
    /// `notify_one` stores a permit when nothing is waiting yet, so a
    /// cancellation can never be lost between the flag check and the wait
    /// registration.
    pub fn cancel(&self) {
        let already_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if !already_cancelled {
            self.notify.notify_one();
        }
    }

    /// Returns true when cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Enumerates supported `SendOutcome` values.
pub enum SendOutcome {
    /// The stream completed and the finalized assistant message was added.
    Completed(Message),
    /// The caller aborted the stream; the optimistic user message remains.
    Cancelled,
}

enum StreamEnd {
    Completed(String),
    Cancelled,
}

/// Drives sends for one conversation thread against a [`ChatTransport`].
///
/// A session owns the thread's [`TranscriptStore`] and enforces at most one
/// in-flight send: while a stream is active, further sends and transcript
/// replacement are rejected with [`ChatClientError::Busy`]. Sending inserts
/// the user message optimistically, then either finalizes the assistant
/// reply (stream completed), rolls the optimistic message back (stream
/// failed), or keeps it without a reply (cancelled).
pub struct ChatSession {
    thread_id: String,
    transport: Arc<dyn ChatTransport>,
    store: Arc<Mutex<TranscriptStore>>,
    active_cancel: Mutex<Option<CancelToken>>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>, thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            transport,
            store: Arc::new(Mutex::new(TranscriptStore::new())),
            active_cancel: Mutex::new(None),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Snapshot of the finalized transcript in order.
    pub fn messages(&self) -> Vec<Message> {
        lock_or_recover(&self.store).messages().to_vec()
    }

    /// Live draft content while a send is in flight, `None` otherwise.
    pub fn streaming_content(&self) -> Option<String> {
        lock_or_recover(&self.store).streaming_content()
    }

    /// Returns true while a send is in flight.
    pub fn is_streaming(&self) -> bool {
        lock_or_recover(&self.store).is_streaming()
    }

    /// The most recent send failure, cleared when a new send starts.
    pub fn last_error(&self) -> Option<String> {
        lock_or_recover(&self.store)
            .last_error()
            .map(str::to_string)
    }

    /// Replaces the finalized transcript, e.g. with server-fetched history.
    ///
    /// Rejected while a send is in flight so the reconciliation of the
    /// active stream cannot race the replacement.
    pub fn replace_messages(&self, messages: Vec<Message>) -> Result<(), ChatClientError> {
        let mut store = lock_or_recover(&self.store);
        if store.is_streaming() {
            return Err(ChatClientError::Busy);
        }
        store.replace_messages(messages);
        Ok(())
    }

    /// Requests cooperative cancellation of the in-flight send, if any.
    pub fn cancel(&self) {
        let active = lock_or_recover(&self.active_cancel);
        if let Some(token) = active.as_ref() {
            tracing::debug!(thread_id = self.thread_id.as_str(), "cancelling active send");
            token.cancel();
        }
    }

    /// Sends `content` and drives the response stream to its end.
    pub async fn send(&self, content: &str) -> Result<SendOutcome, ChatClientError> {
        self.send_with_observer(content, None).await
    }

    /// Sends `content`, invoking `on_update` with the accumulated draft
    /// content after every applied delta.
    ///
    /// Fails fast with [`ChatClientError::EmptyMessage`] when `content`
    /// trims to nothing and [`ChatClientError::Busy`] when a send is
    /// already in flight; neither mutates any state.
    pub async fn send_with_observer(
        &self,
        content: &str,
        on_update: Option<DraftUpdateHandler>,
    ) -> Result<SendOutcome, ChatClientError> {
        if content.trim().is_empty() {
            return Err(ChatClientError::EmptyMessage);
        }

        let optimistic = Message::local_user(&self.thread_id, content);
        {
            let mut store = lock_or_recover(&self.store);
            if store.is_streaming() {
                return Err(ChatClientError::Busy);
            }
            store.set_last_error(None);
            store.push_message(optimistic.clone());
            store.begin_draft();
        }

        let cancel = CancelToken::new();
        *lock_or_recover(&self.active_cancel) = Some(cancel.clone());
        tracing::debug!(
            thread_id = self.thread_id.as_str(),
            message_id = optimistic.id.as_str(),
            "sending chat message"
        );

        let result = self
            .drive_stream(content, &cancel, on_update.as_ref())
            .await;
        *lock_or_recover(&self.active_cancel) = None;

        match result {
            Ok(StreamEnd::Completed(reply)) => {
                let message = Message::local_assistant(&self.thread_id, reply);
                {
                    let mut store = lock_or_recover(&self.store);
                    store.set_draft_status(DraftStatus::Done);
                    store.push_message(message.clone());
                    store.clear_draft();
                }
                tracing::debug!(
                    thread_id = self.thread_id.as_str(),
                    message_id = message.id.as_str(),
                    chars = message.content.len(),
                    "assistant reply finalized"
                );
                Ok(SendOutcome::Completed(message))
            }
            Ok(StreamEnd::Cancelled) => {
                {
                    let mut store = lock_or_recover(&self.store);
                    store.clear_draft();
                }
                tracing::debug!(
                    thread_id = self.thread_id.as_str(),
                    "send cancelled; optimistic message retained"
                );
                Ok(SendOutcome::Cancelled)
            }
            Err(error) => {
                let detail = error.to_string();
                {
                    let mut store = lock_or_recover(&self.store);
                    store.set_draft_status(DraftStatus::Error);
                    store.remove_message(&optimistic.id);
                    store.set_last_error(Some(detail.clone()));
                    store.clear_draft();
                }
                tracing::debug!(
                    thread_id = self.thread_id.as_str(),
                    error = detail.as_str(),
                    "send failed; optimistic message rolled back"
                );
                Err(error)
            }
        }
    }

    async fn drive_stream(
        &self,
        content: &str,
        cancel: &CancelToken,
        on_update: Option<&DraftUpdateHandler>,
    ) -> Result<StreamEnd, ChatClientError> {
        let mut chunks = self.transport.open_stream(&self.thread_id, content).await?;
        let mut decoder = Utf8ChunkDecoder::new();
        let mut splitter = LineSplitter::new();
        let mut assembler = StreamAssembler::new();

        loop {
            if cancel.is_cancelled() {
                return Ok(StreamEnd::Cancelled);
            }
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                chunk = chunks.next() => chunk,
            };
            let Some(chunk) = next else {
                break;
            };
            let bytes = chunk?;
            let text = decoder.decode(&bytes).map_err(|error| {
                ChatClientError::InvalidResponse(format!(
                    "invalid UTF-8 in streaming response: {error}"
                ))
            })?;

            for line in splitter.feed(&text) {
                if let Some(delta) = assembler.apply(classify_line(&line)) {
                    let published = lock_or_recover(&self.store).append_draft(&delta);
                    if let Some(handler) = on_update {
                        handler(published);
                    }
                }
                if assembler.is_terminal() {
                    break;
                }
            }
            if assembler.is_terminal() {
                break;
            }
        }

        if let Some(partial) = splitter.flush() {
            tracing::debug!(
                thread_id = self.thread_id.as_str(),
                bytes = partial.len(),
                "discarding unterminated trailing line"
            );
        }
        if decoder.has_pending() {
            tracing::debug!(
                thread_id = self.thread_id.as_str(),
                "discarding incomplete trailing UTF-8 sequence"
            );
        }

        match assembler.outcome() {
            StreamOutcome::Completed => Ok(StreamEnd::Completed(assembler.into_content())),
            StreamOutcome::Failed => Err(ChatClientError::GenerationFailed),
            StreamOutcome::Pending => Err(ChatClientError::TruncatedStream),
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
