//! Accumulation of content frames into the final reply text.

use crate::escape::unescape;
use crate::frame::Frame;

/// Enumerates supported `StreamOutcome` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamOutcome {
    /// No terminal event has been observed yet.
    #[default]
    Pending,
    /// The stream ended with a `done` event; the content is complete.
    Completed,
    /// The stream ended with an `error` event; the content is unusable.
    Failed,
}

/// Folds classified frames into the accumulated reply.
///
/// Content payloads are escape-decoded and appended in arrival order. A
/// `done` or `error` event makes the assembler terminal; every frame after
/// that is ignored, so trailing sentinels or stray lines cannot corrupt a
/// finished reply.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    content: String,
    outcome: StreamOutcome,
}

impl StreamAssembler {
    /// Creates an assembler with empty content and a pending outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame, returning the decoded delta when content grew.
    ///
    /// Returns `None` for events, ignorable frames, empty payloads, and any
    /// frame arriving after the outcome became terminal.
    pub fn apply(&mut self, frame: Frame) -> Option<String> {
        if self.outcome != StreamOutcome::Pending {
            return None;
        }
        match frame {
            Frame::Content(payload) => {
                if payload.is_empty() {
                    return None;
                }
                let delta = unescape(&payload);
                self.content.push_str(&delta);
                Some(delta)
            }
            Frame::Event(token) => {
                match token.as_str() {
                    "done" => self.outcome = StreamOutcome::Completed,
                    "error" => self.outcome = StreamOutcome::Failed,
                    other => {
                        tracing::debug!(event = other, "ignoring unrecognized stream event");
                    }
                }
                None
            }
            Frame::Ignorable => None,
        }
    }

    /// Returns the content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the current outcome.
    pub fn outcome(&self) -> StreamOutcome {
        self.outcome
    }

    /// Returns true once a terminal event has been applied.
    pub fn is_terminal(&self) -> bool {
        self.outcome != StreamOutcome::Pending
    }

    /// Consumes the assembler, yielding the accumulated content.
    pub fn into_content(self) -> String {
        self.content
    }
}
