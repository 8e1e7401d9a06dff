//! Headless client for the Colloquy chat service.
//!
//! The service stores conversation threads and answers each sent message
//! with a streamed assistant reply. This crate keeps a local transcript
//! consistent with that stream: [`ChatSession`] inserts the user message
//! optimistically, folds the response frames into a live draft through
//! `colloquy-stream`, and on the terminal event either finalizes the
//! assistant message or rolls the optimistic insert back. [`ChatApiClient`]
//! is the HTTP binding for the thread and message endpoints and the
//! streaming chat endpoint; [`ChatTransport`] is the seam that lets tests
//! script the stream without a server.

mod http;
mod session;
mod transcript;
mod transport;
mod types;


pub use http::{ChatApiClient, ChatApiConfig};
pub use session::{CancelToken, ChatSession, DraftUpdateHandler, SendOutcome};
pub use transcript::{Draft, DraftStatus, TranscriptStore};
pub use transport::{ByteChunkStream, ChatTransport};
pub use types::{ChatClientError, Message, MessageRole, Thread};
