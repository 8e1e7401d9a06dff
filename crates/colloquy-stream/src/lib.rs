//! Wire-level decoding for the chat response stream.
//!
//! The chat service answers a send with a line-oriented frame stream:
//! `data:` lines carry escaped content deltas, `event:` lines carry the
//! terminal `done`/`error` signal. Transports deliver that stream as raw
//! byte chunks split at arbitrary boundaries, so this crate layers four
//! stages that each restore one unit: bytes to characters
//! ([`Utf8ChunkDecoder`]), characters to lines ([`LineSplitter`]), lines to
//! frames ([`classify_line`]), and frames to the assembled reply
//! ([`StreamAssembler`]).

mod assembler;
mod escape;
mod frame;
mod line_splitter;
mod utf8;

pub use assembler::{StreamAssembler, StreamOutcome};
pub use escape::{escape, unescape};
pub use frame::{classify_line, Frame, DONE_SENTINEL};
pub use line_splitter::LineSplitter;
pub use utf8::{Utf8ChunkDecoder, Utf8StreamError};
