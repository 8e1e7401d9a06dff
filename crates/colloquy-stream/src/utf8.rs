//! Incremental UTF-8 decoding for byte-chunked response bodies.

use std::str;

use thiserror::Error;

/// Error raised when the response stream carries bytes that cannot form
/// valid UTF-8.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid UTF-8 byte sequence in response stream: {0}")]
pub struct Utf8StreamError(pub str::Utf8Error);

/// Decodes UTF-8 text from arbitrarily split byte chunks.
///
/// Transports deliver the response body in chunks that can end in the middle
/// of a multi-byte character. The decoder carries the incomplete tail bytes
/// over to the next call, so callers always receive whole characters.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Creates a decoder with no carried-over bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next chunk, returning the complete characters it yields.
    ///
    /// A trailing incomplete multi-byte sequence is held back and prepended
    /// to the following chunk. Bytes that can never form valid UTF-8 fail
    /// immediately.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, Utf8StreamError> {
        if self.pending.is_empty() && chunk.is_empty() {
            return Ok(String::new());
        }
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);
        match str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(error) if error.error_len().is_none() => {
                let (complete, tail) = bytes.split_at(error.valid_up_to());
                self.pending = tail.to_vec();
                // `valid_up_to` marks the longest valid prefix, so this
                // re-parse cannot fail.
                let text = str::from_utf8(complete).map_err(Utf8StreamError)?;
                Ok(text.to_string())
            }
            Err(error) => Err(Utf8StreamError(error)),
        }
    }

    /// Returns true when the decoder holds an incomplete trailing sequence.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
