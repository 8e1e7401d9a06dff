//! Chunk-boundary-safe reassembly of protocol lines.

/// Reassembles complete `\n`-terminated lines from arbitrarily chunked text.
///
/// Chunks arrive wherever the transport happens to split them, including in
/// the middle of a line or between a `\r` and its `\n`. The splitter buffers
/// the unterminated tail so the sequence of emitted lines is identical no
/// matter how the input was chunked.
///
/// # Examples
///
/// ```
/// use colloquy_stream::LineSplitter;
///
/// let mut splitter = LineSplitter::new();
/// assert!(splitter.feed("data: Hel").is_empty());
/// assert_eq!(splitter.feed("lo\ndata: !\n"), vec!["data: Hello", "data: !"]);
/// assert_eq!(splitter.flush(), None);
/// ```
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    /// Creates a splitter with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completes, in order.
    ///
    /// Line terminators are stripped; a `\r\n` terminator is treated the
    /// same as a bare `\n`.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(position) = self.buffer.find('\n') {
            let line = self.buffer[..position].trim_end_matches('\r').to_string();
            self.buffer.drain(..=position);
            lines.push(line);
        }
        lines
    }

    /// Takes the trailing unterminated text, if any.
    ///
    /// Callers invoke this when the stream closes; a non-empty remainder is
    /// a partial line the protocol never completed.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.buffer))
    }
}
