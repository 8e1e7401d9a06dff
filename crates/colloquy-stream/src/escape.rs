//! Escape codec for content payloads on the chat wire protocol.
//!
//! The chat service flattens assistant replies to single-line payloads by
//! replacing newline, carriage return, and tab characters with two-character
//! escape sequences. Decoding happens after line framing, so a payload can
//! never smuggle an extra line terminator into the stream.

/// Restores the literal control characters from an escaped content payload.
///
/// Exactly three sequences are defined: `\n`, `\r`, and `\t`. Any other
/// backslash usage is passed through untouched, so payloads carrying literal
/// backslashes (Windows paths, regex fragments) survive decoding.
///
/// # Examples
///
/// ```
/// use colloquy_stream::unescape;
///
/// assert_eq!(unescape("line one\\nline two"), "line one\nline two");
/// assert_eq!(unescape("C:\\path\\file"), "C:\\path\\file");
/// ```
pub fn unescape(payload: &str) -> String {
    payload
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
}

/// Applies the wire escaping the chat service uses for content payloads.
///
/// Inverse of [`unescape`] for text whose literal backslashes are not
/// immediately followed by `n`, `r`, or `t`.
pub fn escape(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
