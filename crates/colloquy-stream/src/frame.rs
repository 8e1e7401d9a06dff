//! Classification of protocol lines into stream frames.

/// Sentinel payload some upstreams append after the final content delta.
///
/// It carries no content and must never be decoded or appended.
pub const DONE_SENTINEL: &str = "[DONE]";

const CONTENT_PREFIX: &str = "data:";
const EVENT_PREFIX: &str = "event:";

/// Enumerates supported `Frame` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A content delta carrying its still-escaped payload.
    Content(String),
    /// A control event carrying its trimmed token.
    Event(String),
    /// A line the protocol assigns no meaning to.
    Ignorable,
}

/// Classifies one complete line. Total: every line maps to a frame.
///
/// `data:` lines yield [`Frame::Content`] with at most one space consumed
/// after the colon; the remaining payload is kept verbatim, still escaped.
/// The `[DONE]` sentinel is matched against that raw payload and classified
/// [`Frame::Ignorable`]. `event:` lines yield [`Frame::Event`] with the
/// whitespace-trimmed token; the classifier does not interpret it. Blank
/// lines, comments, and unknown fields are [`Frame::Ignorable`].
pub fn classify_line(line: &str) -> Frame {
    if let Some(rest) = line.strip_prefix(CONTENT_PREFIX) {
        let payload = rest.strip_prefix(' ').unwrap_or(rest);
        if payload == DONE_SENTINEL {
            return Frame::Ignorable;
        }
        return Frame::Content(payload.to_string());
    }
    if let Some(rest) = line.strip_prefix(EVENT_PREFIX) {
        return Frame::Event(rest.trim().to_string());
    }
    Frame::Ignorable
}
