//! Transport seam between the session controller and the chat service.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::types::ChatClientError;

/// Ordered byte-chunk stream carrying one assistant response.
///
/// Chunk boundaries are wherever the transport happened to split them; the
/// consumer must not assume chunks align with characters, lines, or frames.
pub type ByteChunkStream =
    Pin<Box<dyn Stream<Item = Result<Vec<u8>, ChatClientError>> + Send>>;

#[async_trait]
/// Trait contract for `ChatTransport` behavior.
pub trait ChatTransport: Send + Sync {
    /// Posts `content` to the thread's chat endpoint and returns the
    /// response chunk stream.
    ///
    /// Fails when the request is rejected before any chunk is produced;
    /// failures after that surface as `Err` items on the stream itself.
    async fn open_stream(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ByteChunkStream, ChatClientError>;
}
