//! End-to-end tests driving `ChatSession` through the HTTP client against a
//! mock chat service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use colloquy_client::{
    ByteChunkStream, ChatApiClient, ChatApiConfig, ChatClientError, ChatSession, ChatTransport,
    DraftUpdateHandler, MessageRole, SendOutcome,
};
use colloquy_stream::escape;
use futures_util::stream;
use httpmock::prelude::*;
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;

type StreamChunk = Result<Vec<u8>, ChatClientError>;

fn api_client(base_url: &str) -> ChatApiClient {
    ChatApiClient::new(ChatApiConfig {
        api_base: base_url.to_string(),
        auth_token: Some("integration-token".to_string()),
        request_timeout_ms: 5_000,
    })
    .expect("client")
}

fn collect_updates() -> (DraftUpdateHandler, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let handler: DraftUpdateHandler = Arc::new(move |snapshot| {
        sink.lock().expect("updates lock").push(snapshot);
    });
    (handler, log)
}

#[tokio::test]
async fn thread_conversation_round_trip_over_http() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/api/threads")
            .json_body(json!({ "title": "Trip planning" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": "thread-1",
                "title": "Trip planning",
                "created_at": "2026-02-01T09:00:00Z",
                "updated_at": "2026-02-01T09:00:00Z"
            }));
    });
    let chatted = server.mock(|when, then| {
        when.method(POST)
            .path("/api/threads/thread-1/chat")
            .json_body(json!({ "content": "Where to?" }));
        then.status(200)
            .header("content-type", "text/event-stream")
            .body("data: Hel\ndata: lo\ndata:  World\nevent: done\n");
    });
    let listed = server.mock(|when, then| {
        when.method(GET).path("/api/threads/thread-1/messages");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {
                    "id": "m1",
                    "thread_id": "thread-1",
                    "role": "user",
                    "content": "Where to?",
                    "metadata": {},
                    "created_at": "2026-02-01T09:00:01Z"
                },
                {
                    "id": "m2",
                    "thread_id": "thread-1",
                    "role": "assistant",
                    "content": "Hello World",
                    "metadata": {},
                    "created_at": "2026-02-01T09:00:02Z"
                }
            ]));
    });
    let deleted = server.mock(|when, then| {
        when.method(DELETE).path("/api/threads/thread-1");
        then.status(204);
    });

    let client = api_client(&server.base_url());
    let thread = client
        .create_thread(Some("Trip planning"))
        .await
        .expect("create thread");
    assert_eq!(thread.id, "thread-1");

    let session = ChatSession::new(Arc::new(client.clone()), thread.id.clone());
    let (handler, updates) = collect_updates();
    let outcome = session
        .send_with_observer("Where to?", Some(handler))
        .await
        .expect("send");

    chatted.assert();
    let reply = match outcome {
        SendOutcome::Completed(message) => message,
        SendOutcome::Cancelled => panic!("send should complete"),
    };
    assert_eq!(reply.content, "Hello World");
    assert_eq!(
        updates.lock().expect("updates lock").clone(),
        vec![
            "Hel".to_string(),
            "Hello".to_string(),
            "Hello World".to_string()
        ]
    );

    // Reconcile the local transcript against the server's canonical rows.
    let canonical = client.list_messages(&thread.id).await.expect("list");
    listed.assert();
    session
        .replace_messages(canonical)
        .expect("replace while idle");
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "m1");
    assert_eq!(messages[1].id, "m2");
    assert_eq!(messages[1].role, MessageRole::Assistant);

    client.delete_thread(&thread.id).await.expect("delete");
    deleted.assert();
}

#[tokio::test]
async fn escaped_multi_line_reply_decodes_over_http() {
    let server = MockServer::start();
    let reply = "Itinerary:\n\tDay 1: café\n\tDay 2: 😀";
    let body = format!("data: {}\nevent: done\n", escape(reply));
    server.mock(|when, then| {
        when.method(POST).path("/api/threads/t1/chat");
        then.status(200)
            .header("content-type", "text/event-stream")
            .body(body);
    });

    let session = ChatSession::new(Arc::new(api_client(&server.base_url())), "t1");
    let outcome = session.send("plan it").await.expect("send");

    match outcome {
        SendOutcome::Completed(message) => assert_eq!(message.content, reply),
        SendOutcome::Cancelled => panic!("send should complete"),
    }
}

#[tokio::test]
async fn generation_error_over_http_rolls_back() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/threads/t1/chat");
        then.status(200)
            .header("content-type", "text/event-stream")
            .body("data: half an ans\nevent: error\n");
    });

    let session = ChatSession::new(Arc::new(api_client(&server.base_url())), "t1");
    let error = session.send("hello").await.expect_err("send should fail");

    assert!(matches!(error, ChatClientError::GenerationFailed));
    assert!(session.messages().is_empty());
    assert_eq!(session.streaming_content(), None);
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn rejected_chat_request_surfaces_status_and_rolls_back() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/threads/t1/chat");
        then.status(503).body("assistant unavailable");
    });

    let session = ChatSession::new(Arc::new(api_client(&server.base_url())), "t1");
    let error = session.send("hello").await.expect_err("send should fail");

    match error {
        ChatClientError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "assistant unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn truncated_body_over_http_is_a_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/threads/t1/chat");
        then.status(200)
            .header("content-type", "text/event-stream")
            .body("data: no terminal event follows\n");
    });

    let session = ChatSession::new(Arc::new(api_client(&server.base_url())), "t1");
    let error = session.send("hello").await.expect_err("send should fail");

    assert!(matches!(error, ChatClientError::TruncatedStream));
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn bearer_token_is_attached_to_the_chat_stream_request() {
    let server = MockServer::start();
    let chatted = server.mock(|when, then| {
        when.method(POST)
            .path("/api/threads/t1/chat")
            .header("authorization", "Bearer integration-token");
        then.status(200)
            .header("content-type", "text/event-stream")
            .body("data: ok\nevent: done\n");
    });

    let session = ChatSession::new(Arc::new(api_client(&server.base_url())), "t1");
    session.send("hello").await.expect("send");
    chatted.assert();
}

/// Transport whose chunks are fed through a channel so cancellation can be
/// exercised end to end through the public API.
struct ChannelTransport {
    receiver: AsyncMutex<Option<tokio::sync::mpsc::UnboundedReceiver<StreamChunk>>>,
}

#[async_trait]
impl ChatTransport for ChannelTransport {
    async fn open_stream(
        &self,
        _thread_id: &str,
        _content: &str,
    ) -> Result<ByteChunkStream, ChatClientError> {
        let receiver = self.receiver.lock().await.take().ok_or_else(|| {
            ChatClientError::InvalidResponse("channel stream already taken".to_string())
        })?;
        Ok(Box::pin(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|item| (item, receiver))
        })))
    }
}

#[tokio::test]
async fn cancellation_keeps_the_optimistic_message_end_to_end() {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let transport = Arc::new(ChannelTransport {
        receiver: AsyncMutex::new(Some(receiver)),
    });
    let session = Arc::new(ChatSession::new(transport, "t1"));

    let in_flight = tokio::spawn({
        let session = session.clone();
        async move { session.send("keep me").await }
    });

    sender
        .send(Ok(b"data: partial\n".to_vec()))
        .expect("feed chunk");
    for _ in 0..200 {
        if session.streaming_content().as_deref() == Some("partial") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(session.is_streaming());

    session.cancel();
    let outcome = in_flight.await.expect("join").expect("send");
    assert_eq!(outcome, SendOutcome::Cancelled);

    let messages = session.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "keep me");
    assert_eq!(session.streaming_content(), None);
}
