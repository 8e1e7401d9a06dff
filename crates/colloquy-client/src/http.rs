//! HTTP implementation of the chat service API.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::transport::{ByteChunkStream, ChatTransport};
use crate::types::{ChatClientError, Message, Thread};

const DEFAULT_API_BASE: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone)]
/// Public struct `ChatApiConfig` used across Colloquy components.
pub struct ChatApiConfig {
    pub api_base: String,
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ChatApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_token: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// HTTP client for the chat service's thread, message, and chat endpoints.
///
/// Thread and message calls are plain JSON request/response. The chat call
/// returns its body incrementally and is exposed through [`ChatTransport`],
/// which the session controller consumes.
#[derive(Debug, Clone)]
pub struct ChatApiClient {
    client: reqwest::Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = config.auth_token.as_deref() {
            let bearer = format!("Bearer {}", token.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&bearer).map_err(|error| {
                    ChatClientError::InvalidResponse(format!("invalid auth token header: {error}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn threads_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{base}/api/threads")
    }

    fn thread_url(&self, thread_id: &str) -> String {
        format!("{}/{thread_id}", self.threads_url())
    }

    fn messages_url(&self, thread_id: &str) -> String {
        format!("{}/messages", self.thread_url(thread_id))
    }

    fn chat_url(&self, thread_id: &str) -> String {
        format!("{}/chat", self.thread_url(thread_id))
    }

    /// Lists the caller's threads.
    pub async fn list_threads(&self) -> Result<Vec<Thread>, ChatClientError> {
        let response = self.client.get(self.threads_url()).send().await?;
        parse_json_response(response).await
    }

    /// Creates a thread, optionally titled.
    pub async fn create_thread(&self, title: Option<&str>) -> Result<Thread, ChatClientError> {
        let response = self
            .client
            .post(self.threads_url())
            .json(&json!({ "title": title }))
            .send()
            .await?;
        parse_json_response(response).await
    }

    /// Fetches one thread by id.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, ChatClientError> {
        let response = self.client.get(self.thread_url(thread_id)).send().await?;
        parse_json_response(response).await
    }

    /// Renames a thread.
    pub async fn update_thread(
        &self,
        thread_id: &str,
        title: &str,
    ) -> Result<Thread, ChatClientError> {
        let response = self
            .client
            .patch(self.thread_url(thread_id))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        parse_json_response(response).await
    }

    /// Deletes a thread and its messages.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<(), ChatClientError> {
        let response = self.client.delete(self.thread_url(thread_id)).send().await?;
        read_success_body(response).await?;
        Ok(())
    }

    /// Fetches a thread's finalized messages in chronological order.
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, ChatClientError> {
        let response = self.client.get(self.messages_url(thread_id)).send().await?;
        parse_json_response(response).await
    }
}

#[async_trait]
impl ChatTransport for ChatApiClient {
    async fn open_stream(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ByteChunkStream, ChatClientError> {
        tracing::debug!(thread_id = thread_id, "opening chat response stream");
        let response = self
            .client
            .post(self.chat_url(thread_id))
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ChatClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let chunks = response.bytes_stream().map(|chunk| match chunk {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(error) => Err(ChatClientError::Http(error)),
        });
        Ok(Box::pin(chunks))
    }
}

/// Reads the body, mapping non-success statuses to `HttpStatus` with the
/// body preserved for diagnostics.
async fn read_success_body(response: reqwest::Response) -> Result<String, ChatClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ChatClientError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

async fn parse_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ChatClientError> {
    let raw = read_success_body(response).await?;
    serde_json::from_str(&raw).map_err(|error| {
        ChatClientError::InvalidResponse(format!("failed to parse chat service response: {error}"))
    })
}
