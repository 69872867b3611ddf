use std::pin::Pin;

use futures::StreamExt as _;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::ChatError;
use crate::request::StreamRequest;

/// Raw response body as a stream of network chunks.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, ChatError>> + Send + 'static>>;

/// Sends requests to a chat-completion endpoint.
///
/// [`HttpTransport`] is the production implementation; tests and embedders
/// can supply their own.
#[async_trait::async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Sends a streaming request and returns the response body once the
    /// endpoint answered with a success status.
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ChatError>;

    /// Sends the same payload with `stream: false` and returns the decoded
    /// JSON response.
    async fn complete(&self, request: &StreamRequest) -> Result<serde_json::Value, ChatError>;
}

/// `reqwest`-backed transport for `POST {base_url}/chat/completions`.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        config.validate()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post(&self, body: &impl serde::Serialize) -> Result<reqwest::Response, ChatError> {
        let url = self.config.chat_completions_url();
        let mut http_req = self.client.post(&url).json(body);
        if let Some(api_key) = &self.config.api_key {
            http_req = http_req.bearer_auth(api_key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ChatError::transport(format!("request to {url} failed: {e}"), None))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let body = body.trim();
            let message = if body.is_empty() {
                format!("chat completion request failed with status {status}")
            } else {
                format!("chat completion request failed with status {status}: {body}")
            };
            return Err(ChatError::transport(message, Some(status.as_u16())));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl CompletionTransport for HttpTransport {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ChatError> {
        debug!(
            model = request.model(),
            messages = request.messages().len(),
            "opening chat completion stream"
        );
        let response = self.post(&request.body(true)).await?;
        let chunks = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| ChatError::transport(format!("stream read failed: {e}"), None))
        });
        Ok(Box::pin(chunks))
    }

    async fn complete(&self, request: &StreamRequest) -> Result<serde_json::Value, ChatError> {
        debug!(
            model = request.model(),
            messages = request.messages().len(),
            "sending chat completion request"
        );
        let response = self.post(&request.body(false)).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ChatError::transport(format!("failed to read response body: {e}"), None))?;
        serde_json::from_slice(&body)
            .map_err(|e| ChatError::Protocol(format!("response body is not JSON: {e}")))
    }
}
