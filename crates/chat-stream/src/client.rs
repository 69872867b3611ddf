use std::sync::Arc;

use tracing::{Instrument as _, debug, info_span};

use crate::config::ClientConfig;
use crate::conversation::ConversationGate;
use crate::errors::ChatError;
use crate::history::HistoryEntry;
use crate::request::{RequestBuilder, StreamRequest};
use crate::session::{SessionOptions, StreamReply, StreamSession};
use crate::transport::{CompletionTransport, HttpTransport};

/// Entry point for sending chat messages.
///
/// Cheap to clone; every send builds and owns its own [`StreamSession`].
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn CompletionTransport>,
    default_model: String,
}

impl ChatClient {
    /// Creates a client backed by [`HttpTransport`].
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        let default_model = config.model.clone();
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), default_model))
    }

    /// Creates a client from `CHAT_STREAM_*` environment variables.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(
        transport: Arc<dyn CompletionTransport>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            default_model: default_model.into(),
        }
    }

    /// Starts a request for the configured model.
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new(self.default_model.clone())
    }

    /// Streams a reply with default session options.
    pub async fn stream<F>(
        &self,
        request: &StreamRequest,
        on_update: F,
    ) -> Result<StreamReply, ChatError>
    where
        F: FnMut(&str),
    {
        self.stream_with(request, SessionOptions::default(), on_update)
            .await
    }

    /// Streams a reply, calling `on_update` with the full text after every
    /// non-empty delta.
    ///
    /// A non-2xx response fails before any callback. Once the body is being
    /// read, earlier callbacks stay valid even if the session later fails.
    pub async fn stream_with<F>(
        &self,
        request: &StreamRequest,
        options: SessionOptions,
        on_update: F,
    ) -> Result<StreamReply, ChatError>
    where
        F: FnMut(&str),
    {
        let mut session = StreamSession::new(options);
        let span = info_span!(
            "chat_stream",
            session_id = %session.id(),
            model = request.model()
        );
        async move {
            session.begin_send();
            debug!(messages = request.messages().len(), "sending streaming request");
            let opened = tokio::select! {
                biased;
                _ = session.cancelled() => Err(ChatError::Cancelled),
                opened = self.transport.open_stream(request) => opened,
            };
            let body = match opened {
                Ok(body) => body,
                Err(err) => return Err(session.fail(err)),
            };
            session.consume(body, on_update).await
        }
        .instrument(span)
        .await
    }

    /// Streams a reply as the only live session of a conversation.
    ///
    /// Any session previously started through the same gate is cancelled
    /// first and fails with [`ChatError::Cancelled`].
    pub async fn stream_exclusive<F>(
        &self,
        gate: &ConversationGate,
        request: &StreamRequest,
        on_update: F,
    ) -> Result<StreamReply, ChatError>
    where
        F: FnMut(&str),
    {
        let ticket = gate.begin();
        self.stream_with(request, ticket.session_options(), on_update)
            .await
    }

    /// Sends the request without streaming and returns
    /// `choices[0].message.content`.
    pub async fn complete(&self, request: &StreamRequest) -> Result<String, ChatError> {
        let value = self.transport.complete(request).await?;
        value
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                ChatError::Protocol("response has no choices[0].message.content".into())
            })
    }
}

/// Sends one message with its conversation history and streams the reply.
///
/// `on_update` receives the full reply text after every non-empty delta;
/// render by replacing, not appending. Resolves with the final text when the
/// stream ends, with or without the `[DONE]` sentinel.
pub async fn send<F>(
    history: &[HistoryEntry],
    message: &str,
    base_url: &str,
    model: &str,
    search_enabled: bool,
    caller_id: &str,
    on_update: F,
) -> Result<String, ChatError>
where
    F: FnMut(&str),
{
    if base_url.trim().is_empty() {
        return Err(ChatError::invalid("base_url must not be empty"));
    }
    let request = StreamRequest::builder(model)
        .conversation(history, message)
        .web_search(search_enabled)
        .caller_id(caller_id)
        .build()?;
    let client = ChatClient::new(ClientConfig::new(base_url).model(model))?;
    Ok(client.stream(&request, on_update).await?.into_text())
}
