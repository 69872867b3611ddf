use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ChatError;
use crate::history::{HistoryEntry, Message, adapt_history};

/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 0.7;

/// Extra field carrying the web-search flag.
pub const SEARCH_WEB_FIELD: &str = "search_web";

/// Extra field carrying the caller/device identifier.
pub const CALLER_ID_FIELD: &str = "device_id";

const RESERVED_FIELDS: [&str; 4] = ["model", "messages", "temperature", "stream"];

/// Outbound chat-completion request.
///
/// Built once per send through [`RequestBuilder`] and read-only afterwards.
/// Serializes to the streaming wire body (`stream: true`).
#[derive(Clone, Debug, PartialEq)]
pub struct StreamRequest {
    model: String,
    messages: Vec<Message>,
    extra: Map<String, Value>,
}

impl StreamRequest {
    /// Starts a builder for the given model id.
    pub fn builder(model: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Fixed sampling temperature.
    pub fn temperature(&self) -> f64 {
        TEMPERATURE
    }

    /// Provider-specific fields merged into the top level of the body.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub(crate) fn body(&self, stream: bool) -> WireBody<'_> {
        WireBody {
            model: &self.model,
            messages: &self.messages,
            temperature: TEMPERATURE,
            stream,
            extra: &self.extra,
        }
    }
}

impl Serialize for StreamRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body(true).serialize(serializer)
    }
}

#[derive(Serialize)]
pub(crate) struct WireBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    stream: bool,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Builder for [`StreamRequest`].
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    model: String,
    messages: Vec<Message>,
    extra: Map<String, Value>,
}

impl RequestBuilder {
    /// Creates a builder for the given model id.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Replaces the message list.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Appends one message.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the messages from a stored conversation plus the new outbound
    /// text (see [`adapt_history`]).
    pub fn conversation(self, history: &[HistoryEntry], text: &str) -> Self {
        self.messages(adapt_history(history, text))
    }

    /// Asks the endpoint to augment the answer with a web search.
    pub fn web_search(self, enabled: bool) -> Self {
        self.extra(SEARCH_WEB_FIELD, enabled)
    }

    /// Identifies the calling device or user to the endpoint.
    pub fn caller_id(self, id: impl Into<String>) -> Self {
        self.extra(CALLER_ID_FIELD, id.into())
    }

    /// Adds a provider-specific top-level field. Later values for the same
    /// key replace earlier ones.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validates and freezes the request.
    pub fn build(self) -> Result<StreamRequest, ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::invalid("model must not be empty"));
        }
        if self.messages.is_empty() {
            return Err(ChatError::invalid("at least one message is required"));
        }
        if let Some(key) = self
            .extra
            .keys()
            .find(|key| RESERVED_FIELDS.contains(&key.as_str()))
        {
            return Err(ChatError::invalid(format!(
                "extra field `{key}` would overwrite a reserved request field"
            )));
        }
        Ok(StreamRequest {
            model: self.model,
            messages: self.messages,
            extra: self.extra,
        })
    }
}

const CALLER_ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a fresh caller identifier: `device_` plus nine random base-36
/// characters.
pub fn generate_caller_id() -> String {
    let mut bits = uuid::Uuid::new_v4().as_u128();
    let mut id = String::from("device_");
    for _ in 0..9 {
        id.push(char::from(CALLER_ID_ALPHABET[(bits % 36) as usize]));
        bits /= 36;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_single_user_message_body() {
        let request = StreamRequest::builder("m")
            .conversation(&[], "Hi")
            .build()
            .expect("request");
        let body = serde_json::to_value(&request).expect("json");
        assert_eq!(
            body.get("messages"),
            Some(&serde_json::json!([{"role": "user", "content": "Hi"}]))
        );
        assert_eq!(body.get("stream").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(body.get("model").and_then(|v| v.as_str()), Some("m"));
        assert_eq!(body.get("temperature").and_then(|v| v.as_f64()), Some(0.7));
    }

    #[test]
    fn feature_flags_are_flattened_into_body() {
        let request = StreamRequest::builder("vinallama")
            .message(Message::user("hello"))
            .web_search(true)
            .caller_id("device_abc")
            .build()
            .expect("request");
        let body = serde_json::to_value(&request).expect("json");
        assert_eq!(body.get("search_web"), Some(&serde_json::json!(true)));
        assert_eq!(body.get("device_id"), Some(&serde_json::json!("device_abc")));
        assert!(body.get("extra").is_none());
    }

    #[test]
    fn flags_are_omitted_when_unset() {
        let request = StreamRequest::builder("m")
            .message(Message::user("hello"))
            .build()
            .expect("request");
        let body = serde_json::to_value(&request).expect("json");
        let object = body.as_object().expect("object");
        assert_eq!(object.len(), 4);
    }

    #[test]
    fn unary_body_disables_streaming() {
        let request = StreamRequest::builder("m")
            .message(Message::user("hello"))
            .build()
            .expect("request");
        let body = serde_json::to_value(request.body(false)).expect("json");
        assert_eq!(body.get("stream").and_then(|v| v.as_bool()), Some(false));
    }

    #[test]
    fn empty_messages_are_rejected() {
        let err = StreamRequest::builder("m").build().expect_err("must fail");
        assert!(matches!(err, ChatError::InvalidRequest(msg) if msg.contains("at least one message")));
    }

    #[test]
    fn blank_model_is_rejected() {
        let err = StreamRequest::builder("  ")
            .message(Message::user("x"))
            .build()
            .expect_err("must fail");
        assert!(matches!(err, ChatError::InvalidRequest(msg) if msg.contains("model")));
    }

    #[test]
    fn reserved_extra_keys_are_rejected() {
        let err = StreamRequest::builder("m")
            .message(Message::user("x"))
            .extra("stream", false)
            .build()
            .expect_err("must fail");
        assert!(matches!(err, ChatError::InvalidRequest(msg) if msg.contains("`stream`")));
    }

    #[test]
    fn generated_caller_id_has_device_prefix() {
        let id = generate_caller_id();
        assert!(id.starts_with("device_"));
        assert_eq!(id.len(), "device_".len() + 9);
        assert!(
            id["device_".len()..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert_ne!(id, generate_caller_id());
    }
}
