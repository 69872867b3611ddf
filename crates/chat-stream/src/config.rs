use std::time::Duration;

use crate::errors::ChatError;

/// Model id used when none is configured.
pub const DEFAULT_MODEL: &str = "local-model";

/// Configuration for the HTTP transport.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the OpenAI-compatible API, including any version prefix
    /// (for example `http://localhost:1234/v1`).
    pub base_url: String,
    /// Model id used by [`crate::ChatClient::request`].
    pub model: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Optional limit on a whole exchange, body included. Unset by default so
    /// long replies are never cut off.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a config for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: None,
        }
    }

    /// Builds a config from `CHAT_STREAM_*` environment variables.
    ///
    /// - `CHAT_STREAM_BASE_URL` (required)
    /// - `CHAT_STREAM_MODEL`
    /// - `CHAT_STREAM_API_KEY`
    /// - `CHAT_STREAM_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ChatError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = read("CHAT_STREAM_BASE_URL")
            .ok_or_else(|| ChatError::Config("missing CHAT_STREAM_BASE_URL".into()))?;
        let mut config = Self::new(base_url);
        if let Some(model) = read("CHAT_STREAM_MODEL") {
            config = config.model(model);
        }
        if let Some(api_key) = read("CHAT_STREAM_API_KEY") {
            config = config.api_key(api_key);
        }
        if let Some(raw) = read("CHAT_STREAM_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                ChatError::Config(format!("invalid CHAT_STREAM_TIMEOUT_SECS `{raw}`: {e}"))
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Overrides the default model id.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets a bearer token sent with every request.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets an overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ChatError> {
        if self.base_url.trim().is_empty() {
            return Err(ChatError::Config("base_url must not be empty".into()));
        }
        Ok(())
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn completions_url_joins_without_double_slash() {
        let config = ClientConfig::new("http://localhost:8000/v1/");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn env_lookup_reads_all_fields() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CHAT_STREAM_BASE_URL", "http://host/v1"),
            ("CHAT_STREAM_MODEL", "vinallama"),
            ("CHAT_STREAM_API_KEY", "secret"),
            ("CHAT_STREAM_TIMEOUT_SECS", "30"),
        ]))
        .expect("config");
        assert_eq!(config.base_url, "http://host/v1");
        assert_eq!(config.model, "vinallama");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn env_lookup_defaults_and_errors() {
        let config =
            ClientConfig::from_lookup(lookup(&[("CHAT_STREAM_BASE_URL", "http://host/v1")]))
                .expect("config");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert!(config.timeout.is_none());

        let missing = ClientConfig::from_lookup(lookup(&[])).expect_err("missing url");
        assert!(matches!(missing, ChatError::Config(msg) if msg.contains("CHAT_STREAM_BASE_URL")));

        let bad_timeout = ClientConfig::from_lookup(lookup(&[
            ("CHAT_STREAM_BASE_URL", "http://host/v1"),
            ("CHAT_STREAM_TIMEOUT_SECS", "soon"),
        ]))
        .expect_err("bad timeout");
        assert!(matches!(bad_timeout, ChatError::Config(msg) if msg.contains("soon")));
    }

    #[test]
    fn empty_base_url_is_invalid() {
        assert!(ClientConfig::new(" ").validate().is_err());
        assert!(ClientConfig::new("http://x").validate().is_ok());
    }
}
