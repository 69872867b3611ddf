/// Errors returned by the public chat-stream API.
///
/// Only request validation, configuration and transport problems surface
/// here. Problems with individual stream frames are reported through
/// [`crate::DiagnosticSink`] as [`MalformedFrame`] and never abort a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Caller supplied an unusable request. Raised before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// The HTTP exchange failed: unreachable host, non-2xx status or a body
    /// read error mid-stream.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        status_code: Option<u16>,
    },
    /// A non-streaming response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The session was aborted or superseded before it finished.
    #[error("stream cancelled")]
    Cancelled,
}

impl ChatError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status_code,
        }
    }

    /// Returns the HTTP status associated with a transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// A frame whose payload could not be decoded as a delta envelope.
///
/// The frame is skipped and the session continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed frame #{frame_index}: {reason}")]
pub struct MalformedFrame {
    /// Zero-based position of the frame in the session.
    pub frame_index: u64,
    /// Frame content after the `data:` prefix was stripped.
    pub payload: String,
    /// Decoder error message.
    pub reason: String,
}
