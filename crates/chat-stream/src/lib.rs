//! Incremental consumer for OpenAI-compatible chat-completion streams.
//!
//! A send adapts the stored conversation into wire messages, posts a
//! streaming request, reassembles `data:` frames from arbitrarily split
//! network chunks and hands the growing reply text to a callback after every
//! delta.
//!
//! # Streaming a reply
//!
//! ```no_run
//! use chat_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ChatError> {
//! let client = ChatClient::new(ClientConfig::new("http://localhost:1234/v1").model("vinallama"))?;
//! let history = vec![HistoryEntry::new("bot", "Hello! How can I help?")];
//!
//! let request = client
//!     .request()
//!     .conversation(&history, "What is on the calendar today?")
//!     .web_search(false)
//!     .caller_id(generate_caller_id())
//!     .build()?;
//!
//! let reply = client
//!     .stream(&request, |text| println!("{text}"))
//!     .await?;
//! println!("final: {}", reply.text);
//! # Ok(())
//! # }
//! ```

/// Running reply text.
pub mod accumulator;
/// Public client and the one-call `send` entry point.
pub mod client;
/// Transport configuration.
pub mod config;
/// Single-flight guard for sends within one conversation.
pub mod conversation;
/// Recoverable per-frame diagnostics.
///
/// Sessions never fail because of a bad frame. They hand the problem to a
/// [`DiagnosticSink`] and move on to the next frame.
pub mod diagnostics;
/// Public error types.
pub mod errors;
/// Frame classification.
pub mod event;
/// Frame reassembly from network chunks.
pub mod frame;
/// Stored conversation entries and their conversion into wire messages.
pub mod history;
/// Common imports for typical usage.
pub mod prelude;
/// Request payload and builder.
pub mod request;
/// Per-send session state machine and cancellation handles.
pub mod session;
/// HTTP seam.
pub mod transport;

pub use accumulator::Accumulator;
pub use client::{ChatClient, send};
pub use config::{ClientConfig, DEFAULT_MODEL};
pub use conversation::{ConversationGate, SessionTicket};
pub use diagnostics::{CollectingSink, DiagnosticSink, TracingSink};
pub use errors::{ChatError, MalformedFrame};
pub use event::{FrameEvent, parse_frame};
pub use frame::{Frame, FrameReader, frame_stream};
pub use history::{HistoryEntry, Message, Role, adapt_history};
pub use request::{RequestBuilder, StreamRequest, TEMPERATURE, generate_caller_id};
pub use session::{
    AbortHandle, AbortSignal, SessionOptions, SessionState, StreamReply, StreamSession,
    Termination,
};
pub use transport::{ByteStream, CompletionTransport, HttpTransport};
