use std::sync::Arc;

use futures::StreamExt as _;
use tokio::sync::watch;
use tracing::debug;

use crate::accumulator::Accumulator;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::errors::ChatError;
use crate::event::{FrameEvent, parse_frame};
use crate::frame::{Frame, frame_stream};
use crate::transport::ByteStream;

/// Handle used to request cancellation of one or more sessions.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Requests cancellation.
    ///
    /// A session observes it before its next frame and fails with
    /// [`ChatError::Cancelled`]; no callback runs after that point.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns a signal to hand to a session.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side of an [`AbortHandle`].
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation was requested. Pends forever if the handle
    /// is dropped without aborting.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Lifecycle of a [`StreamSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    Init,
    /// Request sent, waiting for response headers.
    Sending,
    /// Waiting for the next frame.
    Reading,
    /// Delivering an update to the callback.
    Emitting,
    /// The `[DONE]` sentinel was seen.
    Complete,
    /// The body ended without a sentinel.
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Closed | Self::Failed)
    }
}

/// How a successful session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    Sentinel,
    EndOfStream,
}

/// Result of a successful session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamReply {
    /// Final accumulated text.
    pub text: String,
    pub termination: Termination,
    /// Frames read, including ignored and malformed ones.
    pub frames: u64,
    /// Frames dropped as malformed.
    pub dropped_frames: u64,
}

impl StreamReply {
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Per-session collaborators.
#[derive(Clone)]
pub struct SessionOptions {
    diagnostics: Arc<dyn DiagnosticSink>,
    abort: AbortSignal,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            diagnostics: Arc::new(TracingSink),
            abort: AbortSignal::never(),
        }
    }
}

impl SessionOptions {
    /// Routes malformed-frame warnings to the given sink instead of the log.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Makes the session cancellable through the matching [`AbortHandle`].
    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = signal;
        self
    }
}

enum Step {
    Aborted,
    Next(Option<Result<Frame, ChatError>>),
}

/// One streaming request/response exchange.
///
/// Owns the frame buffer and the accumulated text for its whole lifetime.
/// Nothing is shared with other sessions.
pub struct StreamSession {
    id: uuid::Uuid,
    state: SessionState,
    accumulator: Accumulator,
    diagnostics: Arc<dyn DiagnosticSink>,
    abort: AbortSignal,
    frames: u64,
    dropped_frames: u64,
}

impl StreamSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            state: SessionState::Init,
            accumulator: Accumulator::new(),
            diagnostics: options.diagnostics,
            abort: options.abort,
            frames: 0,
            dropped_frames: 0,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        self.accumulator.text()
    }

    pub(crate) fn begin_send(&mut self) {
        self.state = SessionState::Sending;
    }

    pub(crate) async fn cancelled(&mut self) {
        self.abort.cancelled().await;
    }

    pub(crate) fn fail(&mut self, err: ChatError) -> ChatError {
        debug!(session_id = %self.id, error = %err, "session failed");
        self.state = SessionState::Failed;
        err
    }

    /// Reads the response body to the end, calling `on_update` with the full
    /// text after every non-empty delta.
    ///
    /// Stops at the `[DONE]` sentinel without reading further, or succeeds
    /// with the text so far when the body ends without one. A read error or
    /// an abort fails the session.
    pub async fn consume<F>(
        &mut self,
        body: ByteStream,
        mut on_update: F,
    ) -> Result<StreamReply, ChatError>
    where
        F: FnMut(&str),
    {
        if self.state.is_terminal() {
            return Err(ChatError::invalid(format!(
                "session {} already finished ({:?})",
                self.id, self.state
            )));
        }
        self.state = SessionState::Reading;

        let mut frames = std::pin::pin!(frame_stream(body));
        loop {
            let step = tokio::select! {
                biased;
                _ = self.abort.cancelled() => Step::Aborted,
                next = frames.next() => Step::Next(next),
            };

            let frame = match step {
                Step::Aborted => return Err(self.fail(ChatError::Cancelled)),
                Step::Next(None) => return Ok(self.finish(SessionState::Closed)),
                Step::Next(Some(Err(err))) => return Err(self.fail(err)),
                Step::Next(Some(Ok(frame))) => frame,
            };
            self.frames += 1;

            match parse_frame(&frame) {
                Ok(FrameEvent::Complete) => return Ok(self.finish(SessionState::Complete)),
                Ok(FrameEvent::Delta(delta)) => {
                    self.state = SessionState::Emitting;
                    if let Some(text) = self.accumulator.push(&delta) {
                        on_update(text);
                    }
                    self.state = SessionState::Reading;
                }
                Ok(FrameEvent::Ignored) => {}
                Err(warning) => {
                    self.dropped_frames += 1;
                    self.diagnostics.malformed_frame(&warning);
                }
            }
        }
    }

    fn finish(&mut self, state: SessionState) -> StreamReply {
        self.state = state;
        let termination = match state {
            SessionState::Complete => Termination::Sentinel,
            _ => Termination::EndOfStream,
        };
        debug!(
            session_id = %self.id,
            ?termination,
            frames = self.frames,
            deltas = self.accumulator.delta_count(),
            dropped = self.dropped_frames,
            "session finished"
        );
        StreamReply {
            text: self.accumulator.text().to_owned(),
            termination,
            frames: self.frames,
            dropped_frames: self.dropped_frames,
        }
    }
}
