use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::session::{AbortHandle, AbortSignal, SessionOptions};

#[derive(Default)]
struct GateState {
    next_id: u64,
    current: Option<(u64, AbortHandle)>,
}

/// Keeps at most one live session per conversation.
///
/// Every send starts with [`ConversationGate::begin`]; beginning a new send
/// aborts the previous one, so only the newest session delivers updates.
#[derive(Clone, Default)]
pub struct ConversationGate {
    state: Arc<Mutex<GateState>>,
}

impl ConversationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes the in-flight session, if any, and returns the ticket for
    /// the new one.
    pub fn begin(&self) -> SessionTicket {
        let handle = AbortHandle::new();
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        if let Some((previous, previous_handle)) = state.current.replace((id, handle.clone())) {
            debug!(previous, current = id, "superseding in-flight session");
            previous_handle.abort();
        }
        SessionTicket {
            id,
            handle,
            state: self.state.clone(),
        }
    }

    /// Aborts the in-flight session, if any.
    pub fn cancel(&self) {
        if let Some((_, handle)) = self.lock().current.take() {
            handle.abort();
        }
    }

    /// Id of the session currently allowed to deliver updates.
    pub fn current(&self) -> Option<u64> {
        self.lock().current.as_ref().map(|(id, _)| *id)
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Right to run one session of a conversation.
///
/// Dropping the ticket releases the slot if it is still the current one.
pub struct SessionTicket {
    id: u64,
    handle: AbortHandle,
    state: Arc<Mutex<GateState>>,
}

impl SessionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once a newer send or [`ConversationGate::cancel`] aborted this one.
    pub fn is_superseded(&self) -> bool {
        self.handle.is_aborted()
    }

    pub fn signal(&self) -> AbortSignal {
        self.handle.signal()
    }

    /// Default session options wired to this ticket's abort signal.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::default().abort_signal(self.signal())
    }
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(state.current, Some((id, _)) if id == self.id) {
            state.current = None;
        }
    }
}
