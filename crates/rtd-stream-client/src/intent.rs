/*
[INPUT]:  Operator commands from the input thread
[OUTPUT]: Lock-protected intent record read by the dispatch loop
[POS]:    Coordination layer - the only state shared between input and dispatch
[UPDATE]: When adding new operator intents
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rtd_stream_adapter::Symbol;

/// Operator intent as last recorded by the input thread.
///
/// `reconnect_requested` is only true while `pending_symbol` holds a non-empty
/// symbol that has not yet been acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentState {
    pub pending_symbol: Symbol,
    pub reconnect_requested: bool,
    pub pause_requested: bool,
    pub exit_requested: bool,
}

/// Cloneable handle to the shared intent record.
#[derive(Debug, Clone, Default)]
pub struct SharedIntent {
    inner: Arc<Mutex<IntentState>>,
}

impl SharedIntent {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IntentState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new symbol and resume. Empty symbols are ignored.
    pub fn request_symbol(&self, symbol: Symbol) -> bool {
        if symbol.is_empty() {
            return false;
        }
        let mut state = self.lock();
        state.pending_symbol = symbol;
        state.reconnect_requested = true;
        state.pause_requested = false;
        true
    }

    pub fn request_pause(&self) {
        self.lock().pause_requested = true;
    }

    pub fn request_exit(&self) {
        self.lock().exit_requested = true;
    }

    /// Read-and-clear the reconnect request.
    ///
    /// The flag is cleared whether or not a symbol is returned.
    pub fn take_reconnect(&self) -> Option<Symbol> {
        let mut state = self.lock();
        if !state.reconnect_requested {
            return None;
        }
        state.reconnect_requested = false;
        (!state.pending_symbol.is_empty()).then(|| state.pending_symbol.clone())
    }

    pub fn is_paused(&self) -> bool {
        self.lock().pause_requested
    }

    pub fn exit_requested(&self) -> bool {
        self.lock().exit_requested
    }

    pub fn snapshot(&self) -> IntentState {
        self.lock().clone()
    }
}
