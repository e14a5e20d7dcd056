//! Initialization manager (C9): the phased startup state machine that
//! gates C5/C6/C7 until C4 and C8 are ready.
//!
//! Grounded in §9's redesign guidance ("explicit state inside the
//! initialization state machine" replacing ad-hoc booleans like
//! `notificationListenerInitialized`) and in the teacher's small,
//! exhaustively-matched enums (`src/proto.rs`'s `Protocol`, `src/either.rs`'s
//! `Either`) for the state representation itself.

use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Loading,
    LicenseInit,
    LicenseReady,
    AutoRestoreCheck,
    SessionLoad,
    Cleanup,
    Ready,
    Error,
}

impl InitState {
    /// The state immediately following this one on the happy path, or
    /// `None` for the two terminal states.
    fn next(self) -> Option<InitState> {
        match self {
            InitState::Loading => Some(InitState::LicenseInit),
            InitState::LicenseInit => Some(InitState::LicenseReady),
            InitState::LicenseReady => Some(InitState::AutoRestoreCheck),
            InitState::AutoRestoreCheck => Some(InitState::SessionLoad),
            InitState::SessionLoad => Some(InitState::Cleanup),
            InitState::Cleanup => Some(InitState::Ready),
            InitState::Ready | InitState::Error => None,
        }
    }

    pub fn is_ready(self) -> bool {
        matches!(self, InitState::Ready)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InitState::Ready | InitState::Error)
    }
}

/// Tracks the current phase and lets callers await READY. A single instance
/// is shared for the engine's lifetime; `advance`/`fail` are the only
/// mutators, so the state machine can never skip a phase out of order.
///
/// Startup is idempotent by construction: a concurrent `initialize()` call
/// observes the in-flight run through [`InitManager::wait_for_ready`]
/// rather than re-entering the phase sequence, and a call once READY is a
/// no-op (see [`InitManager::initialize`]).
pub struct InitManager {
    state: std::sync::Mutex<InitState>,
    notify: Notify,
}

impl Default for InitManager {
    fn default() -> Self {
        InitManager {
            state: std::sync::Mutex::new(InitState::Loading),
            notify: Notify::new(),
        }
    }
}

impl InitManager {
    pub fn new() -> Self {
        InitManager::default()
    }

    pub fn state(&self) -> InitState {
        *self.state.lock().unwrap()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Advances strictly to the next phase. Panics if called out of order
    /// (a programming error in the driver, never reachable from host input)
    /// or once the machine is already terminal.
    pub fn advance(&self, from: InitState) {
        let mut guard = self.state.lock().unwrap();
        assert_eq!(*guard, from, "init phase advanced out of order");
        match from.next() {
            Some(next) => *guard = next,
            None => panic!("cannot advance past a terminal init state"),
        }
        if guard.is_terminal() {
            drop(guard);
            self.notify.notify_waiters();
        }
    }

    /// Pins the machine at `Error`. The engine continues in read-only
    /// degraded mode afterward (spec.md §7 `StartupFailure`): existing
    /// bindings pass through, but C5/C6/C7 never mutate state again.
    pub fn fail(&self) {
        let mut guard = self.state.lock().unwrap();
        *guard = InitState::Error;
        drop(guard);
        self.notify.notify_waiters();
    }

    /// Blocks until the machine reaches a terminal state or `timeout`
    /// elapses. Returns the terminal state reached, or the current
    /// (necessarily non-terminal) state on timeout.
    pub async fn wait_for_ready(&self, timeout: Duration) -> InitState {
        if self.state().is_terminal() {
            return self.state();
        }
        let notified = self.notify.notified();
        tokio::select! {
            _ = notified => self.state(),
            _ = tokio::time::sleep(timeout) => self.state(),
        }
    }
}
