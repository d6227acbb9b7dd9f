//! Tab-lifetime connection state, the single source of truth for all UI.
//!
//! The session always tracks the last observed account and chain (fed by
//! provider events) alongside a `granted` flag set by a successful connect
//! handshake. While granted, the visible state is re-derived on every
//! event, so it can never silently stay Connected against a stale account
//! or chain.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;

use crate::ports::{ProviderEvent, ProviderEventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { account: Address, chain_id: u64 },
    Failed { reason: String },
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected { .. } => "Connected",
            ConnectionState::Failed { .. } => "Failed",
        }
    }
}

type Observer = Box<dyn Fn(&ConnectionState) + Send>;

#[derive(Debug)]
struct SessionInner {
    required_chain: u64,
    state: ConnectionState,
    observed_account: Option<Address>,
    observed_chain: Option<u64>,
    granted: bool,
    revision: u64,
}

#[derive(Clone)]
pub struct ConnectionSession {
    inner: Arc<Mutex<SessionInner>>,
    observers: Arc<Mutex<Vec<Observer>>>,
}

impl ConnectionSession {
    pub fn new(required_chain: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                required_chain,
                state: ConnectionState::Disconnected,
                observed_account: None,
                observed_chain: None,
                granted: false,
                revision: 0,
            })),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // State is always left consistent before any panic could unwind, so a
    // poisoned lock carries nothing worth discarding.
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state.clone()
    }

    /// Monotonic counter bumped on every visible transition; cheap to poll
    /// from immediate-mode renderers.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn required_chain(&self) -> u64 {
        self.lock().required_chain
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lock().state, ConnectionState::Connected { .. })
    }

    /// The account a purchase may be billed to. `None` unless Connected.
    pub fn current_account(&self) -> Option<Address> {
        match self.lock().state {
            ConnectionState::Connected { account, .. } => Some(account),
            _ => None,
        }
    }

    /// Registers a change listener fired on every visible transition, so
    /// dependent surfaces re-render without polling.
    pub fn subscribe(&self, observer: impl Fn(&ConnectionState) + Send + 'static) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Begins a connect handshake. Idempotent: while Connecting or
    /// Connected this is a no-op returning the current state. A fresh
    /// handshake revokes any earlier grant until it completes, so events
    /// arriving mid-handshake cannot flip the visible state around it.
    pub fn begin_connect(&self) -> ConnectionState {
        let next = {
            let mut g = self.lock();
            match g.state {
                ConnectionState::Connecting | ConnectionState::Connected { .. } => {
                    return g.state.clone()
                }
                _ => {}
            }
            g.granted = false;
            Self::set_state(&mut g, ConnectionState::Connecting)
        };
        self.notify(next.as_ref());
        self.state()
    }

    /// Records a completed handshake. The visible state is still derived
    /// from the observed account/chain, so a handshake that raced a
    /// chain-changed event lands Disconnected rather than lying.
    pub fn mark_connected(&self, account: Address, chain_id: u64) {
        let next = {
            let mut g = self.lock();
            g.granted = true;
            g.observed_account = Some(account);
            g.observed_chain = Some(chain_id);
            Self::rederive(&mut g)
        };
        self.notify(next.as_ref());
    }

    pub fn fail_connect(&self, reason: String) {
        let next = {
            let mut g = self.lock();
            g.granted = false;
            Self::set_state(&mut g, ConnectionState::Failed { reason })
        };
        self.notify(next.as_ref());
    }

    /// Folds one provider notification into the session. These are
    /// authoritative: the user may have acted outside the app.
    pub fn apply_event(&self, event: &ProviderEvent) {
        let next = {
            let mut g = self.lock();
            match &event.kind {
                ProviderEventKind::AccountsChanged(accounts) => {
                    g.observed_account = accounts.first().copied();
                }
                ProviderEventKind::ChainChanged(chain_id) => {
                    g.observed_chain = Some(*chain_id);
                }
            }
            if g.granted {
                Self::rederive(&mut g)
            } else {
                None
            }
        };
        self.notify(next.as_ref());
    }

    fn rederive(g: &mut MutexGuard<'_, SessionInner>) -> Option<ConnectionState> {
        let state = match (g.observed_account, g.observed_chain) {
            (Some(account), Some(chain_id)) if chain_id == g.required_chain => {
                ConnectionState::Connected { account, chain_id }
            }
            _ => ConnectionState::Disconnected,
        };
        Self::set_state(g, state)
    }

    fn set_state(
        g: &mut MutexGuard<'_, SessionInner>,
        state: ConnectionState,
    ) -> Option<ConnectionState> {
        if g.state == state {
            return None;
        }
        tracing::debug!(from = g.state.name(), to = state.name(), "session transition");
        g.state = state.clone();
        g.revision = g.revision.saturating_add(1);
        Some(state)
    }

    fn notify(&self, state: Option<&ConnectionState>) {
        let Some(state) = state else { return };
        // Observers run outside the inner lock; re-entrant reads are fine.
        let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(state);
        }
    }
}
