//! Process-wide busy signal with reference-counting semantics. Several
//! independent surfaces (navbar spinner, buy button, modal) read one
//! signal even when wallet connect and a purchase overlap; a bare boolean
//! would flicker when one operation finishes while another is running.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::CheckoutError;

#[derive(Debug, Default)]
struct BusyLedger {
    next_token: u64,
    outstanding: HashSet<u64>,
}

/// Witness of one acquisition. Deliberately not `Clone`: a token can be
/// presented for release, but never duplicated.
#[derive(Debug, PartialEq, Eq)]
pub struct BusyToken {
    id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LoadingCoordinator {
    ledger: Arc<Mutex<BusyLedger>>,
}

impl LoadingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusyLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self) -> BusyToken {
        let mut g = self.lock();
        g.next_token = g.next_token.wrapping_add(1);
        let id = g.next_token;
        g.outstanding.insert(id);
        BusyToken { id }
    }

    /// Releases one acquisition. Fails with `BusyUnderflow` when the token
    /// was already released; the count never goes negative and is never
    /// silently clamped.
    pub fn release(&self, token: &BusyToken) -> Result<(), CheckoutError> {
        if self.lock().outstanding.remove(&token.id) {
            Ok(())
        } else {
            Err(CheckoutError::BusyUnderflow)
        }
    }

    /// Scoped form used by the orchestrator: the guard releases on drop,
    /// on every exit path.
    pub fn acquire_scoped(&self) -> BusyGuard {
        BusyGuard {
            coordinator: self.clone(),
            token: Some(self.acquire()),
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.lock().outstanding.is_empty()
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding.len()
    }
}

pub struct BusyGuard {
    coordinator: LoadingCoordinator,
    token: Option<BusyToken>,
}

impl BusyGuard {
    pub fn release(mut self) -> Result<(), CheckoutError> {
        match self.token.take() {
            Some(token) => self.coordinator.release(&token),
            None => Err(CheckoutError::BusyUnderflow),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            // A live token held by this guard cannot underflow.
            let _ = self.coordinator.release(&token);
        }
    }
}
