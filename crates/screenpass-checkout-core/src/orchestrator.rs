//! Drives wallet connection and single purchase attempts end-to-end over
//! the provider and contract ports, keeping session, busy signal, and the
//! in-flight registry consistent on every exit path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::U256;

use crate::domain::{
    parse_native_amount, parse_token_id, ChainDescriptor, PurchaseOutcome, PurchaseRequest,
};
use crate::errors::{CheckoutError, ContractError};
use crate::loading::LoadingCoordinator;
use crate::network::NetworkGuard;
use crate::ports::{ClockPort, ContractPort, ProviderPort};
use crate::session::{ConnectionSession, ConnectionState};
use crate::state_machine::{purchase_transition, PurchaseAction, PurchasePhase};

/// Item ids with a purchase attempt in a non-terminal phase. Shared with
/// UI consumers that need "is a purchase in flight?" without owning state.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    items: Arc<Mutex<HashMap<String, PurchasePhase>>>,
}

impl InFlightRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, PurchasePhase>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self, item_id: &str) -> bool {
        self.lock().contains_key(item_id)
    }

    pub fn active_items(&self) -> Vec<(String, PurchasePhase)> {
        let mut items: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, phase)| (id.clone(), *phase))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items
    }

    /// Claims an item for one purchase attempt, or fails with
    /// `DuplicateInFlight` before anything touches the network. Same-item
    /// requests are rejected, never queued.
    fn claim(&self, item_id: &str) -> Result<ActivePurchase, CheckoutError> {
        let (phase, _) = purchase_transition(PurchasePhase::Idle, PurchaseAction::StartPreflight)?;
        {
            let mut g = self.lock();
            if g.contains_key(item_id) {
                return Err(CheckoutError::DuplicateInFlight(item_id.to_owned()));
            }
            g.insert(item_id.to_owned(), phase);
        }
        Ok(ActivePurchase {
            registry: self.clone(),
            item_id: item_id.to_owned(),
            phase,
        })
    }

    fn set_phase(&self, item_id: &str, phase: PurchasePhase) {
        self.lock().insert(item_id.to_owned(), phase);
    }

    fn clear(&self, item_id: &str) {
        self.lock().remove(item_id);
    }
}

/// RAII claim on one item id. Dropping it removes the item from the
/// registry regardless of which exit path was taken.
struct ActivePurchase {
    registry: InFlightRegistry,
    item_id: String,
    phase: PurchasePhase,
}

impl ActivePurchase {
    fn advance(&mut self, action: PurchaseAction) -> Result<(), CheckoutError> {
        let (next, transition) = purchase_transition(self.phase, action)?;
        tracing::debug!(
            item = %self.item_id,
            from = transition.from,
            to = transition.to,
            reason = transition.reason,
            "purchase transition"
        );
        self.phase = next;
        self.registry.set_phase(&self.item_id, next);
        Ok(())
    }
}

impl Drop for ActivePurchase {
    fn drop(&mut self) {
        self.registry.clear(&self.item_id);
    }
}

pub struct CheckoutOrchestrator<P, C, K>
where
    P: ProviderPort,
    C: ContractPort,
    K: ClockPort,
{
    pub provider: P,
    pub contract: C,
    pub clock: K,
    pub session: ConnectionSession,
    pub network: NetworkGuard,
    pub loading: LoadingCoordinator,
    pub in_flight: InFlightRegistry,
}

impl<P, C, K> CheckoutOrchestrator<P, C, K>
where
    P: ProviderPort,
    C: ContractPort,
    K: ClockPort,
{
    pub fn new(provider: P, contract: C, clock: K, required_chain: ChainDescriptor) -> Self {
        let session = ConnectionSession::new(required_chain.chain_id);
        let network = NetworkGuard::new(required_chain);
        Self {
            provider,
            contract,
            clock,
            session,
            network,
            loading: LoadingCoordinator::new(),
            in_flight: InFlightRegistry::default(),
        }
    }

    /// Folds provider notifications into the session. Called on entry to
    /// every operation and again after each port call that may have
    /// suspended: listener callbacks are authoritative and pre-suspension
    /// state is never trusted.
    pub fn pump_provider_events(&self) -> Result<(), CheckoutError> {
        for event in self.provider.drain_events()? {
            self.session.apply_event(&event);
        }
        Ok(())
    }

    /// Establishes the wallet connection: account grant, then chain
    /// negotiation. Idempotent while Connecting or Connected: queued
    /// provider events are still folded in, but no new provider request
    /// is issued.
    pub fn connect_wallet(&self) -> Result<ConnectionState, CheckoutError> {
        if matches!(
            self.session.state(),
            ConnectionState::Connecting | ConnectionState::Connected { .. }
        ) {
            self.pump_provider_events()?;
            let refreshed = self.session.state();
            if matches!(
                refreshed,
                ConnectionState::Connecting | ConnectionState::Connected { .. }
            ) {
                return Ok(refreshed);
            }
            // An event disconnected us while idle; fall through to a
            // fresh handshake.
        }

        let _busy = self.loading.acquire_scoped();
        self.session.begin_connect();
        match self.connect_inner() {
            Ok(state) => {
                tracing::info!(state = state.name(), "wallet connected");
                Ok(state)
            }
            Err(error) => {
                if error.is_user_rejection() {
                    tracing::debug!(%error, "wallet connect cancelled by user");
                } else {
                    tracing::warn!(%error, "wallet connect failed");
                }
                self.session.fail_connect(error.to_string());
                Err(error)
            }
        }
    }

    fn connect_inner(&self) -> Result<ConnectionState, CheckoutError> {
        if !self.provider.is_available() {
            return Err(CheckoutError::ProviderUnavailable(
                "no injected provider detected".to_owned(),
            ));
        }
        self.pump_provider_events()?;
        let accounts = self.provider.request_accounts()?;
        let account = accounts.first().copied().ok_or_else(|| {
            CheckoutError::ProviderUnavailable("provider returned no accounts".to_owned())
        })?;

        self.network.ensure_chain(&self.provider)?;

        // Both prompts above were suspension points; fold anything the
        // provider emitted meanwhile before declaring the handshake done.
        self.pump_provider_events()?;
        let chain_id = self.provider.chain_id()?;
        self.session.mark_connected(account, chain_id);
        if self.session.is_ready() {
            Ok(self.session.state())
        } else {
            Err(CheckoutError::ChainMismatch {
                expected: self.session.required_chain(),
                actual: chain_id,
            })
        }
    }

    /// Drives one purchase attempt to a terminal outcome.
    ///
    /// `Err` means nothing was submitted (preflight or negotiation failed;
    /// retrying from scratch is safe). `Ok` carries the terminal outcome of
    /// a submission attempt: `Rejected` when the user declined the
    /// signature prompt, `Failed` for infrastructure errors, `Confirmed`
    /// on receipt.
    pub fn purchase(
        &self,
        item_id: &str,
        price_native: &str,
    ) -> Result<PurchaseOutcome, CheckoutError> {
        let token_id = parse_token_id(item_id)?;
        let decimals = self.network.required().native_currency.decimals;
        let price_wei = parse_native_amount(price_native, decimals)?;

        self.pump_provider_events()?;
        let buyer = self
            .session
            .current_account()
            .ok_or(CheckoutError::NotConnected)?;
        let request = PurchaseRequest {
            item_id: item_id.to_owned(),
            price_native: price_native.to_owned(),
            buyer,
        };

        // Uniqueness is checked before any network traffic; the duplicate
        // path must not cost a single provider round trip.
        let mut active = self.in_flight.claim(item_id)?;
        let _busy = self.loading.acquire_scoped();
        self.drive(&mut active, &request, token_id, price_wei)
    }

    fn drive(
        &self,
        active: &mut ActivePurchase,
        request: &PurchaseRequest,
        token_id: U256,
        price_wei: U256,
    ) -> Result<PurchaseOutcome, CheckoutError> {
        // Time has passed since connect; the chain guarantee is re-run, and
        // the prompt it may raise is itself a suspension point.
        self.network.ensure_chain(&self.provider)?;
        self.pump_provider_events()?;
        if !self.session.is_ready() {
            return Err(CheckoutError::NotConnected);
        }
        active.advance(PurchaseAction::PreflightPassed)?;

        let submitted_at = self.clock.now_ms().ok();
        let handle = match self
            .contract
            .estimate_and_submit_purchase(token_id, price_wei, request.buyer)
        {
            Ok(handle) => handle,
            Err(ContractError::UserRejected) => {
                active.advance(PurchaseAction::UserDeclined)?;
                // Expected and frequent; not an error worth shouting about.
                tracing::debug!(item = %request.item_id, "signature prompt declined");
                return Ok(PurchaseOutcome::Rejected {
                    reason: "signature prompt declined".to_owned(),
                });
            }
            Err(error) => {
                active.advance(PurchaseAction::Errored)?;
                let error = CheckoutError::from(error);
                tracing::warn!(item = %request.item_id, %error, "purchase submission failed");
                return Ok(PurchaseOutcome::Failed { error });
            }
        };
        active.advance(PurchaseAction::Submitted)?;
        tracing::info!(item = %request.item_id, tx = %handle.tx_hash, "purchase submitted");

        // Submission is the point of no return: the transaction resolves
        // on-chain whether or not anyone is still listening, and it is
        // never reissued for this request.
        match self.contract.await_confirmation(&handle) {
            Ok(receipt) => {
                active.advance(PurchaseAction::ConfirmationReceived)?;
                self.pump_provider_events()?;
                if let (Some(start), Ok(end)) = (submitted_at, self.clock.now_ms()) {
                    tracing::info!(
                        tx = %receipt.tx_hash,
                        block = receipt.block_number,
                        elapsed_ms = end.saturating_sub(start),
                        "purchase confirmed"
                    );
                }
                Ok(PurchaseOutcome::Confirmed(receipt))
            }
            Err(error) => {
                active.advance(PurchaseAction::Errored)?;
                let error = CheckoutError::from(error);
                tracing::warn!(tx = %handle.tx_hash, %error, "confirmation failed");
                Ok(PurchaseOutcome::Failed { error })
            }
        }
    }

    pub fn active_purchases(&self) -> Vec<(String, PurchasePhase)> {
        self.in_flight.active_items()
    }
}
