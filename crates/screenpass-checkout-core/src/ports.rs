use alloy::primitives::{Address, U256};

use crate::domain::{ChainDescriptor, Receipt, TransactionHandle};
use crate::errors::{CheckoutError, ConfirmationError, ContractError, ProviderError};

/// A provider-initiated notification, observed between two port calls.
/// Events are the only source of asynchronous state changes: the user can
/// switch accounts or networks outside the app at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventKind {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// The injected signing provider (EIP-1193). Method names on the wire are
/// exactly `eth_requestAccounts`, `eth_chainId`, `wallet_switchEthereumChain`
/// and `wallet_addEthereumChain`; wallet software depends on them verbatim.
pub trait ProviderPort {
    fn is_available(&self) -> bool;
    fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    fn chain_id(&self) -> Result<u64, ProviderError>;
    fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;
    fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError>;
    /// Returns `accountsChanged`/`chainChanged` notifications accumulated
    /// since the last drain, in arrival order. Callers must fold these into
    /// session state before trusting anything observed earlier.
    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError>;
}

/// The deployed NFT contract, reduced to its call contract. ABI and
/// on-chain semantics live behind this boundary.
pub trait ContractPort {
    fn estimate_and_submit_purchase(
        &self,
        token_id: U256,
        price_wei: U256,
        buyer: Address,
    ) -> Result<TransactionHandle, ContractError>;

    /// Blocks until the submitted transaction is durably included or the
    /// confirmation window lapses. Unbounded in principle, block-time-scale
    /// in practice.
    fn await_confirmation(&self, handle: &TransactionHandle)
        -> Result<Receipt, ConfirmationError>;
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, CheckoutError>;
}
