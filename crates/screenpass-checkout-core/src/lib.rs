pub mod domain;
pub mod errors;
pub mod loading;
pub mod network;
pub mod orchestrator;
pub mod ports;
pub mod session;
pub mod state_machine;

pub use domain::{
    parse_native_amount, parse_token_id, ChainDescriptor, NativeCurrency, PurchaseOutcome,
    PurchaseRequest, Receipt, TimestampMs, TransactionHandle,
};
pub use errors::{
    CheckoutError, ConfirmationError, ContractError, ProviderError, CODE_UNRECOGNIZED_CHAIN,
    CODE_USER_REJECTED_REQUEST,
};
pub use loading::{BusyGuard, BusyToken, LoadingCoordinator};
pub use network::{negotiation_transition, NegotiationStep, NetworkGuard, StepOutcome};
pub use orchestrator::{CheckoutOrchestrator, InFlightRegistry};
pub use ports::{ClockPort, ContractPort, ProviderEvent, ProviderEventKind, ProviderPort};
pub use session::{ConnectionSession, ConnectionState};
pub use state_machine::{purchase_transition, PurchaseAction, PurchasePhase, StateTransition};
