use thiserror::Error;

/// EIP-1193 "user rejected request" error code.
pub const CODE_USER_REJECTED_REQUEST: i64 = 4001;
/// Provider error code for `wallet_switchEthereumChain` on a chain the
/// wallet has never seen; the add-chain flow is the only recovery.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no injected provider available: {0}")]
    Unavailable(String),
    #[error("user rejected the provider request")]
    UserRejected,
    #[error("provider does not recognize the requested chain")]
    UnrecognizedChain,
    #[error("provider rpc failure: {0}")]
    Rpc(String),
}

impl ProviderError {
    pub fn from_rpc_code(code: i64, message: &str) -> Self {
        match code {
            CODE_USER_REJECTED_REQUEST => ProviderError::UserRejected,
            CODE_UNRECOGNIZED_CHAIN => ProviderError::UnrecognizedChain,
            _ => ProviderError::Rpc(format!("code {code}: {message}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("insufficient funds to cover price and gas")]
    InsufficientFunds,
    #[error("user rejected the signature prompt")]
    UserRejected,
    #[error("contract reverted: {0}")]
    Reverted(String),
    #[error("rpc failure during submission: {0}")]
    Rpc(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationError {
    #[error("transaction dropped before confirmation")]
    Dropped,
    #[error("transaction reverted on-chain: {0}")]
    Reverted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("no injected provider available: {0}")]
    ProviderUnavailable(String),
    #[error("user rejected the request")]
    UserRejected,
    #[error("required network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("user rejected switching to the required network")]
    UserRejectedSwitch,
    #[error("user rejected adding the required network")]
    UserRejectedAdd,
    #[error("provider is on chain {actual} but chain {expected} is required")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error("wallet is not connected")]
    NotConnected,
    #[error("insufficient funds to cover price and gas")]
    InsufficientFunds,
    #[error("contract reverted: {0}")]
    ContractReverted(String),
    #[error("transaction dropped before confirmation")]
    TransactionDropped,
    #[error("rpc failure: {0}")]
    Rpc(String),
    #[error("a purchase for item {0} is already in flight")]
    DuplicateInFlight(String),
    #[error("release without a matching acquire on the busy signal")]
    BusyUnderflow,
    #[error("clock failure: {0}")]
    Clock(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid amount {raw:?}: {reason}")]
    InvalidAmount { raw: String, reason: String },
    #[error("invalid item id {0:?}: expected a decimal token id")]
    InvalidItemId(String),
    #[error("illegal {kind} transition: {from} + {action}")]
    IllegalTransition {
        kind: &'static str,
        from: &'static str,
        action: &'static str,
    },
}

impl CheckoutError {
    /// True for outcomes the user caused on purpose; these render as a
    /// neutral "you cancelled" rather than a failure.
    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            CheckoutError::UserRejected
                | CheckoutError::UserRejectedSwitch
                | CheckoutError::UserRejectedAdd
        )
    }
}

impl From<ProviderError> for CheckoutError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(reason) => CheckoutError::ProviderUnavailable(reason),
            ProviderError::UserRejected => CheckoutError::UserRejected,
            ProviderError::UnrecognizedChain => {
                CheckoutError::NetworkUnavailable("provider does not recognize the chain".to_owned())
            }
            ProviderError::Rpc(message) => CheckoutError::Rpc(message),
        }
    }
}

impl From<ContractError> for CheckoutError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::InsufficientFunds => CheckoutError::InsufficientFunds,
            ContractError::UserRejected => CheckoutError::UserRejected,
            ContractError::Reverted(reason) => CheckoutError::ContractReverted(reason),
            ContractError::Rpc(message) => CheckoutError::Rpc(message),
        }
    }
}

impl From<ConfirmationError> for CheckoutError {
    fn from(err: ConfirmationError) -> Self {
        match err {
            ConfirmationError::Dropped => CheckoutError::TransactionDropped,
            ConfirmationError::Reverted(reason) => CheckoutError::ContractReverted(reason),
        }
    }
}
