pub mod clock;
pub mod config;
pub mod contract;
pub mod eip1193;
pub mod rpc;

pub use clock::SystemClockAdapter;
pub use config::{CheckoutConfig, DEV_CONTRACT_ADDRESS};
pub use contract::NftContractAdapter;
pub use eip1193::{
    Eip1193Adapter, ScriptedOutcome, METHOD_ADD_CHAIN, METHOD_CHAIN_ID, METHOD_REQUEST_ACCOUNTS,
    METHOD_SWITCH_CHAIN,
};
pub use rpc::{JsonRpcClient, RpcFailure};
