//! Deployment configuration: the one required chain, the deployed contract
//! address, and transport knobs. Validated once at startup so a malformed
//! deployment fails before any connect attempt is possible.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use screenpass_checkout_core::{ChainDescriptor, CheckoutError};

use crate::rpc;

/// First address Hardhat deploys to on a fresh chain; the development
/// default for the MovieNFT contract.
pub const DEV_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub required_chain: ChainDescriptor,
    pub contract_address: Address,
    /// JSON-RPC endpoint of the EIP-1193 bridge. `None` selects the
    /// deterministic in-memory provider (tests, local development).
    pub provider_bridge_url: Option<String>,
    pub rpc_timeout_ms: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_timeout_ms: u64,
    /// Production profile: refuse to fall back to deterministic adapters.
    pub strict_runtime: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            required_chain: ChainDescriptor::sepolia(),
            contract_address: DEV_CONTRACT_ADDRESS
                .parse()
                .expect("built-in contract address is valid"),
            provider_bridge_url: None,
            rpc_timeout_ms: 15_000,
            confirmation_poll_interval_ms: 4_000,
            confirmation_timeout_ms: 180_000,
            strict_runtime: false,
        }
    }
}

impl CheckoutConfig {
    /// Builds the configuration from `SCREENPASS_*` environment variables
    /// on top of the Sepolia defaults, then validates it.
    pub fn from_env() -> Result<Self, CheckoutError> {
        let config = Self::read_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses the environment without validating, for callers that still
    /// overlay command-line flags before the single startup validation.
    pub fn read_env() -> Result<Self, CheckoutError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("SCREENPASS_CHAIN_ID") {
            config.required_chain.chain_id = rpc::parse_quantity_str(&raw)
                .map_err(|e| CheckoutError::Config(format!("SCREENPASS_CHAIN_ID: {e}")))?;
        }
        if let Ok(name) = std::env::var("SCREENPASS_CHAIN_NAME") {
            config.required_chain.display_name = name;
        }
        if let Ok(url) = std::env::var("SCREENPASS_RPC_URL") {
            config.required_chain.rpc_endpoints = vec![url];
        }
        if let Ok(symbol) = std::env::var("SCREENPASS_CURRENCY_SYMBOL") {
            config.required_chain.native_currency.symbol = symbol;
        }
        if let Ok(url) = std::env::var("SCREENPASS_EXPLORER_URL") {
            config.required_chain.block_explorer_url = Some(url);
        }
        if let Ok(raw) = std::env::var("SCREENPASS_CONTRACT_ADDRESS") {
            config.contract_address = raw
                .parse()
                .map_err(|e| CheckoutError::Config(format!("SCREENPASS_CONTRACT_ADDRESS: {e}")))?;
        }
        if let Ok(url) = std::env::var("SCREENPASS_PROVIDER_BRIDGE_URL") {
            config.provider_bridge_url = Some(url);
        }
        if let Ok(raw) = std::env::var("SCREENPASS_RPC_TIMEOUT_MS") {
            config.rpc_timeout_ms = parse_ms("SCREENPASS_RPC_TIMEOUT_MS", &raw)?;
        }
        if let Ok(raw) = std::env::var("SCREENPASS_CONFIRMATION_POLL_INTERVAL_MS") {
            config.confirmation_poll_interval_ms =
                parse_ms("SCREENPASS_CONFIRMATION_POLL_INTERVAL_MS", &raw)?;
        }
        if let Ok(raw) = std::env::var("SCREENPASS_CONFIRMATION_TIMEOUT_MS") {
            config.confirmation_timeout_ms = parse_ms("SCREENPASS_CONFIRMATION_TIMEOUT_MS", &raw)?;
        }
        config.strict_runtime = matches!(
            std::env::var("SCREENPASS_RUNTIME_PROFILE").as_deref(),
            Ok("production")
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CheckoutError> {
        self.required_chain.validate()?;
        if self.contract_address == Address::ZERO {
            return Err(CheckoutError::Config(
                "contract address must not be the zero address".to_owned(),
            ));
        }
        if let Some(url) = &self.provider_bridge_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CheckoutError::Config(format!(
                    "invalid provider bridge url: {url}"
                )));
            }
        }
        if self.strict_runtime && self.provider_bridge_url.is_none() {
            return Err(CheckoutError::Config(
                "production profile requires a provider bridge url".to_owned(),
            ));
        }
        if self.rpc_timeout_ms == 0 || self.confirmation_poll_interval_ms == 0 {
            return Err(CheckoutError::Config("timeouts must be non-zero".to_owned()));
        }
        if self.confirmation_timeout_ms < self.confirmation_poll_interval_ms {
            return Err(CheckoutError::Config(
                "confirmation window shorter than one poll interval".to_owned(),
            ));
        }
        Ok(())
    }
}

fn parse_ms(var: &str, raw: &str) -> Result<u64, CheckoutError> {
    raw.parse()
        .map_err(|e| CheckoutError::Config(format!("{var}: {e}")))
}
