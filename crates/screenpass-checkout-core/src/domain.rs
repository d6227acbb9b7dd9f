use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::CheckoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Static description of one supported network. Exactly one descriptor is
/// "required" per deployment; everything value-bearing is gated on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub display_name: String,
    pub rpc_endpoints: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_url: Option<String>,
}

impl ChainDescriptor {
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11_155_111,
            display_name: "Sepolia".to_owned(),
            rpc_endpoints: vec!["https://rpc.sepolia.org".to_owned()],
            native_currency: NativeCurrency {
                name: "Sepolia Ether".to_owned(),
                symbol: "ETH".to_owned(),
                decimals: 18,
            },
            block_explorer_url: Some("https://sepolia.etherscan.io".to_owned()),
        }
    }

    /// The hex-encoded chain id as wallets expect it, e.g. `0xaa36a7`.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// The parameter object for `wallet_addEthereumChain`, in the camelCase
    /// wire shape injected providers require.
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.display_name,
            "rpcUrls": self.rpc_endpoints,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "blockExplorerUrls": self
                .block_explorer_url
                .as_ref()
                .map(|url| vec![url.clone()])
                .unwrap_or_default(),
        })
    }

    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.chain_id == 0 {
            return Err(CheckoutError::Config("chain id must be non-zero".to_owned()));
        }
        if self.display_name.trim().is_empty() {
            return Err(CheckoutError::Config("chain display name is empty".to_owned()));
        }
        if self.rpc_endpoints.is_empty() {
            return Err(CheckoutError::Config(
                "at least one rpc endpoint is required".to_owned(),
            ));
        }
        for url in &self.rpc_endpoints {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CheckoutError::Config(format!("invalid rpc endpoint: {url}")));
            }
        }
        // Injected providers reject add-chain requests with symbols outside 2-6 chars.
        let symbol = &self.native_currency.symbol;
        if symbol.len() < 2 || symbol.len() > 6 || !symbol.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(CheckoutError::Config(format!(
                "invalid native currency symbol: {symbol:?}"
            )));
        }
        if self.native_currency.decimals != 18 {
            return Err(CheckoutError::Config(
                "native currency decimals must be 18".to_owned(),
            ));
        }
        if let Some(url) = &self.block_explorer_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CheckoutError::Config(format!("invalid explorer url: {url}")));
            }
        }
        Ok(())
    }
}

/// One user-initiated purchase. Immutable once built; the price stays an
/// exact decimal string until it is converted to wei with integer math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub item_id: String,
    pub price_native: String,
    pub buyer: Address,
}

impl PurchaseRequest {
    /// The on-chain token id backing this item.
    pub fn token_id(&self) -> Result<U256, CheckoutError> {
        parse_token_id(&self.item_id)
    }
}

pub fn parse_token_id(item_id: &str) -> Result<U256, CheckoutError> {
    if item_id.is_empty() || !item_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CheckoutError::InvalidItemId(item_id.to_owned()));
    }
    U256::from_str_radix(item_id, 10)
        .map_err(|_| CheckoutError::InvalidItemId(item_id.to_owned()))
}

/// Converts an exact decimal amount of native currency ("0.0001") to its
/// smallest-unit integer representation. Floating point is never involved;
/// amounts with more fractional digits than the currency carries are
/// rejected rather than rounded.
pub fn parse_native_amount(raw: &str, decimals: u8) -> Result<U256, CheckoutError> {
    let invalid = |reason: &str| CheckoutError::InvalidAmount {
        raw: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty amount"));
    }
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid("expected only decimal digits and at most one point"));
    }
    if frac_part.len() > decimals as usize {
        return Err(invalid("more fractional digits than the currency carries"));
    }

    let ten = U256::from(10u64);
    let int_value = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).map_err(|_| invalid("integer part out of range"))?
    };
    let frac_value = if frac_part.is_empty() {
        U256::ZERO
    } else {
        let digits =
            U256::from_str_radix(frac_part, 10).map_err(|_| invalid("fraction out of range"))?;
        digits * ten.pow(U256::from((decimals as usize - frac_part.len()) as u64))
    };

    int_value
        .checked_mul(ten.pow(U256::from(decimals as u64)))
        .and_then(|scaled| scaled.checked_add(frac_value))
        .ok_or_else(|| invalid("amount overflows 256 bits"))
}

/// Proof that a transaction left the provider. A handle is never reused:
/// resubmitting creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub tx_hash: B256,
    pub submitted_at: TimestampMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub status: bool,
}

/// Terminal result of one purchase attempt, reported exactly once.
/// `Rejected` is the user changing their mind; `Failed` is infrastructure.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    Confirmed(Receipt),
    Rejected { reason: String },
    Failed { error: CheckoutError },
}

impl PurchaseOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PurchaseOutcome::Confirmed(_))
    }
}
