//! Minimal JSON-RPC 2.0 client shared by the provider bridge and the
//! contract gateway. Error responses keep their numeric code so callers
//! can map the EIP-1193 codes (4001, 4902) to typed failures.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcFailure {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("rpc error code {code}: {message}")]
    Response { code: i64, message: String },
}

#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl JsonRpcClient {
    pub fn new(base_url: String, timeout_ms: u64) -> Result<Self, RpcFailure> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| RpcFailure::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn call(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.base_url)
            .json(&payload)
            .send()
            .map_err(|e| RpcFailure::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| RpcFailure::Transport(format!("{method} json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(RpcFailure::Transport(format!(
                "{method} returned status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-32_000);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown rpc error")
                .to_owned();
            return Err(RpcFailure::Response { code, message });
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| RpcFailure::Transport(format!("{method} response missing result")))
    }
}

/// Decodes a JSON-RPC quantity, which arrives as a hex string on the wire
/// but may be a plain number from lenient test doubles.
pub fn quantity_to_u64(value: &Value) -> Result<u64, RpcFailure> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value.as_str().ok_or_else(|| {
        RpcFailure::Transport("quantity must be a hex string or number".to_owned())
    })?;
    parse_quantity_str(raw)
}

pub fn parse_quantity_str(raw: &str) -> Result<u64, RpcFailure> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| RpcFailure::Transport(format!("invalid hex quantity {raw:?}: {e}")))
    } else {
        raw.parse()
            .map_err(|e| RpcFailure::Transport(format!("invalid quantity {raw:?}: {e}")))
    }
}
