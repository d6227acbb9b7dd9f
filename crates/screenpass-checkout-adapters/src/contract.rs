//! Gateway to the deployed NFT contract, reduced to the purchase call and
//! the confirmation wait. `Bridge` mode submits through the provider
//! bridge (the wallet signs and broadcasts) and polls for the receipt;
//! `Deterministic` mode is a scriptable in-memory chain for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use alloy::primitives::{keccak256, Address, B256, U256};
use serde_json::Value;

use screenpass_checkout_core::{
    ConfirmationError, ContractError, ContractPort, Receipt, TimestampMs, TransactionHandle,
};

use crate::config::CheckoutConfig;
use crate::rpc::{self, JsonRpcClient, RpcFailure};

fn purchase_selector() -> [u8; 4] {
    let hash = keccak256(b"purchase(uint256)");
    [hash[0], hash[1], hash[2], hash[3]]
}

fn purchase_calldata(token_id: U256) -> String {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&purchase_selector());
    data.extend_from_slice(&token_id.to_be_bytes::<32>());
    format!("0x{}", alloy::hex::encode(data))
}

#[derive(Debug, Clone)]
enum GatewayMode {
    Deterministic,
    Bridge(JsonRpcClient),
}

type ConfirmationHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct GatewayState {
    submit_seq: u64,
    submit_count: u64,
    scripted_submits: VecDeque<ContractError>,
    scripted_confirmations: VecDeque<ConfirmationError>,
    confirmation_hook: Option<ConfirmationHook>,
}

#[derive(Clone)]
pub struct NftContractAdapter {
    contract: Address,
    mode: GatewayMode,
    poll_interval: Duration,
    confirmation_window: Duration,
    state: Arc<Mutex<GatewayState>>,
}

impl NftContractAdapter {
    pub fn deterministic(contract: Address) -> Self {
        Self {
            contract,
            mode: GatewayMode::Deterministic,
            poll_interval: Duration::from_millis(1),
            confirmation_window: Duration::from_millis(10),
            state: Arc::new(Mutex::new(GatewayState::default())),
        }
    }

    pub fn with_config(config: &CheckoutConfig) -> Self {
        let mode = config
            .provider_bridge_url
            .as_ref()
            .and_then(|url| JsonRpcClient::new(url.clone(), config.rpc_timeout_ms).ok())
            .map(GatewayMode::Bridge)
            .unwrap_or(GatewayMode::Deterministic);
        Self {
            contract: config.contract_address,
            mode,
            poll_interval: Duration::from_millis(config.confirmation_poll_interval_ms),
            confirmation_window: Duration::from_millis(config.confirmation_timeout_ms),
            state: Arc::new(Mutex::new(GatewayState::default())),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails the next submission with the given error.
    pub fn debug_fail_next_submit(&self, error: ContractError) {
        self.lock().scripted_submits.push_back(error);
    }

    /// Fails the next confirmation wait with the given error.
    pub fn debug_fail_next_confirmation(&self, error: ConfirmationError) {
        self.lock().scripted_confirmations.push_back(error);
    }

    /// Runs inside every deterministic confirmation wait, i.e. while the
    /// owning purchase is still in flight. Lets tests act mid-purchase.
    pub fn debug_set_confirmation_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.lock().confirmation_hook = Some(Arc::new(hook));
    }

    pub fn debug_submit_count(&self) -> u64 {
        self.lock().submit_count
    }

    fn bridge_submit(
        &self,
        client: &JsonRpcClient,
        token_id: U256,
        price_wei: U256,
        buyer: Address,
    ) -> Result<TransactionHandle, ContractError> {
        let submitted_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| ContractError::Rpc(format!("clock failure: {e}")))?
            .as_millis() as u64;

        let tx = serde_json::json!({
            "from": buyer,
            "to": self.contract,
            "value": format!("{price_wei:#x}"),
            "data": purchase_calldata(token_id),
        });
        client
            .call("eth_estimateGas", serde_json::json!([tx]))
            .map_err(map_submit_failure)?;
        let result = client
            .call("eth_sendTransaction", serde_json::json!([tx]))
            .map_err(map_submit_failure)?;
        let tx_hash: B256 = result
            .as_str()
            .ok_or_else(|| ContractError::Rpc("eth_sendTransaction must return a hash".to_owned()))?
            .parse()
            .map_err(|e| ContractError::Rpc(format!("invalid transaction hash: {e}")))?;
        Ok(TransactionHandle {
            tx_hash,
            submitted_at: TimestampMs(submitted_at),
        })
    }

    fn bridge_await(
        &self,
        client: &JsonRpcClient,
        handle: &TransactionHandle,
    ) -> Result<Receipt, ConfirmationError> {
        let started = Instant::now();
        loop {
            match client.call(
                "eth_getTransactionReceipt",
                serde_json::json!([format!("{}", handle.tx_hash)]),
            ) {
                Ok(Value::Null) => {}
                Ok(receipt) => return parse_receipt(handle, &receipt),
                // Transient transport trouble is not a verdict on the
                // transaction; keep polling until the window closes.
                Err(e) => tracing::debug!(error = %e, "receipt poll failed, retrying"),
            }
            if started.elapsed() >= self.confirmation_window {
                return Err(ConfirmationError::Dropped);
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl ContractPort for NftContractAdapter {
    fn estimate_and_submit_purchase(
        &self,
        token_id: U256,
        price_wei: U256,
        buyer: Address,
    ) -> Result<TransactionHandle, ContractError> {
        if let GatewayMode::Bridge(client) = &self.mode {
            self.lock().submit_count += 1;
            return self.bridge_submit(client, token_id, price_wei, buyer);
        }

        let mut g = self.lock();
        g.submit_count += 1;
        if let Some(error) = g.scripted_submits.pop_front() {
            return Err(error);
        }
        g.submit_seq += 1;
        let seq = g.submit_seq;
        let mut seed = Vec::with_capacity(20 + 20 + 32 + 32 + 8);
        seed.extend_from_slice(self.contract.as_slice());
        seed.extend_from_slice(buyer.as_slice());
        seed.extend_from_slice(&token_id.to_be_bytes::<32>());
        seed.extend_from_slice(&price_wei.to_be_bytes::<32>());
        seed.extend_from_slice(&seq.to_be_bytes());
        Ok(TransactionHandle {
            tx_hash: keccak256(seed),
            submitted_at: TimestampMs(seq),
        })
    }

    fn await_confirmation(
        &self,
        handle: &TransactionHandle,
    ) -> Result<Receipt, ConfirmationError> {
        if let GatewayMode::Bridge(client) = &self.mode {
            return self.bridge_await(client, handle);
        }

        // Clone the hook out so it runs without the gateway lock held;
        // hooks re-enter the orchestrator.
        let hook = self.lock().confirmation_hook.clone();
        if let Some(hook) = hook {
            hook();
        }
        if let Some(error) = self.lock().scripted_confirmations.pop_front() {
            return Err(error);
        }
        Ok(Receipt {
            tx_hash: handle.tx_hash,
            block_number: 8_000_000 + handle.submitted_at.0,
            status: true,
        })
    }
}

fn map_submit_failure(failure: RpcFailure) -> ContractError {
    match failure {
        RpcFailure::Response { code, message } => {
            let lowered = message.to_ascii_lowercase();
            if code == screenpass_checkout_core::CODE_USER_REJECTED_REQUEST {
                ContractError::UserRejected
            } else if lowered.contains("insufficient funds") {
                ContractError::InsufficientFunds
            } else if code == 3 || lowered.contains("execution reverted") {
                ContractError::Reverted(message)
            } else {
                ContractError::Rpc(format!("code {code}: {message}"))
            }
        }
        RpcFailure::Transport(message) => ContractError::Rpc(message),
    }
}

fn parse_receipt(
    handle: &TransactionHandle,
    receipt: &Value,
) -> Result<Receipt, ConfirmationError> {
    let status = receipt
        .get("status")
        .and_then(|v| rpc::quantity_to_u64(v).ok())
        .unwrap_or(0);
    let block_number = receipt
        .get("blockNumber")
        .and_then(|v| rpc::quantity_to_u64(v).ok())
        .unwrap_or(0);
    if status == 0 {
        return Err(ConfirmationError::Reverted("execution reverted".to_owned()));
    }
    Ok(Receipt {
        tx_hash: handle.tx_hash,
        block_number,
        status: true,
    })
}
