//! EIP-1193 provider adapter.
//!
//! Two runtime modes: `Bridge` speaks JSON-RPC to an external provider
//! bridge using the bit-exact injected-provider method names, and
//! `Deterministic` is a fully scriptable in-memory wallet used by tests
//! and local development. The deterministic wallet starts parked on
//! mainnet with the deployment chain unknown, so the add-chain flow is
//! exercised the way a fresh wallet would exercise it.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use serde_json::Value;

use screenpass_checkout_core::{
    ChainDescriptor, ProviderError, ProviderEvent, ProviderEventKind, ProviderPort,
};

use crate::config::CheckoutConfig;
use crate::rpc::{self, JsonRpcClient, RpcFailure};

pub const METHOD_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const METHOD_CHAIN_ID: &str = "eth_chainId";
pub const METHOD_SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
pub const METHOD_ADD_CHAIN: &str = "wallet_addEthereumChain";

/// Next response of the deterministic wallet for one method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Succeed,
    RejectedByUser,
    UnrecognizedChain,
    RpcFailure(String),
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Bridge(JsonRpcClient),
}

#[derive(Debug)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    scripted: HashMap<&'static str, VecDeque<ScriptedOutcome>>,
    call_counts: HashMap<&'static str, u64>,
    event_seq: u64,
    events: Vec<ProviderEvent>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec!["0x1000000000000000000000000000000000000001"
                .parse()
                .expect("valid built-in deterministic account")],
            chain_id: 1,
            known_chains: BTreeSet::from([1]),
            scripted: HashMap::new(),
            call_counts: HashMap::new(),
            event_seq: 0,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl Eip1193Adapter {
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    pub fn with_config(config: &CheckoutConfig) -> Self {
        let mode = match &config.provider_bridge_url {
            Some(url) => match JsonRpcClient::new(url.clone(), config.rpc_timeout_ms) {
                Ok(client) => ProviderMode::Bridge(client),
                Err(e) if config.strict_runtime => ProviderMode::Disabled(format!(
                    "failed to initialize provider bridge in production profile: {e}"
                )),
                Err(_) => ProviderMode::Deterministic,
            },
            None if config.strict_runtime => ProviderMode::Disabled(
                "provider bridge url not configured in production profile".to_owned(),
            ),
            None => ProviderMode::Deterministic,
        };
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    fn check_mode(&self) -> Result<(), ProviderError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(ProviderError::Unavailable(reason.clone()));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_call(g: &mut ProviderState, method: &'static str) {
        *g.call_counts.entry(method).or_insert(0) += 1;
    }

    /// `Ok(true)` forces success regardless of wallet state, `Ok(false)`
    /// means no script is armed for this call.
    fn take_scripted(
        g: &mut ProviderState,
        method: &'static str,
    ) -> Result<bool, ProviderError> {
        match g.scripted.get_mut(method).and_then(VecDeque::pop_front) {
            None => Ok(false),
            Some(ScriptedOutcome::Succeed) => Ok(true),
            Some(ScriptedOutcome::RejectedByUser) => Err(ProviderError::UserRejected),
            Some(ScriptedOutcome::UnrecognizedChain) => Err(ProviderError::UnrecognizedChain),
            Some(ScriptedOutcome::RpcFailure(message)) => Err(ProviderError::Rpc(message)),
        }
    }

    fn record_event(g: &mut ProviderState, kind: ProviderEventKind) {
        g.event_seq = g.event_seq.saturating_add(1);
        g.events.push(ProviderEvent {
            sequence: g.event_seq,
            kind,
        });
    }

    /// Simulates the user switching accounts in the wallet UI.
    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) {
        let mut g = self.lock();
        g.accounts = accounts.clone();
        Self::record_event(&mut g, ProviderEventKind::AccountsChanged(accounts));
    }

    /// Simulates the user switching networks in the wallet UI.
    pub fn debug_inject_chain_changed(&self, chain_id: u64) {
        let mut g = self.lock();
        g.chain_id = chain_id;
        Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
    }

    pub fn debug_add_known_chain(&self, chain_id: u64) {
        self.lock().known_chains.insert(chain_id);
    }

    pub fn debug_push_outcome(&self, method: &'static str, outcome: ScriptedOutcome) {
        self.lock()
            .scripted
            .entry(method)
            .or_default()
            .push_back(outcome);
    }

    pub fn debug_call_count(&self, method: &str) -> u64 {
        self.lock().call_counts.get(method).copied().unwrap_or(0)
    }
}

impl ProviderPort for Eip1193Adapter {
    fn is_available(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }

    fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.check_mode()?;
        {
            let mut g = self.lock();
            Self::count_call(&mut g, METHOD_REQUEST_ACCOUNTS);
            if let ProviderMode::Deterministic = self.mode {
                Self::take_scripted(&mut g, METHOD_REQUEST_ACCOUNTS)?;
                return Ok(g.accounts.clone());
            }
        }

        let ProviderMode::Bridge(client) = &self.mode else {
            return Err(ProviderError::Unavailable("provider mode lost".to_owned()));
        };
        let result = client
            .call(METHOD_REQUEST_ACCOUNTS, serde_json::json!([]))
            .map_err(map_rpc_failure)?;
        let accounts = parse_accounts(&result)?;
        let mut g = self.lock();
        if g.accounts != accounts {
            g.accounts = accounts.clone();
            Self::record_event(&mut g, ProviderEventKind::AccountsChanged(accounts.clone()));
        }
        Ok(accounts)
    }

    fn chain_id(&self) -> Result<u64, ProviderError> {
        self.check_mode()?;
        {
            let mut g = self.lock();
            Self::count_call(&mut g, METHOD_CHAIN_ID);
            if let ProviderMode::Deterministic = self.mode {
                Self::take_scripted(&mut g, METHOD_CHAIN_ID)?;
                return Ok(g.chain_id);
            }
        }

        let ProviderMode::Bridge(client) = &self.mode else {
            return Err(ProviderError::Unavailable("provider mode lost".to_owned()));
        };
        let result = client
            .call(METHOD_CHAIN_ID, serde_json::json!([]))
            .map_err(map_rpc_failure)?;
        let chain_id = rpc::quantity_to_u64(&result)
            .map_err(|e| ProviderError::Rpc(e.to_string()))?;
        let mut g = self.lock();
        if g.chain_id != chain_id {
            g.chain_id = chain_id;
            Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
        }
        Ok(chain_id)
    }

    fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.check_mode()?;
        {
            let mut g = self.lock();
            Self::count_call(&mut g, METHOD_SWITCH_CHAIN);
            if let ProviderMode::Deterministic = self.mode {
                let forced = Self::take_scripted(&mut g, METHOD_SWITCH_CHAIN)?;
                if !forced && !g.known_chains.contains(&chain_id) {
                    return Err(ProviderError::UnrecognizedChain);
                }
                if g.chain_id != chain_id {
                    g.chain_id = chain_id;
                    Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
                }
                return Ok(());
            }
        }

        let ProviderMode::Bridge(client) = &self.mode else {
            return Err(ProviderError::Unavailable("provider mode lost".to_owned()));
        };
        client
            .call(
                METHOD_SWITCH_CHAIN,
                serde_json::json!([{ "chainId": format!("{chain_id:#x}") }]),
            )
            .map_err(map_rpc_failure)?;
        Ok(())
    }

    fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        self.check_mode()?;
        {
            let mut g = self.lock();
            Self::count_call(&mut g, METHOD_ADD_CHAIN);
            if let ProviderMode::Deterministic = self.mode {
                Self::take_scripted(&mut g, METHOD_ADD_CHAIN)?;
                g.known_chains.insert(chain.chain_id);
                return Ok(());
            }
        }

        let ProviderMode::Bridge(client) = &self.mode else {
            return Err(ProviderError::Unavailable("provider mode lost".to_owned()));
        };
        client
            .call(METHOD_ADD_CHAIN, serde_json::json!([chain.add_chain_params()]))
            .map_err(map_rpc_failure)?;
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        self.check_mode()?;
        Ok(std::mem::take(&mut self.lock().events))
    }
}

fn map_rpc_failure(failure: RpcFailure) -> ProviderError {
    match failure {
        RpcFailure::Response { code, message } => ProviderError::from_rpc_code(code, &message),
        RpcFailure::Transport(message) => ProviderError::Rpc(message),
    }
}

fn parse_accounts(result: &Value) -> Result<Vec<Address>, ProviderError> {
    let arr = result
        .as_array()
        .ok_or_else(|| ProviderError::Rpc("eth_requestAccounts: array expected".to_owned()))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item
            .as_str()
            .ok_or_else(|| ProviderError::Rpc("eth_requestAccounts: string expected".to_owned()))?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| ProviderError::Rpc(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}
