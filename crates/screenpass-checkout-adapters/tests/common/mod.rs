#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::Address;

use screenpass_checkout_adapters::{Eip1193Adapter, NftContractAdapter, DEV_CONTRACT_ADDRESS};
use screenpass_checkout_core::{ChainDescriptor, CheckoutError, CheckoutOrchestrator, ClockPort};

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, CheckoutError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_754_000_000_000)
    }
}

pub type TestOrchestrator = CheckoutOrchestrator<Eip1193Adapter, NftContractAdapter, TestClock>;

pub fn contract_address() -> Address {
    DEV_CONTRACT_ADDRESS.parse().expect("valid contract address")
}

pub fn wallet_account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid wallet account")
}

pub fn new_orchestrator() -> TestOrchestrator {
    CheckoutOrchestrator::new(
        Eip1193Adapter::deterministic(),
        NftContractAdapter::deterministic(contract_address()),
        TestClock::default(),
        ChainDescriptor::sepolia(),
    )
}

pub fn connect(orch: &TestOrchestrator) {
    orch.connect_wallet().expect("connect wallet");
    assert!(orch.session.is_ready(), "session must be ready after connect");
}
