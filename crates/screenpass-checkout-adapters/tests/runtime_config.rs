use alloy::primitives::Address;

use screenpass_checkout_adapters::CheckoutConfig;
use screenpass_checkout_core::CheckoutError;

#[test]
fn default_config_is_a_valid_sepolia_deployment() {
    let config = CheckoutConfig::default();
    config.validate().expect("default config is valid");
    assert_eq!(config.required_chain.chain_id, 11_155_111);
    assert_ne!(config.contract_address, Address::ZERO);
}

#[test]
fn zero_contract_address_fails_fast() {
    let config = CheckoutConfig {
        contract_address: Address::ZERO,
        ..CheckoutConfig::default()
    };
    let err = config.validate().expect_err("zero address");
    assert!(matches!(err, CheckoutError::Config(_)));
}

#[test]
fn malformed_bridge_url_fails_fast() {
    let config = CheckoutConfig {
        provider_bridge_url: Some("not-a-url".to_owned()),
        ..CheckoutConfig::default()
    };
    config.validate().expect_err("malformed bridge url");
}

#[test]
fn production_profile_requires_a_bridge() {
    let config = CheckoutConfig {
        strict_runtime: true,
        ..CheckoutConfig::default()
    };
    config.validate().expect_err("production without bridge");

    let config = CheckoutConfig {
        strict_runtime: true,
        provider_bridge_url: Some("http://127.0.0.1:8545".to_owned()),
        ..CheckoutConfig::default()
    };
    config.validate().expect("production with bridge");
}

#[test]
fn degenerate_timeouts_are_rejected() {
    let config = CheckoutConfig {
        confirmation_poll_interval_ms: 0,
        ..CheckoutConfig::default()
    };
    config.validate().expect_err("zero poll interval");

    let config = CheckoutConfig {
        confirmation_poll_interval_ms: 10_000,
        confirmation_timeout_ms: 1_000,
        ..CheckoutConfig::default()
    };
    config.validate().expect_err("window shorter than one poll");
}

#[test]
fn malformed_chain_descriptor_fails_fast() {
    let mut config = CheckoutConfig::default();
    config.required_chain.native_currency.symbol = "S".to_owned();
    config.validate().expect_err("symbol too short for wallets");
}
