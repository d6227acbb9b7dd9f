mod common;

use screenpass_checkout_adapters::{ScriptedOutcome, METHOD_SWITCH_CHAIN};
use screenpass_checkout_core::{
    CheckoutError, ConfirmationError, ContractError, ProviderPort, PurchaseOutcome,
};

use common::{connect, new_orchestrator};

fn failed_error(outcome: PurchaseOutcome) -> CheckoutError {
    match outcome {
        PurchaseOutcome::Failed { error } => error,
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn insufficient_funds_is_a_failure_not_a_rejection() {
    let orch = new_orchestrator();
    connect(&orch);
    orch.contract
        .debug_fail_next_submit(ContractError::InsufficientFunds);

    let outcome = orch.purchase("42", "0.0001").expect("attempt runs");
    assert_eq!(failed_error(outcome), CheckoutError::InsufficientFunds);
    assert_eq!(orch.loading.outstanding(), 0);
    assert!(orch.active_purchases().is_empty());
}

#[test]
fn reverted_submission_carries_the_reason() {
    let orch = new_orchestrator();
    connect(&orch);
    orch.contract
        .debug_fail_next_submit(ContractError::Reverted("already sold".to_owned()));

    let outcome = orch.purchase("42", "0.0001").expect("attempt runs");
    assert_eq!(
        failed_error(outcome),
        CheckoutError::ContractReverted("already sold".to_owned())
    );
}

#[test]
fn dropped_transaction_fails_after_submission() {
    let orch = new_orchestrator();
    connect(&orch);
    orch.contract
        .debug_fail_next_confirmation(ConfirmationError::Dropped);

    let outcome = orch.purchase("42", "0.0001").expect("attempt runs");
    assert_eq!(failed_error(outcome), CheckoutError::TransactionDropped);
    // Submission happened exactly once; a dropped transaction is never
    // reissued for the same request.
    assert_eq!(orch.contract.debug_submit_count(), 1);
    assert_eq!(orch.loading.outstanding(), 0);
    assert!(orch.active_purchases().is_empty());
}

#[test]
fn on_chain_revert_during_confirmation_is_a_failure() {
    let orch = new_orchestrator();
    connect(&orch);
    orch.contract
        .debug_fail_next_confirmation(ConfirmationError::Reverted("token unavailable".to_owned()));

    let outcome = orch.purchase("42", "0.0001").expect("attempt runs");
    assert_eq!(
        failed_error(outcome),
        CheckoutError::ContractReverted("token unavailable".to_owned())
    );
}

#[test]
fn purchase_requires_a_connected_session() {
    let orch = new_orchestrator();
    let err = orch.purchase("42", "0.0001").expect_err("not connected");
    assert_eq!(err, CheckoutError::NotConnected);
    assert_eq!(orch.contract.debug_submit_count(), 0);
}

#[test]
fn malformed_inputs_never_touch_the_network() {
    let orch = new_orchestrator();
    connect(&orch);

    let err = orch.purchase("42", "1e18").expect_err("bad price");
    assert!(matches!(err, CheckoutError::InvalidAmount { .. }));
    let err = orch.purchase("not-a-token", "0.0001").expect_err("bad item");
    assert!(matches!(err, CheckoutError::InvalidItemId(_)));
    assert_eq!(orch.contract.debug_submit_count(), 0);
}

#[test]
fn stale_chain_snapshot_is_renegotiated_before_submit() {
    let orch = new_orchestrator();
    connect(&orch);
    let switches = orch.provider.debug_call_count(METHOD_SWITCH_CHAIN);

    // The wallet drifted to mainnet but the change notification was lost:
    // the session still believes it is Connected.
    orch.provider.debug_inject_chain_changed(1);
    orch.provider.drain_events().expect("discard notification");
    assert!(orch.session.is_ready());

    let outcome = orch.purchase("42", "0.0001").expect("purchase");
    assert!(outcome.is_confirmed());
    // The preflight re-check caught the drift and switched back.
    assert_eq!(
        orch.provider.debug_call_count(METHOD_SWITCH_CHAIN),
        switches + 1
    );
}

#[test]
fn declined_preflight_switch_aborts_before_submission() {
    let orch = new_orchestrator();
    connect(&orch);

    orch.provider.debug_inject_chain_changed(1);
    orch.provider.drain_events().expect("discard notification");
    orch.provider
        .debug_push_outcome(METHOD_SWITCH_CHAIN, ScriptedOutcome::RejectedByUser);

    let err = orch.purchase("42", "0.0001").expect_err("declined switch");
    assert_eq!(err, CheckoutError::UserRejectedSwitch);
    assert_eq!(orch.contract.debug_submit_count(), 0);
    assert!(orch.active_purchases().is_empty());
    assert_eq!(orch.loading.outstanding(), 0);
}
