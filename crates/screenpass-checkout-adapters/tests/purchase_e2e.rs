mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use screenpass_checkout_core::{CheckoutError, ContractError, PurchaseOutcome, PurchasePhase};

use common::{connect, new_orchestrator};

#[test]
fn purchase_of_item_42_confirms_and_cleans_up() {
    let orch = new_orchestrator();
    connect(&orch);

    let outcome = orch.purchase("42", "0.0001").expect("purchase");
    let PurchaseOutcome::Confirmed(receipt) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert!(receipt.status);
    assert!(receipt.block_number > 0);

    assert_eq!(orch.contract.debug_submit_count(), 1);
    assert_eq!(orch.loading.outstanding(), 0);
    assert!(orch.active_purchases().is_empty());
}

#[test]
fn duplicate_item_is_rejected_mid_flight_without_a_contract_call() {
    let orch = Arc::new(new_orchestrator());
    connect(&orch);

    // Fires inside the first purchase's confirmation wait, i.e. while
    // item 42 is still in flight.
    let inner = Arc::clone(&orch);
    orch.contract.debug_set_confirmation_hook(move || {
        assert_eq!(
            inner.active_purchases(),
            vec![("42".to_owned(), PurchasePhase::AwaitingConfirmation)]
        );
        let err = inner
            .purchase("42", "0.0001")
            .expect_err("second attempt must be rejected");
        assert_eq!(err, CheckoutError::DuplicateInFlight("42".to_owned()));
    });

    let outcome = orch.purchase("42", "0.0001").expect("first purchase");
    assert!(outcome.is_confirmed());
    // The duplicate never reached the gateway.
    assert_eq!(orch.contract.debug_submit_count(), 1);
    assert!(orch.active_purchases().is_empty());
    assert_eq!(orch.loading.outstanding(), 0);
}

#[test]
fn different_items_may_overlap() {
    let orch = Arc::new(new_orchestrator());
    connect(&orch);

    let fired = Arc::new(AtomicBool::new(false));
    let inner = Arc::clone(&orch);
    let once = Arc::clone(&fired);
    orch.contract.debug_set_confirmation_hook(move || {
        if once.swap(true, Ordering::SeqCst) {
            return;
        }
        // While 42 awaits confirmation, 7 runs its whole lifecycle.
        assert!(inner.loading.is_busy());
        let outcome = inner.purchase("7", "0.0002").expect("second item");
        assert!(outcome.is_confirmed());
    });

    let outcome = orch.purchase("42", "0.0001").expect("first item");
    assert!(outcome.is_confirmed());
    assert!(fired.load(Ordering::SeqCst));
    assert_eq!(orch.contract.debug_submit_count(), 2);
    assert_eq!(orch.loading.outstanding(), 0);
    assert!(orch.active_purchases().is_empty());
}

#[test]
fn declined_signature_is_rejected_and_item_is_immediately_free() {
    let orch = new_orchestrator();
    connect(&orch);
    orch.contract.debug_fail_next_submit(ContractError::UserRejected);

    let outcome = orch.purchase("42", "0.0001").expect("attempt runs");
    assert!(matches!(outcome, PurchaseOutcome::Rejected { .. }));
    assert_eq!(orch.contract.debug_submit_count(), 1);
    assert!(orch.active_purchases().is_empty());
    assert_eq!(orch.loading.outstanding(), 0);

    // Changing their mind again is allowed right away.
    let outcome = orch.purchase("42", "0.0001").expect("retry");
    assert!(outcome.is_confirmed());
}
