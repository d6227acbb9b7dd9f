use screenpass_checkout_core::{
    negotiation_transition, purchase_transition, CheckoutError, NegotiationStep, PurchaseAction,
    PurchasePhase, StepOutcome,
};

#[test]
fn purchase_happy_path_transitions() {
    let (s1, _) = purchase_transition(PurchasePhase::Idle, PurchaseAction::StartPreflight)
        .expect("idle -> preflight");
    assert_eq!(s1, PurchasePhase::PreflightChecking);
    let (s2, _) =
        purchase_transition(s1, PurchaseAction::PreflightPassed).expect("preflight -> submitting");
    assert_eq!(s2, PurchasePhase::Submitting);
    let (s3, _) =
        purchase_transition(s2, PurchaseAction::Submitted).expect("submitting -> awaiting");
    assert_eq!(s3, PurchasePhase::AwaitingConfirmation);
    let (s4, _) = purchase_transition(s3, PurchaseAction::ConfirmationReceived)
        .expect("awaiting -> confirmed");
    assert_eq!(s4, PurchasePhase::Confirmed);
    assert!(s4.is_terminal());
}

#[test]
fn purchase_decline_is_terminal_rejected() {
    let (s, _) = purchase_transition(PurchasePhase::Submitting, PurchaseAction::UserDeclined)
        .expect("submitting -> rejected");
    assert_eq!(s, PurchasePhase::Rejected);
    assert!(s.is_terminal());
}

#[test]
fn purchase_illegal_transition_is_rejected() {
    let err = purchase_transition(PurchasePhase::Idle, PurchaseAction::Submitted)
        .expect_err("must fail");
    assert!(err.to_string().contains("illegal purchase transition"));
}

#[test]
fn purchase_terminal_phases_have_no_outgoing_edges() {
    for phase in [
        PurchasePhase::Confirmed,
        PurchasePhase::Rejected,
        PurchasePhase::Failed,
    ] {
        for action in [
            PurchaseAction::StartPreflight,
            PurchaseAction::PreflightPassed,
            PurchaseAction::Submitted,
            PurchaseAction::ConfirmationReceived,
            PurchaseAction::UserDeclined,
            PurchaseAction::Errored,
        ] {
            purchase_transition(phase, action).expect_err("terminal phase must be final");
        }
    }
}

#[test]
fn negotiation_happy_path_without_add() {
    let s1 = negotiation_transition(NegotiationStep::Probe, StepOutcome::WrongChain)
        .expect("probe -> switch");
    assert_eq!(s1, NegotiationStep::RequestSwitch);
    let s2 = negotiation_transition(s1, StepOutcome::Accepted).expect("switch -> confirm");
    assert_eq!(s2, NegotiationStep::ConfirmSwitched);
    let s3 = negotiation_transition(s2, StepOutcome::OnRequiredChain).expect("confirm -> verified");
    assert_eq!(s3, NegotiationStep::Verified);
}

#[test]
fn negotiation_add_then_retry_once() {
    let s1 = negotiation_transition(NegotiationStep::RequestSwitch, StepOutcome::ChainUnknown)
        .expect("switch -> add");
    assert_eq!(s1, NegotiationStep::RequestAdd);
    let s2 = negotiation_transition(s1, StepOutcome::Accepted).expect("add -> retry");
    assert_eq!(s2, NegotiationStep::RetrySwitch);
    // The retry has no edge back to RequestAdd: a second unknown-chain
    // report terminates instead of looping.
    let err = negotiation_transition(s2, StepOutcome::ChainUnknown).expect_err("must terminate");
    assert!(matches!(err, CheckoutError::NetworkUnavailable(_)));
}

#[test]
fn negotiation_user_rejections_are_typed() {
    let err = negotiation_transition(NegotiationStep::RequestSwitch, StepOutcome::Declined)
        .expect_err("switch declined");
    assert_eq!(err, CheckoutError::UserRejectedSwitch);
    let err = negotiation_transition(NegotiationStep::RequestAdd, StepOutcome::Declined)
        .expect_err("add declined");
    assert_eq!(err, CheckoutError::UserRejectedAdd);
    let err = negotiation_transition(NegotiationStep::RetrySwitch, StepOutcome::Declined)
        .expect_err("retry declined");
    assert_eq!(err, CheckoutError::UserRejectedSwitch);
}

#[test]
fn negotiation_lying_switch_is_terminal() {
    let err = negotiation_transition(NegotiationStep::ConfirmSwitched, StepOutcome::WrongChain)
        .expect_err("must fail");
    assert!(matches!(err, CheckoutError::NetworkUnavailable(_)));
}
