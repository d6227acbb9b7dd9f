use crate::errors::CheckoutError;

/// Lifecycle of a single purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchasePhase {
    Idle,
    PreflightChecking,
    Submitting,
    AwaitingConfirmation,
    Confirmed,
    Rejected,
    Failed,
}

impl PurchasePhase {
    pub fn name(self) -> &'static str {
        match self {
            PurchasePhase::Idle => "Idle",
            PurchasePhase::PreflightChecking => "PreflightChecking",
            PurchasePhase::Submitting => "Submitting",
            PurchasePhase::AwaitingConfirmation => "AwaitingConfirmation",
            PurchasePhase::Confirmed => "Confirmed",
            PurchasePhase::Rejected => "Rejected",
            PurchasePhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PurchasePhase::Confirmed | PurchasePhase::Rejected | PurchasePhase::Failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseAction {
    StartPreflight,
    PreflightPassed,
    Submitted,
    ConfirmationReceived,
    UserDeclined,
    Errored,
}

impl PurchaseAction {
    pub fn name(self) -> &'static str {
        match self {
            PurchaseAction::StartPreflight => "StartPreflight",
            PurchaseAction::PreflightPassed => "PreflightPassed",
            PurchaseAction::Submitted => "Submitted",
            PurchaseAction::ConfirmationReceived => "ConfirmationReceived",
            PurchaseAction::UserDeclined => "UserDeclined",
            PurchaseAction::Errored => "Errored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: &'static str,
    pub to: &'static str,
    pub reason: &'static str,
}

/// The purchase transition table. Anything not listed is illegal; in
/// particular no terminal phase has an outgoing edge, so a request can
/// never be resubmitted under any action sequence.
pub fn purchase_transition(
    phase: PurchasePhase,
    action: PurchaseAction,
) -> Result<(PurchasePhase, StateTransition), CheckoutError> {
    use PurchaseAction as A;
    use PurchasePhase as P;

    let (next, reason) = match (phase, action) {
        (P::Idle, A::StartPreflight) => (P::PreflightChecking, "preflight started"),
        (P::PreflightChecking, A::PreflightPassed) => (P::Submitting, "preflight passed"),
        (P::PreflightChecking, A::Errored) => (P::Failed, "preflight failed"),
        (P::Submitting, A::Submitted) => (P::AwaitingConfirmation, "transaction submitted"),
        (P::Submitting, A::UserDeclined) => (P::Rejected, "signature prompt declined"),
        (P::Submitting, A::Errored) => (P::Failed, "submission failed"),
        (P::AwaitingConfirmation, A::ConfirmationReceived) => (P::Confirmed, "receipt observed"),
        (P::AwaitingConfirmation, A::Errored) => (P::Failed, "confirmation failed"),
        (phase, action) => {
            return Err(CheckoutError::IllegalTransition {
                kind: "purchase",
                from: phase.name(),
                action: action.name(),
            })
        }
    };
    Ok((
        next,
        StateTransition {
            from: phase.name(),
            to: next.name(),
            reason,
        },
    ))
}
