//! Chain negotiation: guarantee the provider is attached to the required
//! chain, or fail with a typed reason.
//!
//! The switch/add/retry policy is an enumerated transition table rather
//! than a retry loop: `RetrySwitch` has no edge back to `RequestAdd`, so
//! "retry exactly once after add" holds structurally. Wallets throttle
//! repeated prompts; a third attempt signals user refusal and must be
//! surfaced, not retried.

use crate::domain::ChainDescriptor;
use crate::errors::{CheckoutError, ProviderError};
use crate::ports::ProviderPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    Probe,
    RequestSwitch,
    RequestAdd,
    RetrySwitch,
    ConfirmSwitched,
    Verified,
}

impl NegotiationStep {
    pub fn name(self) -> &'static str {
        match self {
            NegotiationStep::Probe => "Probe",
            NegotiationStep::RequestSwitch => "RequestSwitch",
            NegotiationStep::RequestAdd => "RequestAdd",
            NegotiationStep::RetrySwitch => "RetrySwitch",
            NegotiationStep::ConfirmSwitched => "ConfirmSwitched",
            NegotiationStep::Verified => "Verified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    OnRequiredChain,
    WrongChain,
    Accepted,
    ChainUnknown,
    Declined,
}

impl StepOutcome {
    pub fn name(self) -> &'static str {
        match self {
            StepOutcome::OnRequiredChain => "OnRequiredChain",
            StepOutcome::WrongChain => "WrongChain",
            StepOutcome::Accepted => "Accepted",
            StepOutcome::ChainUnknown => "ChainUnknown",
            StepOutcome::Declined => "Declined",
        }
    }
}

pub fn negotiation_transition(
    step: NegotiationStep,
    outcome: StepOutcome,
) -> Result<NegotiationStep, CheckoutError> {
    use NegotiationStep as S;
    use StepOutcome as O;

    match (step, outcome) {
        (S::Probe, O::OnRequiredChain) => Ok(S::Verified),
        (S::Probe, O::WrongChain) => Ok(S::RequestSwitch),
        (S::RequestSwitch, O::Accepted) => Ok(S::ConfirmSwitched),
        (S::RequestSwitch, O::ChainUnknown) => Ok(S::RequestAdd),
        (S::RequestSwitch, O::Declined) => Err(CheckoutError::UserRejectedSwitch),
        (S::RequestAdd, O::Accepted) => Ok(S::RetrySwitch),
        (S::RequestAdd, O::Declined) => Err(CheckoutError::UserRejectedAdd),
        (S::RequestAdd, O::ChainUnknown) => Err(CheckoutError::NetworkUnavailable(
            "provider rejected the add-chain descriptor".to_owned(),
        )),
        (S::RetrySwitch, O::Accepted) => Ok(S::ConfirmSwitched),
        (S::RetrySwitch, O::Declined) => Err(CheckoutError::UserRejectedSwitch),
        (S::RetrySwitch, O::ChainUnknown) => Err(CheckoutError::NetworkUnavailable(
            "chain still unrecognized after adding it".to_owned(),
        )),
        (S::ConfirmSwitched, O::OnRequiredChain) => Ok(S::Verified),
        (S::ConfirmSwitched, O::WrongChain) => Err(CheckoutError::NetworkUnavailable(
            "provider accepted the switch but stayed on another chain".to_owned(),
        )),
        (step, outcome) => Err(CheckoutError::IllegalTransition {
            kind: "negotiation",
            from: step.name(),
            action: outcome.name(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct NetworkGuard {
    required: ChainDescriptor,
}

impl NetworkGuard {
    pub fn new(required: ChainDescriptor) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &ChainDescriptor {
        &self.required
    }

    /// Drives the negotiation table until the provider is verified on the
    /// required chain. Idempotent and cheap when already attached; callers
    /// re-run it before every value-bearing action.
    pub fn ensure_chain<P: ProviderPort>(&self, provider: &P) -> Result<(), CheckoutError> {
        let required = self.required.chain_id;
        let mut step = NegotiationStep::Probe;
        loop {
            let outcome = match step {
                NegotiationStep::Verified => return Ok(()),
                NegotiationStep::Probe | NegotiationStep::ConfirmSwitched => {
                    let active = provider.chain_id().map_err(CheckoutError::from)?;
                    if active == required {
                        StepOutcome::OnRequiredChain
                    } else {
                        tracing::debug!(active, required, "provider on wrong chain");
                        StepOutcome::WrongChain
                    }
                }
                NegotiationStep::RequestSwitch | NegotiationStep::RetrySwitch => {
                    classify(provider.switch_chain(required))?
                }
                NegotiationStep::RequestAdd => classify(provider.add_chain(&self.required))?,
            };
            step = negotiation_transition(step, outcome)?;
        }
    }
}

fn classify(result: Result<(), ProviderError>) -> Result<StepOutcome, CheckoutError> {
    match result {
        Ok(()) => Ok(StepOutcome::Accepted),
        Err(ProviderError::UserRejected) => Ok(StepOutcome::Declined),
        Err(ProviderError::UnrecognizedChain) => Ok(StepOutcome::ChainUnknown),
        // Transport-level failures are terminal for the attempt either way.
        Err(ProviderError::Unavailable(reason)) => Err(CheckoutError::ProviderUnavailable(reason)),
        Err(ProviderError::Rpc(message)) => Err(CheckoutError::NetworkUnavailable(message)),
    }
}
