use screenpass_checkout_core::{CheckoutError, ClockPort};

#[derive(Debug, Clone, Default)]
pub struct SystemClockAdapter;

impl ClockPort for SystemClockAdapter {
    fn now_ms(&self) -> Result<u64, CheckoutError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| CheckoutError::Clock(e.to_string()))?;
        Ok(now.as_millis() as u64)
    }
}
