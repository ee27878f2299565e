use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Default simulated decline rate.
pub const DEFAULT_FAILURE_RATE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved,
    Declined,
    /// The payment collaborator could not be reached.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct PaymentRequest<'a> {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub amount: Decimal,
    pub method: &'a str,
}

/// Decides whether a charge goes through. Stand-in for a payment gateway.
pub trait PaymentDecider: Send + Sync {
    fn decide(&self, request: &PaymentRequest<'_>) -> PaymentOutcome;
}

/// Approves when a uniform draw in [0, 1) is at or above `failure_rate`.
#[derive(Debug, Clone)]
pub struct RandomPayment {
    failure_rate: f64,
}

impl RandomPayment {
    pub fn new(failure_rate: f64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    fn outcome_for(&self, draw: f64) -> PaymentOutcome {
        if draw >= self.failure_rate {
            PaymentOutcome::Approved
        } else {
            PaymentOutcome::Declined
        }
    }
}

impl Default for RandomPayment {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RATE)
    }
}

impl PaymentDecider for RandomPayment {
    fn decide(&self, request: &PaymentRequest<'_>) -> PaymentOutcome {
        let draw: f64 = rand::thread_rng().gen();
        let outcome = self.outcome_for(draw);
        tracing::debug!(
            user_id = %request.user_id,
            event_id = %request.event_id,
            amount = %request.amount,
            method = request.method,
            ?outcome,
            "Simulated payment"
        );
        outcome
    }
}

/// Always returns the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedPayment(pub PaymentOutcome);

impl PaymentDecider for FixedPayment {
    fn decide(&self, _request: &PaymentRequest<'_>) -> PaymentOutcome {
        self.0
    }
}
