//! Payment gateway boundary
//!
//! The booking lifecycle only talks to `PaymentGateway`. `SimulatedGateway`
//! is the built-in implementation; a real processor (or a test double)
//! plugs in behind the same trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::id::new_id;

/// Card numbers and wallets never reach this layer, only a method token.
#[derive(Debug, Clone)]
pub struct Charge<'a> {
    pub amount: f64,
    pub currency: &'a str,
    pub method: &'a str,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Accepted { reference: String },
    Declined { reason: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempts to capture `charge`. `Err` means the gateway itself failed,
    /// a refusal is `Ok(Declined)`.
    async fn submit(&self, charge: Charge<'_>) -> AppResult<PaymentOutcome>;

    /// Returns `amount` against an earlier payment and yields a refund reference.
    async fn refund(&self, payment_reference: &str, amount: f64) -> AppResult<String>;
}

/// Payment methods the simulated gateway always declines
pub const DECLINED_TEST_METHODS: [&str; 2] = ["card_declined", "insufficient_funds"];

/// Deterministic stand-in for a card processor
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn submit(&self, charge: Charge<'_>) -> AppResult<PaymentOutcome> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if DECLINED_TEST_METHODS.contains(&charge.method) {
            tracing::debug!(
                "Simulated gateway declined {:.2} {} ({})",
                charge.amount,
                charge.currency,
                charge.method
            );
            return Ok(PaymentOutcome::Declined {
                reason: "Payment declined by bank".to_string(),
            });
        }

        Ok(PaymentOutcome::Accepted {
            reference: new_id("pay"),
        })
    }

    async fn refund(&self, payment_reference: &str, amount: f64) -> AppResult<String> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::debug!("Simulated refund of {:.2} against {}", amount, payment_reference);
        Ok(new_id("ref"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(method: &str) -> Charge<'_> {
        Charge {
            amount: 150.0,
            currency: "USD",
            method,
            description: "Booking bk_test".to_string(),
        }
    }

    #[tokio::test]
    async fn accepts_regular_methods() {
        let gateway = SimulatedGateway::default();
        match gateway.submit(charge("card")).await.unwrap() {
            PaymentOutcome::Accepted { reference } => assert!(reference.starts_with("pay_")),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn declines_test_methods() {
        let gateway = SimulatedGateway::default();
        for method in DECLINED_TEST_METHODS {
            assert_eq!(
                gateway.submit(charge(method)).await.unwrap(),
                PaymentOutcome::Declined {
                    reason: "Payment declined by bank".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn refunds_yield_reference() {
        let gateway = SimulatedGateway::default();
        let refund = gateway.refund("pay_abc", 75.0).await.unwrap();
        assert!(refund.starts_with("ref_"));
        assert_eq!(refund.len(), 14);
    }
}
