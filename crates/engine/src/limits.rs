//! Operation limits and the retry policy for contended DB transactions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Minimum accepted amount per operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub min_deposit: Money,
    pub min_withdrawal: Money,
    pub min_transfer: Money,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_deposit: Money::new(1_000),
            min_withdrawal: Money::new(10_000),
            min_transfer: Money::new(1_000),
        }
    }
}

impl Limits {
    pub(crate) fn check_deposit(&self, amount: Money) -> ResultEngine<()> {
        check_amount("deposit", amount, self.min_deposit)
    }

    pub(crate) fn check_withdrawal(&self, amount: Money) -> ResultEngine<()> {
        check_amount("withdrawal", amount, self.min_withdrawal)
    }

    pub(crate) fn check_transfer(&self, amount: Money) -> ResultEngine<()> {
        check_amount("transfer", amount, self.min_transfer)
    }
}

fn check_amount(label: &str, amount: Money, minimum: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidOperation(format!(
            "{label} amount must be > 0"
        )));
    }
    if amount < minimum {
        return Err(EngineError::InvalidOperation(format!(
            "minimum {label} is {minimum}"
        )));
    }
    Ok(())
}

/// How often a DB transaction is re-run after a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Always at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, doubling from `base_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}
