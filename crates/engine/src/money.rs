use std::{
    fmt,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as an integer count of the **smallest
/// currency unit**.
///
/// Use this type for **all** monetary values in the engine (balances, entry
/// amounts, limits) to avoid floating-point drift. Balances are never
/// negative once committed, but the type is signed so that deltas and
/// reconciliation sums can be expressed directly.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(250_000);
/// assert_eq!(amount.minor(), 250_000);
/// assert_eq!(amount.to_string(), "250,000");
/// ```
///
/// Parsing from user input accepts `,` thousands separators:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("1,000".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("500000".parse::<Money>().unwrap().minor(), 500_000);
/// assert!("1,00".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}{grouped}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses an integer amount of minor units.
    ///
    /// Accepts an optional leading `+`/`-` and `,` as thousands separator.
    /// When separators are used every group after the first must have exactly
    /// three digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidOperation(format!("invalid amount: {s}"));
        let overflow = || EngineError::InvalidOperation("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut groups = rest.split(',');
        let head = groups.next().ok_or_else(invalid)?;
        if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let mut digits = head.to_string();
        for group in groups {
            if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            digits.push_str(group);
        }

        let value: i64 = digits.parse().map_err(|_| overflow())?;
        let signed = if negative {
            value.checked_neg().ok_or_else(overflow)?
        } else {
            value
        };
        Ok(Money(signed))
    }
}
