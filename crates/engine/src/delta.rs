//! Balance deltas.
//!
//! A [`BalanceDelta`] is the only way a balance changes. Each variant maps to
//! exactly one [`EntryKind`], so applying a delta and appending its ledger
//! entry always go together.

use crate::{EngineError, EntryKind, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    /// Debit on the source account.
    Out,
    /// Credit on the destination account.
    In,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceDelta {
    Deposit {
        amount: Money,
    },
    Withdraw {
        amount: Money,
    },
    TransferLeg {
        amount: Money,
        direction: TransferDirection,
    },
}

impl BalanceDelta {
    pub fn amount(self) -> Money {
        match self {
            Self::Deposit { amount }
            | Self::Withdraw { amount }
            | Self::TransferLeg { amount, .. } => amount,
        }
    }

    pub fn entry_kind(self) -> EntryKind {
        match self {
            Self::Deposit { .. } => EntryKind::Deposit,
            Self::Withdraw { .. } => EntryKind::Withdrawal,
            Self::TransferLeg {
                direction: TransferDirection::Out,
                ..
            } => EntryKind::TransferOut,
            Self::TransferLeg {
                direction: TransferDirection::In,
                ..
            } => EntryKind::TransferIn,
        }
    }

    /// Computes the balance after this delta.
    ///
    /// Fails with `InsufficientFunds` when a debit exceeds `balance` and with
    /// `InvalidOperation` on a non-positive amount or a credit overflowing
    /// the balance.
    pub fn apply(self, balance: Money) -> ResultEngine<Money> {
        let amount = self.amount();
        if !amount.is_positive() {
            return Err(EngineError::InvalidOperation(
                "amount must be > 0".to_string(),
            ));
        }

        if self.entry_kind().is_credit() {
            balance
                .checked_add(amount)
                .ok_or_else(|| EngineError::InvalidOperation("balance overflow".to_string()))
        } else {
            if amount > balance {
                return Err(EngineError::InsufficientFunds(format!(
                    "balance is {balance}, requested {amount}"
                )));
            }
            Ok(balance - amount)
        }
    }
}
