//! Command structs for engine operations.
//!
//! These types group parameters for the money movement operations, keeping
//! call sites readable. They are `Copy` so the engine can re-run a command
//! from scratch when its DB transaction has to be retried.

use serde::{Deserialize, Serialize};

use crate::{Account, LedgerEntry, Money};

/// Put money into one of the caller's accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositCmd {
    pub user_id: i64,
    pub account_id: i64,
    pub amount: Money,
}

impl DepositCmd {
    #[must_use]
    pub fn new(user_id: i64, account_id: i64, amount: Money) -> Self {
        Self {
            user_id,
            account_id,
            amount,
        }
    }
}

/// Take money out of one of the caller's accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawCmd {
    pub user_id: i64,
    pub account_id: i64,
    pub amount: Money,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(user_id: i64, account_id: i64, amount: Money) -> Self {
        Self {
            user_id,
            account_id,
            amount,
        }
    }
}

/// Move money from one of the caller's accounts to any account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferCmd {
    pub user_id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Money,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: i64,
        from_account_id: i64,
        to_account_id: i64,
        amount: Money,
    ) -> Self {
        Self {
            user_id,
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Result of a deposit, withdrawal or balance adjustment: the new entry and
/// the account as committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub entry: LedgerEntry,
    pub account: Account,
}

/// Result of a transfer: both legs and the source account as committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_out: LedgerEntry,
    pub transfer_in: LedgerEntry,
    pub account: Account,
}
