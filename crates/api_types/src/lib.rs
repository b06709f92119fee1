use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i64,
        pub name: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
    }

    /// Request body for `PATCH /user/profile`. Absent fields are unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub email: Option<String>,
    }
}

pub mod account {
    use super::*;

    use crate::transaction::LedgerEntryView;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountNew {
        /// Opening balance in minor units. Must be >= 0, defaults to 0.
        #[serde(default)]
        pub balance_minor: i64,
    }

    /// Request body for `PATCH /accounts/{id}`.
    ///
    /// The server books the difference to the current balance as a ledger
    /// entry; the balance is never overwritten.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub user_id: i64,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountDetailView {
        pub account: AccountView,
        /// Latest entries, newest first.
        pub recent_transactions: Vec<LedgerEntryView>,
    }

    /// Response body for `GET /accounts`: each account with its latest
    /// entries.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountDetailView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub account_id: i64,
        pub balance_minor: i64,
    }

    /// Response body for `PATCH /accounts/{id}`. `transaction` is absent when
    /// the balance already had the requested value.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountAdjusted {
        pub account: AccountView,
        pub transaction: Option<LedgerEntryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationView {
        pub account_id: i64,
        pub stored_balance_minor: i64,
        pub ledger_balance_minor: i64,
        pub entries: u64,
        pub balanced: bool,
    }
}

pub mod transaction {
    use super::*;

    use crate::account::AccountView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum EntryKind {
        Deposit,
        Withdrawal,
        TransferOut,
        TransferIn,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub account_id: i64,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawNew {
        pub account_id: i64,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: i64,
        pub to_account_id: i64,
        pub amount_minor: i64,
    }

    /// Query string of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub account_id: Option<i64>,
        pub kind: Option<EntryKind>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub id: i64,
        pub account_id: i64,
        pub kind: EntryKind,
        /// Always positive; `kind` carries the direction.
        pub amount_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<LedgerEntryView>,
    }

    /// Response body of a deposit or a withdrawal.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementView {
        pub transaction: LedgerEntryView,
        pub account: AccountView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub transfer_out: LedgerEntryView,
        pub transfer_in: LedgerEntryView,
        /// The source account after the transfer.
        pub account: AccountView,
    }
}
