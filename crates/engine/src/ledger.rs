//! Ledger entries.
//!
//! A [`LedgerEntry`] is an immutable record of a single monetary event on one
//! account. Amounts are stored as positive minor units; the [`EntryKind`]
//! carries the direction.
//!
//! The store is append-only: the engine has no code path that updates or
//! deletes a row of `ledger_entries`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::TransferOut => "TRANSFER_OUT",
            Self::TransferIn => "TRANSFER_IN",
        }
    }

    /// `true` for kinds that increase the balance.
    pub fn is_credit(self) -> bool {
        matches!(self, Self::Deposit | Self::TransferIn)
    }

    /// The amount with the sign this kind applies to a balance.
    pub fn signed(self, amount: Money) -> Money {
        if self.is_credit() { amount } else { -amount }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAWAL" => Ok(Self::Withdrawal),
            "TRANSFER_OUT" => Ok(Self::TransferOut),
            "TRANSFER_IN" => Ok(Self::TransferIn),
            other => Err(EngineError::InvalidOperation(format!(
                "invalid ledger entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: i64,
    pub kind: EntryKind,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub kind: String,
    pub amount_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn append(
        account_id: i64,
        kind: EntryKind,
        amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(account_id),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(amount.minor()),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            created_at: model.created_at,
        })
    }
}

/// Stored balance of an account next to the balance derived from its ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub account_id: i64,
    pub stored_balance: Money,
    pub ledger_balance: Money,
    pub entries: u64,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.stored_balance == self.ledger_balance
    }
}

/// `sum(DEPOSIT + TRANSFER_IN) - sum(WITHDRAWAL + TRANSFER_OUT)`.
pub(crate) fn ledger_balance<I>(entries: I) -> Money
where
    I: IntoIterator<Item = (EntryKind, Money)>,
{
    entries
        .into_iter()
        .fold(Money::ZERO, |acc, (kind, amount)| acc + kind.signed(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_storage_string() {
        for kind in [
            EntryKind::Deposit,
            EntryKind::Withdrawal,
            EntryKind::TransferOut,
            EntryKind::TransferIn,
        ] {
            assert_eq!(EntryKind::try_from(kind.as_str()), Ok(kind));
        }
        assert!(EntryKind::try_from("deposit").is_err());
    }

    #[test]
    fn ledger_balance_nets_credits_and_debits() {
        let entries = [
            (EntryKind::Deposit, Money::new(500_000)),
            (EntryKind::Deposit, Money::new(100_000)),
            (EntryKind::TransferOut, Money::new(250_000)),
            (EntryKind::TransferIn, Money::new(1_000)),
            (EntryKind::Withdrawal, Money::new(50_000)),
        ];

        assert_eq!(ledger_balance(entries), Money::new(301_000));
        assert_eq!(ledger_balance([]), Money::ZERO);
    }
}
