use sea_orm::{
    ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    Account, EngineError, EntryKind, LedgerEntry, Money, Reconciliation, ResultEngine, accounts,
    ledger,
};

use super::{Engine, access::require_owner, validate_id};

/// An account together with its most recent ledger entries, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub account: Account,
    pub recent_entries: Vec<LedgerEntry>,
}

/// Filters for listing a user's ledger entries.
#[derive(Clone, Debug, Default)]
pub struct LedgerFilter {
    /// Restrict to one of the user's accounts.
    pub account_id: Option<i64>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<EntryKind>>,
    pub limit: Option<u64>,
}

fn validate_filter(filter: &LedgerFilter) -> ResultEngine<()> {
    if let Some(account_id) = filter.account_id {
        validate_id(account_id, "account")?;
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidOperation(
            "kinds must not be empty".to_string(),
        ));
    }
    if filter.limit == Some(0) {
        return Err(EngineError::InvalidOperation(
            "limit must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn entries_from_models(models: Vec<ledger::Model>) -> ResultEngine<Vec<LedgerEntry>> {
    models.into_iter().map(LedgerEntry::try_from).collect()
}

impl Engine {
    pub async fn account(&self, user_id: i64, account_id: i64) -> ResultEngine<Account> {
        validate_id(user_id, "user")?;
        validate_id(account_id, "account")?;
        let model = self
            .require_owned_account(&self.database, user_id, account_id)
            .await?;
        Ok(model.into())
    }

    pub async fn balance(&self, user_id: i64, account_id: i64) -> ResultEngine<Money> {
        self.account(user_id, account_id)
            .await
            .map(|account| account.balance)
    }

    /// Returns the account with up to `recent` of its latest entries.
    pub async fn account_detail(
        &self,
        user_id: i64,
        account_id: i64,
        recent: u64,
    ) -> ResultEngine<AccountDetail> {
        validate_id(user_id, "user")?;
        validate_id(account_id, "account")?;

        self.with_tx::<AccountDetail, _>("account_detail", move |engine, db_tx| {
            Box::pin(engine.account_detail_in_tx(db_tx, user_id, account_id, recent))
        })
        .await
    }

    /// Accounts owned by `user_id`, ordered by id, each with up to `recent`
    /// of its latest entries.
    pub async fn list_accounts(
        &self,
        user_id: i64,
        recent: u64,
    ) -> ResultEngine<Vec<AccountDetail>> {
        validate_id(user_id, "user")?;

        self.with_tx::<Vec<AccountDetail>, _>("list_accounts", move |engine, db_tx| {
            Box::pin(engine.list_accounts_in_tx(db_tx, user_id, recent))
        })
        .await
    }

    /// Entries across all of the user's accounts, newest first.
    pub async fn list_transactions(&self, user_id: i64) -> ResultEngine<Vec<LedgerEntry>> {
        self.list_transactions_filtered(user_id, &LedgerFilter::default())
            .await
    }

    pub async fn list_transactions_filtered(
        &self,
        user_id: i64,
        filter: &LedgerFilter,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        validate_id(user_id, "user")?;
        validate_filter(filter)?;

        if let Some(account_id) = filter.account_id {
            self.require_owned_account(&self.database, user_id, account_id)
                .await?;
        }

        let mut query = ledger::Entity::find()
            .inner_join(accounts::Entity)
            .filter(accounts::Column::UserId.eq(user_id));
        if let Some(account_id) = filter.account_id {
            query = query.filter(ledger::Column::AccountId.eq(account_id));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            query = query.filter(ledger::Column::Kind.is_in(kinds));
        }
        query = query
            .order_by_desc(ledger::Column::CreatedAt)
            .order_by_desc(ledger::Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        entries_from_models(query.all(&self.database).await?)
    }

    /// A single entry, only visible to the owner of its account.
    pub async fn transaction(&self, user_id: i64, entry_id: i64) -> ResultEngine<LedgerEntry> {
        validate_id(user_id, "user")?;
        validate_id(entry_id, "transaction")?;

        let (entry, account) = ledger::Entity::find_by_id(entry_id)
            .find_also_related(accounts::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))?;
        let account = account.ok_or_else(|| EngineError::NotFound("account".to_string()))?;
        require_owner(&account, user_id)?;

        LedgerEntry::try_from(entry)
    }

    /// Compares the stored balance with the balance derived from the ledger.
    pub async fn reconcile(&self, user_id: i64, account_id: i64) -> ResultEngine<Reconciliation> {
        validate_id(user_id, "user")?;
        validate_id(account_id, "account")?;

        let reconciliation = self
            .with_tx::<Reconciliation, _>("reconcile", move |engine, db_tx| {
                Box::pin(engine.reconcile_in_tx(db_tx, user_id, account_id))
            })
            .await?;
        if !reconciliation.is_balanced() {
            tracing::error!(
                account_id,
                stored = %reconciliation.stored_balance,
                ledger = %reconciliation.ledger_balance,
                "account does not reconcile with its ledger"
            );
        }
        Ok(reconciliation)
    }

    async fn account_detail_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        account_id: i64,
        recent: u64,
    ) -> ResultEngine<AccountDetail> {
        let model = self
            .require_owned_account(db_tx, user_id, account_id)
            .await?;
        let recent_entries = self.recent_entries(db_tx, account_id, recent).await?;

        Ok(AccountDetail {
            account: model.into(),
            recent_entries,
        })
    }

    async fn list_accounts_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        recent: u64,
    ) -> ResultEngine<Vec<AccountDetail>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::Id)
            .all(db_tx)
            .await?;

        let mut details = Vec::with_capacity(models.len());
        for model in models {
            let recent_entries = self.recent_entries(db_tx, model.id, recent).await?;
            details.push(AccountDetail {
                account: model.into(),
                recent_entries,
            });
        }
        Ok(details)
    }

    /// Up to `recent` entries of the account, newest first.
    async fn recent_entries<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        recent: u64,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        if recent == 0 {
            return Ok(Vec::new());
        }
        let models = ledger::Entity::find()
            .filter(ledger::Column::AccountId.eq(account_id))
            .order_by_desc(ledger::Column::CreatedAt)
            .order_by_desc(ledger::Column::Id)
            .limit(recent)
            .all(db)
            .await?;
        entries_from_models(models)
    }

    async fn reconcile_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        account_id: i64,
    ) -> ResultEngine<Reconciliation> {
        let model = self
            .require_owned_account(db_tx, user_id, account_id)
            .await?;
        let entries = self.account_entries(db_tx, account_id).await?;

        Ok(Reconciliation {
            account_id,
            stored_balance: model.balance(),
            ledger_balance: ledger::ledger_balance(
                entries.iter().map(|entry| (entry.kind, entry.amount)),
            ),
            entries: entries.len() as u64,
        })
    }

    async fn account_entries<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let models = ledger::Entity::find()
            .filter(ledger::Column::AccountId.eq(account_id))
            .order_by_asc(ledger::Column::Id)
            .all(db)
            .await?;
        entries_from_models(models)
    }
}
