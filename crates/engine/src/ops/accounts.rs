use std::cmp::Ordering;

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, prelude::*};

use crate::{Account, BalanceDelta, EngineError, Money, Movement, ResultEngine, accounts, ledger};

use super::{Engine, validate_id};

impl Engine {
    /// Opens an account for `user_id`.
    ///
    /// A positive `opening_balance` is booked as a `DEPOSIT` entry in the same
    /// DB transaction, so the account reconciles from the start.
    pub async fn create_account(
        &self,
        user_id: i64,
        opening_balance: Money,
    ) -> ResultEngine<Account> {
        validate_id(user_id, "user")?;
        if opening_balance.is_negative() {
            return Err(EngineError::InvalidOperation(
                "balance must be >= 0".to_string(),
            ));
        }

        let account = self
            .with_tx::<Account, _>("create_account", move |engine, db_tx| {
                Box::pin(engine.create_account_in_tx(db_tx, user_id, opening_balance))
            })
            .await?;
        tracing::debug!(account_id = account.id, user_id, "account opened");
        Ok(account)
    }

    /// Deletes an empty account that never had any activity.
    pub async fn remove_account(&self, user_id: i64, account_id: i64) -> ResultEngine<()> {
        validate_id(user_id, "user")?;
        validate_id(account_id, "account")?;

        self.with_tx::<(), _>("remove_account", move |engine, db_tx| {
            Box::pin(engine.remove_account_in_tx(db_tx, user_id, account_id))
        })
        .await?;
        tracing::debug!(account_id, user_id, "account removed");
        Ok(())
    }

    /// Brings the balance to `target` by booking the difference.
    ///
    /// A higher target books a `DEPOSIT`, a lower one a `WITHDRAWAL`. The
    /// movement minimums do not apply. Returns `None` when the balance
    /// already equals `target`.
    pub async fn adjust_balance(
        &self,
        user_id: i64,
        account_id: i64,
        target: Money,
    ) -> ResultEngine<Option<Movement>> {
        validate_id(user_id, "user")?;
        validate_id(account_id, "account")?;
        if target.is_negative() {
            return Err(EngineError::InvalidOperation(
                "balance must be >= 0".to_string(),
            ));
        }

        let movement = self
            .with_tx::<Option<Movement>, _>("adjust_balance", move |engine, db_tx| {
                Box::pin(engine.adjust_balance_in_tx(db_tx, user_id, account_id, target))
            })
            .await?;
        if let Some(movement) = &movement {
            tracing::debug!(
                account_id,
                entry_id = movement.entry.id,
                "balance adjusted to {target}"
            );
        }
        Ok(movement)
    }

    async fn create_account_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        opening_balance: Money,
    ) -> ResultEngine<Account> {
        self.require_user(db_tx, user_id).await?;

        let now = Utc::now();
        let model = accounts::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            balance: ActiveValue::Set(0),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(db_tx)
        .await?;

        if !opening_balance.is_positive() {
            return Ok(model.into());
        }
        let opening = BalanceDelta::Deposit {
            amount: opening_balance,
        };
        let movement = self.apply_delta(db_tx, model, opening, now).await?;
        Ok(movement.account)
    }

    async fn remove_account_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        account_id: i64,
    ) -> ResultEngine<()> {
        let model = self
            .require_owned_account(db_tx, user_id, account_id)
            .await?;

        let entries = ledger::Entity::find()
            .filter(ledger::Column::AccountId.eq(account_id))
            .count(db_tx)
            .await?;
        if entries > 0 {
            return Err(EngineError::InvalidOperation(
                "cannot delete account with existing transactions".to_string(),
            ));
        }
        if !model.balance().is_zero() {
            return Err(EngineError::InvalidOperation(
                "cannot delete account with non-zero balance".to_string(),
            ));
        }

        let deleted = accounts::Entity::delete_many()
            .filter(accounts::Column::Id.eq(account_id))
            .filter(accounts::Column::Version.eq(model.version))
            .exec(db_tx)
            .await?;
        if deleted.rows_affected != 1 {
            return Err(EngineError::Conflict(format!(
                "account {account_id} was modified concurrently"
            )));
        }
        Ok(())
    }

    async fn adjust_balance_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        account_id: i64,
        target: Money,
    ) -> ResultEngine<Option<Movement>> {
        let model = self
            .require_owned_account(db_tx, user_id, account_id)
            .await?;
        let current = model.balance();

        let delta = match target.cmp(&current) {
            Ordering::Equal => return Ok(None),
            Ordering::Greater => BalanceDelta::Deposit {
                amount: target - current,
            },
            Ordering::Less => BalanceDelta::Withdraw {
                amount: current - target,
            },
        };
        self.apply_delta(db_tx, model, delta, Utc::now())
            .await
            .map(Some)
    }
}
