use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};

use crate::{
    Account, BalanceDelta, DepositCmd, EngineError, LedgerEntry, Movement, ResultEngine,
    TransferCmd, TransferDirection, TransferReceipt, WithdrawCmd, accounts, ledger,
};

use super::{Engine, access::require_owner, validate_id};

impl Engine {
    /// Deposits `cmd.amount` into one of the caller's accounts.
    pub async fn deposit(&self, cmd: DepositCmd) -> ResultEngine<Movement> {
        validate_id(cmd.user_id, "user")?;
        validate_id(cmd.account_id, "account")?;
        self.limits.check_deposit(cmd.amount)?;

        let movement = self
            .with_tx::<Movement, _>("deposit", move |engine, db_tx| {
                Box::pin(engine.deposit_in_tx(db_tx, cmd))
            })
            .await?;
        tracing::debug!(
            account_id = cmd.account_id,
            entry_id = movement.entry.id,
            "deposited {}",
            cmd.amount
        );
        Ok(movement)
    }

    /// Withdraws `cmd.amount` from one of the caller's accounts.
    ///
    /// Sufficiency is checked against the balance read inside the same DB
    /// transaction that writes the new balance.
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<Movement> {
        validate_id(cmd.user_id, "user")?;
        validate_id(cmd.account_id, "account")?;
        self.limits.check_withdrawal(cmd.amount)?;

        let movement = self
            .with_tx::<Movement, _>("withdraw", move |engine, db_tx| {
                Box::pin(engine.withdraw_in_tx(db_tx, cmd))
            })
            .await?;
        tracing::debug!(
            account_id = cmd.account_id,
            entry_id = movement.entry.id,
            "withdrew {}",
            cmd.amount
        );
        Ok(movement)
    }

    /// Moves `cmd.amount` from one of the caller's accounts to any account.
    ///
    /// Debit, credit and both ledger entries commit together or not at all.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        validate_id(cmd.user_id, "user")?;
        validate_id(cmd.from_account_id, "source account")?;
        validate_id(cmd.to_account_id, "destination account")?;
        if cmd.from_account_id == cmd.to_account_id {
            return Err(EngineError::InvalidOperation(
                "cannot transfer to the same account".to_string(),
            ));
        }
        self.limits.check_transfer(cmd.amount)?;

        let receipt = self
            .with_tx::<TransferReceipt, _>("transfer", move |engine, db_tx| {
                Box::pin(engine.transfer_in_tx(db_tx, cmd))
            })
            .await?;
        tracing::debug!(
            from_account_id = cmd.from_account_id,
            to_account_id = cmd.to_account_id,
            "transferred {}",
            cmd.amount
        );
        Ok(receipt)
    }

    async fn deposit_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: DepositCmd,
    ) -> ResultEngine<Movement> {
        let model = self
            .require_owned_account(db_tx, cmd.user_id, cmd.account_id)
            .await?;
        self.apply_delta(
            db_tx,
            model,
            BalanceDelta::Deposit { amount: cmd.amount },
            Utc::now(),
        )
        .await
    }

    async fn withdraw_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: WithdrawCmd,
    ) -> ResultEngine<Movement> {
        let model = self
            .require_owned_account(db_tx, cmd.user_id, cmd.account_id)
            .await?;
        self.apply_delta(
            db_tx,
            model,
            BalanceDelta::Withdraw { amount: cmd.amount },
            Utc::now(),
        )
        .await
    }

    async fn transfer_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: TransferCmd,
    ) -> ResultEngine<TransferReceipt> {
        let from = self
            .require_account(db_tx, cmd.from_account_id, "source account")
            .await?;
        let to = self
            .require_account(db_tx, cmd.to_account_id, "destination account")
            .await?;
        require_owner(&from, cmd.user_id)?;

        let debit = BalanceDelta::TransferLeg {
            amount: cmd.amount,
            direction: TransferDirection::Out,
        };
        let credit = BalanceDelta::TransferLeg {
            amount: cmd.amount,
            direction: TransferDirection::In,
        };
        debit.apply(from.balance())?;

        let now = Utc::now();
        // Rows are always written in ascending id order.
        let (out_leg, in_leg) = if from.id < to.id {
            let out_leg = self.apply_delta(db_tx, from, debit, now).await?;
            let in_leg = self.apply_delta(db_tx, to, credit, now).await?;
            (out_leg, in_leg)
        } else {
            let in_leg = self.apply_delta(db_tx, to, credit, now).await?;
            let out_leg = self.apply_delta(db_tx, from, debit, now).await?;
            (out_leg, in_leg)
        };

        Ok(TransferReceipt {
            transfer_out: out_leg.entry,
            transfer_in: in_leg.entry,
            account: out_leg.account,
        })
    }

    /// Applies `delta` to the account row read as `model` and appends the
    /// matching ledger entry.
    ///
    /// The balance write is a compare-and-swap on `version`: if another writer
    /// committed since `model` was read, nothing is written and the call fails
    /// with `Conflict`, which makes the surrounding transaction retry.
    pub(super) async fn apply_delta(
        &self,
        db_tx: &DatabaseTransaction,
        model: accounts::Model,
        delta: BalanceDelta,
        now: DateTime<Utc>,
    ) -> ResultEngine<Movement> {
        let balance = delta.apply(model.balance())?;

        let updated = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance.minor()))
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(model.id))
            .filter(accounts::Column::Version.eq(model.version))
            .exec(db_tx)
            .await?;
        if updated.rows_affected != 1 {
            return Err(EngineError::Conflict(format!(
                "account {} was modified concurrently",
                model.id
            )));
        }

        let entry = ledger::ActiveModel::append(model.id, delta.entry_kind(), delta.amount(), now)
            .insert(db_tx)
            .await?;

        Ok(Movement {
            entry: LedgerEntry::try_from(entry)?,
            account: Account {
                id: model.id,
                user_id: model.user_id,
                balance,
                created_at: model.created_at,
                updated_at: now,
            },
        })
    }
}
