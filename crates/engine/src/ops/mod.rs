use std::{future::Future, pin::Pin};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{EngineError, Limits, ResultEngine, RetryPolicy};

mod access;
mod accounts;
mod movements;
mod queries;
mod users;

pub use queries::{AccountDetail, LedgerFilter};

/// Future returned by a [`Engine::with_tx`] body, borrowing the engine and the
/// open DB transaction.
type TxFuture<'a, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'a>>;

/// The ledger engine.
///
/// Holds the database handle it was built with; there is no process-wide
/// state. Share it behind an `Arc` to serve concurrent callers.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    limits: Limits,
    retry: RetryPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Runs `body` inside a DB transaction, committing on success and rolling
    /// back on error.
    ///
    /// Retryable failures (lost compare-and-swap, store lock contention)
    /// re-run `body` from scratch in a fresh transaction, up to
    /// `retry.max_attempts` attempts. When they run out the caller gets
    /// `EngineError::Conflict`.
    pub(crate) async fn with_tx<T, F>(&self, op: &'static str, mut body: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'a> FnMut(&'a Engine, &'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
    {
        let mut attempt: u32 = 1;
        loop {
            let err = match self.run_tx(&mut body).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempt >= self.retry.max_attempts {
                tracing::warn!(op, attempt, "giving up after repeated conflicts: {err}");
                return Err(EngineError::Conflict(format!(
                    "{op} could not complete because of concurrent updates, try again"
                )));
            }

            let delay = self.retry.backoff(attempt);
            tracing::warn!(op, attempt, ?delay, "retrying after conflict: {err}");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn run_tx<T, F>(&self, body: &mut F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'a> FnMut(&'a Engine, &'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
    {
        let db_tx = self.database.begin().await?;
        // Dropping `db_tx` on error rolls the transaction back.
        let value = body(self, &db_tx).await?;
        db_tx.commit().await?;
        Ok(value)
    }
}

fn validate_id(id: i64, label: &str) -> ResultEngine<()> {
    if id <= 0 {
        return Err(EngineError::InvalidOperation(format!("invalid {label} id")));
    }
    Ok(())
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidOperation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    limits: Limits,
    retry: RetryPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the per-operation minimum amounts.
    pub fn limits(mut self, limits: Limits) -> EngineBuilder {
        self.limits = limits;
        self
    }

    /// Override the conflict retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> EngineBuilder {
        self.retry = retry;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.retry.max_attempts == 0 {
            return Err(EngineError::InvalidOperation(
                "retry max_attempts must be >= 1".to_string(),
            ));
        }
        let minimums = [
            self.limits.min_deposit,
            self.limits.min_withdrawal,
            self.limits.min_transfer,
        ];
        if minimums.iter().any(|minimum| minimum.is_negative()) {
            return Err(EngineError::InvalidOperation(
                "minimum amounts must be >= 0".to_string(),
            ));
        }

        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
            limits: self.limits,
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive() {
        assert!(validate_id(1, "account").is_ok());
        assert_eq!(
            validate_id(0, "account"),
            Err(EngineError::InvalidOperation(
                "invalid account id".to_string()
            ))
        );
        assert!(validate_id(-3, "user").is_err());
    }

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(
            normalize_required_text("  Budi ", "name"),
            Ok("Budi".to_string())
        );
        assert!(normalize_required_text("   ", "name").is_err());
    }

    #[tokio::test]
    async fn build_rejects_zero_attempts() {
        let err = Engine::builder()
            .retry(RetryPolicy {
                max_attempts: 0,
                ..RetryPolicy::default()
            })
            .build()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EngineError::InvalidOperation("retry max_attempts must be >= 1".to_string())
        );
    }
}
