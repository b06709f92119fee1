//! The module contains the error the engine can throw.
//!
//! Every variant except [`Database`] is an expected condition the caller can
//! act on, so the request layer maps each of them to its own response:
//!
//! - [`NotFound`] an account, ledger entry or user does not exist.
//! - [`Forbidden`] the caller does not own the account.
//! - [`InsufficientFunds`] a debit exceeds the current balance.
//! - [`InvalidOperation`] bad amount, self-transfer, guarded delete, ...
//! - [`Conflict`] concurrent writers kept colliding and retries ran out.
//!
//!  [`Database`]: EngineError::Database
//!  [`NotFound`]: EngineError::NotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`InvalidOperation`]: EngineError::InvalidOperation
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when re-running the whole DB transaction may succeed.
    ///
    /// Covers lost compare-and-swap races and lock contention reported by the
    /// store. Anything else (including raw connection failures) is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::Database(err) => is_contention(err),
            _ => false,
        }
    }
}

/// SQLite `BUSY`/`LOCKED` (primary code in the low byte of extended codes)
/// and PostgreSQL serialization failure / deadlock.
fn is_contention(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return false,
    };
    let RuntimeErr::SqlxError(sqlx_err) = runtime else {
        return false;
    };
    let Some(code) = sqlx_err.as_database_error().and_then(|db| db.code()) else {
        return false;
    };
    is_contention_code(&code)
}

fn is_contention_code(code: &str) -> bool {
    match code {
        "40001" | "40P01" => true,
        other => other
            .parse::<i32>()
            .map(|value| matches!(value & 0xff, 5 | 6))
            .unwrap_or(false),
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
