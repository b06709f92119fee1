//! Ledger engine for a banking backend.
//!
//! The engine owns every write to account balances. Deposits, withdrawals and
//! transfers each run in a single DB transaction that reads the account rows,
//! checks ownership and sufficiency on that snapshot, swaps the balance in with
//! a version compare-and-swap and appends the matching ledger entries.
//!
//! ```no_run
//! # async fn demo(db: sea_orm::DatabaseConnection) -> Result<(), engine::EngineError> {
//! use engine::{DepositCmd, Engine, Money};
//!
//! let engine = Engine::builder().database(db).build().await?;
//! let user = engine.create_user("Budi Santoso", "budi@example.com").await?;
//! let account = engine.create_account(user.id, Money::ZERO).await?;
//! let movement = engine
//!     .deposit(DepositCmd::new(user.id, account.id, Money::new(100_000)))
//!     .await?;
//! assert_eq!(movement.account.balance.minor(), 100_000);
//! # Ok(())
//! # }
//! ```

pub use accounts::Account;
pub use commands::{DepositCmd, Movement, TransferCmd, TransferReceipt, WithdrawCmd};
pub use delta::{BalanceDelta, TransferDirection};
pub use error::EngineError;
pub use ledger::{EntryKind, LedgerEntry, Reconciliation};
pub use limits::{Limits, RetryPolicy};
pub use money::Money;
pub use ops::{AccountDetail, Engine, EngineBuilder, LedgerFilter};
pub use users::{ProfileUpdate, User};

mod accounts;
mod commands;
mod delta;
mod error;
mod ledger;
mod limits;
mod money;
mod ops;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
