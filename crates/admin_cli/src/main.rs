use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{DepositCmd, Engine, EngineError, Money, TransferCmd, WithdrawCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "bank_admin")]
#[command(about = "Admin utilities for the bank ledger (bootstrap users/accounts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./bank.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Account(Account),
    /// Fill an empty database with demo users, accounts and movements.
    Seed,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Open(AccountOpenArgs),
    Reconcile(AccountReconcileArgs),
}

#[derive(Args, Debug)]
struct AccountOpenArgs {
    #[arg(long)]
    user_id: i64,
    /// Opening balance in minor units, `,` separators allowed (e.g. `1,500,000`).
    #[arg(long, default_value = "0")]
    balance: Money,
}

#[derive(Args, Debug)]
struct AccountReconcileArgs {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    account_id: i64,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

struct SeedUser {
    name: &'static str,
    email: &'static str,
    /// Opening balances of the user's accounts.
    accounts: &'static [i64],
}

const SEED_USERS: [SeedUser; 4] = [
    SeedUser {
        name: "Budi Santoso",
        email: "budi.santoso@gmail.com",
        accounts: &[5_000_000, 1_500_000],
    },
    SeedUser {
        name: "Sari Wijaya",
        email: "sari.wijaya@gmail.com",
        accounts: &[3_250_000],
    },
    SeedUser {
        name: "Agus Pratama",
        email: "agus.pratama@gmail.com",
        accounts: &[8_750_000],
    },
    SeedUser {
        name: "Admin RevoBank",
        email: "admin.revobank@gmail.com",
        accounts: &[50_000_000],
    },
];

async fn seed(engine: &Engine) -> Result<(), Box<dyn Error + Send + Sync>> {
    // (user_id, account_id) per seeded account, in creation order.
    let mut opened = Vec::new();
    for seed_user in &SEED_USERS {
        let user = match engine.create_user(seed_user.name, seed_user.email).await {
            Ok(user) => user,
            Err(EngineError::InvalidOperation(msg)) => {
                eprintln!("cannot seed {}: {msg}", seed_user.email);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        };
        for balance in seed_user.accounts {
            let account = engine.create_account(user.id, Money::new(*balance)).await?;
            opened.push((user.id, account.id));
        }
    }

    let &[budi_main, budi_savings, sari, agus, admin] = &opened[..] else {
        return Err("unexpected number of seeded accounts".into());
    };

    engine
        .deposit(DepositCmd::new(budi_main.0, budi_main.1, Money::new(1_000_000)))
        .await?;
    engine
        .withdraw(WithdrawCmd::new(budi_main.0, budi_main.1, Money::new(250_000)))
        .await?;
    engine
        .transfer(TransferCmd::new(
            budi_main.0,
            budi_main.1,
            budi_savings.1,
            Money::new(500_000),
        ))
        .await?;
    engine
        .deposit(DepositCmd::new(sari.0, sari.1, Money::new(400_000)))
        .await?;
    engine
        .withdraw(WithdrawCmd::new(sari.0, sari.1, Money::new(150_000)))
        .await?;
    engine
        .deposit(DepositCmd::new(agus.0, agus.1, Money::new(2_500_000)))
        .await?;
    engine
        .withdraw(WithdrawCmd::new(agus.0, agus.1, Money::new(750_000)))
        .await?;
    engine
        .transfer(TransferCmd::new(agus.0, agus.1, admin.1, Money::new(1_000_000)))
        .await?;

    for (user_id, account_id) in opened {
        let reconciliation = engine.reconcile(user_id, account_id).await?;
        println!(
            "account {account_id} (user {user_id}): balance {}",
            reconciliation.stored_balance
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let user = match engine.create_user(&args.name, &args.email).await {
                Ok(user) => user,
                Err(EngineError::InvalidOperation(msg)) => {
                    eprintln!("{msg}");
                    std::process::exit(2);
                }
                Err(err) => return Err(err.into()),
            };
            println!("created user: {} ({})", user.email, user.id);
        }
        Command::Account(Account {
            command: AccountCommand::Open(args),
        }) => {
            let account = match engine.create_account(args.user_id, args.balance).await {
                Ok(account) => account,
                Err(EngineError::NotFound(_)) => {
                    eprintln!("user not found: {}", args.user_id);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };
            println!(
                "opened account {} for user {} with balance {}",
                account.id, account.user_id, account.balance
            );
        }
        Command::Account(Account {
            command: AccountCommand::Reconcile(args),
        }) => {
            let reconciliation = engine.reconcile(args.user_id, args.account_id).await?;
            println!(
                "stored {} / ledger {} over {} entries",
                reconciliation.stored_balance, reconciliation.ledger_balance, reconciliation.entries
            );
            if !reconciliation.is_balanced() {
                std::process::exit(3);
            }
        }
        Command::Seed => seed(&engine).await?,
    }

    Ok(())
}
