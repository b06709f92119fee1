use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bank={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = &settings.server;
    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await.map_err(|err| {
        tracing::error!("failed to initialize database: {err}");
        err
    })?;

    let engine = engine::Engine::builder()
        .database(db)
        .limits(settings.limits)
        .retry((&settings.retry).into())
        .build()
        .await
        .map_err(|err| {
            tracing::error!("failed to build engine from database: {err}");
            err
        })?;

    let bind = server.bind.as_deref().unwrap_or("127.0.0.1");
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        tracing::error!("failed to bind server listener: {err}");
        err
    })?;

    server::run_with_listener(engine, listener).await?;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
