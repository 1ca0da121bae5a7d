use dotenvy::dotenv;
use pocketledger::errors::Result;
use pocketledger::{config, Database};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    // 3. Resolve configuration
    let app_config = config::database::load_app_configuration()?;
    info!("Using database at {}.", app_config.database_path);

    // 4. Bring the persistence service up; first run applies the schema
    //    and seeds the default categories.
    let db = Database::new();
    db.initialize(&app_config.database_path)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    let stats = db.get_migration_stats().await?;
    info!(
        "Store contains {} categories, {} transactions, {} budgets, {} goals.",
        stats.categories, stats.transactions, stats.budgets, stats.goals
    );

    db.close().await?;
    Ok(())
}
