use crate::db::Database;
use crate::errors::Result;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer() // Crucial for `cargo test` output
        .try_init(); // Use try_init to avoid panic if already initialized
}

/// Fresh in-memory service for a test: fully initialized, schema applied,
/// nine default categories seeded.
pub(crate) async fn setup_test_db() -> Result<Database> {
    let db = Database::new();
    db.initialize(":memory:").await?;
    Ok(db)
}
