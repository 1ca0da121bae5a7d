use crate::db::system_state;
use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

/// Version of the DDL below, recorded in `system_state` so a later release
/// can migrate instead of guessing from table shapes.
pub(crate) const SCHEMA_VERSION: i32 = 1;

const SCHEMA_VERSION_KEY: &str = "schema_version";

#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL,
            icon TEXT NOT NULL,
            is_default BOOLEAN NOT NULL DEFAULT FALSE,
            created_at DATETIME NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount INTEGER NOT NULL,
            description TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            transaction_type TEXT NOT NULL CHECK (transaction_type IN ('expense', 'income')),
            date TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories (id)
        );

        -- The list surface orders by date descending; keep that cheap.
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
        CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

        CREATE TABLE IF NOT EXISTS budgets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            period_start TEXT NOT NULL,
            period_end TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories (id)
        );

        CREATE TABLE IF NOT EXISTS goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            target_amount INTEGER NOT NULL,
            current_amount INTEGER NOT NULL DEFAULT 0,
            description TEXT NOT NULL,
            target_date TEXT,
            is_completed BOOLEAN NOT NULL DEFAULT FALSE
        );

        CREATE TABLE IF NOT EXISTS system_state ( key TEXT PRIMARY KEY, value TEXT );
        COMMIT;",
    )
    .map_err(|e| Error::Database(format!("Failed to create tables: {e}")))?;
    info!("Database tables ensured.");
    Ok(())
}

/// Records the schema version on a fresh store and refuses to operate on a
/// store written by a different version.
#[instrument(skip(conn))]
pub(crate) fn ensure_schema_version(conn: &Connection) -> Result<()> {
    match system_state::get_system_state_value(conn, SCHEMA_VERSION_KEY)? {
        None => {
            system_state::set_system_state_value(
                conn,
                SCHEMA_VERSION_KEY,
                &SCHEMA_VERSION.to_string(),
            )?;
            Ok(())
        }
        Some(stored) if stored == SCHEMA_VERSION.to_string() => Ok(()),
        Some(stored) => Err(Error::Database(format!(
            "Unsupported schema version {stored}; this build expects {SCHEMA_VERSION}"
        ))),
    }
}
