use crate::db::{categories, schema};
use crate::errors::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// The persistence service. Sole owner of the embedded SQLite store; every
/// read and write against the schema goes through this object.
///
/// Constructed explicitly and handed to consumers (no ambient global).
/// Lifecycle: uninitialized -> initialized -> closed, where `initialize` is
/// the only transition into "initialized" and is valid from either end
/// state. All data operations require the "initialized" state and fail with
/// [`Error::NotConnected`] otherwise.
///
/// One logical connection is shared across all callers in the process; the
/// mutex serializes overlapping async callers, so effects are applied one
/// statement (or one unit of work) at a time.
pub struct Database {
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Creates the service in the uninitialized state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conn: Mutex::new(None),
        }
    }

    /// Opens (or creates) the store at `db_path`, enables foreign-key
    /// enforcement, applies the schema, and seeds the default categories
    /// exactly once.
    ///
    /// Calling this on an already-initialized service is a no-op that
    /// succeeds without side effects.
    #[instrument(skip(self))]
    pub async fn initialize(&self, db_path: &str) -> Result<()> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            debug!("Database already initialized; initialize() is a no-op.");
            return Ok(());
        }

        debug!("Opening database at: {}", db_path);
        let mut conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("Failed to open database at {db_path}: {e}")))?;

        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(|e| Error::Database(format!("Failed to enable foreign keys: {e}")))?;

        schema::create_tables(&conn)?;
        schema::ensure_schema_version(&conn)?;
        categories::seed_default_categories(&mut conn)?;

        *guard = Some(conn);
        info!("Database initialized at {}.", db_path);
        Ok(())
    }

    /// Releases the underlying connection. Every subsequent operation fails
    /// with [`Error::NotConnected`] until `initialize` is called again.
    /// Closing an already-closed service succeeds quietly.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.lock()?;
        match guard.take() {
            Some(conn) => {
                conn.close()
                    .map_err(|(_, e)| Error::Database(format!("Failed to close database: {e}")))?;
                info!("Database connection closed.");
                Ok(())
            }
            None => {
                debug!("close() called on an unconnected database; nothing to do.");
                Ok(())
            }
        }
    }

    /// Whether the service currently holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("Connection mutex poisoned".to_string()))
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
