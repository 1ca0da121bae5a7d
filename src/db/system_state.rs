use crate::errors::Result;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// Retrieves a value from the key-value `system_state` table.
///
/// This table holds persistent service-level metadata: the schema version
/// and the default-category seed guard. It is never touched by
/// `clear_all_data`, which is what keeps a bulk delete from looking like a
/// first run.
///
/// Returns `Ok(None)` if the key does not exist.
pub(crate) fn get_system_state_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare_cached("SELECT value FROM system_state WHERE key = ?1")?;
    let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    debug!("System state for key '{}': {:?}", key, value);
    Ok(value)
}

/// Sets or updates a value in the `system_state` table (UPSERT).
pub(crate) fn set_system_state_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO system_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    debug!("Set system state: {} = {}", key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory database");
        schema::create_tables(&conn).expect("schema");
        conn
    }

    #[test]
    fn set_and_get_new_key() -> Result<()> {
        let conn = test_conn();
        set_system_state_value(&conn, "marker", "1")?;
        assert_eq!(
            get_system_state_value(&conn, "marker")?,
            Some("1".to_string())
        );
        Ok(())
    }

    #[test]
    fn set_updates_existing_key() -> Result<()> {
        let conn = test_conn();
        set_system_state_value(&conn, "marker", "1")?;
        set_system_state_value(&conn, "marker", "2")?;
        assert_eq!(
            get_system_state_value(&conn, "marker")?,
            Some("2".to_string())
        );
        Ok(())
    }

    #[test]
    fn get_missing_key_is_none() -> Result<()> {
        let conn = test_conn();
        assert!(get_system_state_value(&conn, "absent")?.is_none());
        Ok(())
    }
}
