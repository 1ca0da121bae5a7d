//! Application configuration.
//!
//! The service itself takes the database path as an explicit argument to
//! `initialize`; this module only decides what that path is for the binary,
//! from the environment with a local-file fallback.

use crate::errors::Result;

const DATABASE_PATH_VAR: &str = "POCKETLEDGER_DB_PATH";
const DEFAULT_DATABASE_PATH: &str = "pocketledger.sqlite";

/// Settings resolved at process startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Filesystem path of the SQLite database file.
    pub database_path: String,
}

/// Loads configuration from the environment.
///
/// Looks for `POCKETLEDGER_DB_PATH` and falls back to a local SQLite file
/// next to the working directory if not set. `.env` loading (via `dotenvy`)
/// is the binary's responsibility and happens before this is called.
pub fn load_app_configuration() -> Result<AppConfig> {
    let database_path =
        std::env::var(DATABASE_PATH_VAR).unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
    Ok(AppConfig { database_path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_path() {
        // Serialize around the process environment: no other test touches
        // this variable, so removal is safe here.
        std::env::remove_var(DATABASE_PATH_VAR);
        let config = load_app_configuration().unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
    }
}
