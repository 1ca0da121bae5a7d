use thiserror::Error;

/// Unified error type for the persistence service.
///
/// Lookups that find no row are not errors: those surface as `Ok(None)`
/// (or `Ok(false)` for deletes), so callers never have to distinguish
/// "missing" from "failed" by matching variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted before `initialize()` or after `close()`.
    #[error("Database is not connected; call initialize() first")]
    NotConnected,

    /// A field failed one of the stated constraints. Carries the field name
    /// so callers can branch on which input was rejected.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A foreign-key reference did not resolve to an existing row. Kept
    /// distinct from `Validation` so callers can offer "create the category
    /// first" style recovery.
    #[error("Referential integrity violation: {0}")]
    Referential(String),

    /// A unit of work failed partway and was rolled back. The underlying
    /// cause is preserved as the source.
    #[error("Unit of work aborted and rolled back: {source}")]
    Aborted {
        #[source]
        source: Box<Error>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Wraps a failure that aborted a unit of work, preserving the cause.
    pub(crate) fn aborted(source: Error) -> Self {
        Error::Aborted {
            source: Box::new(source),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            // Classify constraint violations by extended result code so the
            // caller can tell a dangling foreign key from a bad field.
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = message
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string());
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    Error::Referential(detail)
                } else {
                    Error::Validation {
                        field: "constraint",
                        message: detail,
                    }
                }
            }
            _ => Error::Database(err.to_string()),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_key_failure_maps_to_referential() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            Some("FOREIGN KEY constraint failed".to_string()),
        );
        let err = Error::from(sqlite_err);
        assert!(matches!(err, Error::Referential(_)), "got {err:?}");
    }

    #[test]
    fn unique_failure_maps_to_validation() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            Some("UNIQUE constraint failed: categories.name".to_string()),
        );
        let err = Error::from(sqlite_err);
        assert!(matches!(err, Error::Validation { .. }), "got {err:?}");
    }

    #[test]
    fn aborted_preserves_cause() {
        let err = Error::aborted(Error::Validation {
            field: "amount",
            message: "must be positive".to_string(),
        });
        match err {
            Error::Aborted { source } => {
                assert!(matches!(
                    *source,
                    Error::Validation {
                        field: "amount",
                        ..
                    }
                ));
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }
}
