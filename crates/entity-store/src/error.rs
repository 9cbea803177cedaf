//! # Store Errors
//!
//! Every failure raised by the store is a [`StoreError`]. Constraint failures
//! reported by SQLite are classified by their extended result code so that the
//! layers above can tell a duplicate email apart from a blocked delete without
//! parsing messages.

use rusqlite::ffi;

/// Errors raised by the generic entity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} violates a uniqueness constraint: {detail}")]
    UniquenessViolation {
        entity: &'static str,
        detail: String,
    },

    #[error("{entity} is still referenced: {detail}")]
    ReferentialIntegrityViolation {
        entity: &'static str,
        detail: String,
    },

    #[error("unknown column {column} for {entity}")]
    UnknownColumn {
        entity: &'static str,
        column: String,
    },

    #[error("corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        table: &'static str,
        column: &'static str,
        detail: String,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(String),
}

impl StoreError {
    /// Classify a driver error raised while writing `entity`.
    pub fn from_sqlite(err: rusqlite::Error, entity: &'static str) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            let detail = message.clone().unwrap_or_else(|| code.to_string());
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::UniquenessViolation { entity, detail };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::ReferentialIntegrityViolation { entity, detail };
                }
                _ => {}
            }
        }
        Self::Database(err.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from_sqlite(err, "row")
    }
}
