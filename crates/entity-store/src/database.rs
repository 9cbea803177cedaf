//! # Database Handle & Transaction Scope
//!
//! [`Database`] owns the SQLite connection. All writes go through
//! [`Database::transaction`], which opens an `IMMEDIATE` transaction, hands
//! the closure a borrowed [`Transaction`], and commits only when the closure
//! returns `Ok`. Every other exit path (an `Err`, an early `?`, a panic)
//! releases the transaction through rollback before control returns.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::StoreError;

/// Applied to every connection before the schema.
pub const PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

const MEMORY_PATH: &str = ":memory:";

/// Connection parameters handed to the store at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
    /// How long a writer waits on a lock held by another process.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("crm.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            ..Self::default()
        }
    }
}

/// Shared SQLite connection.
/// `parking_lot::Mutex` serialises access; the store itself never runs two
/// transactions at once.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database described by `config` and apply `schema`.
    pub fn open(config: &DatabaseConfig, schema: &str) -> Result<Self, StoreError> {
        let conn = if config.path == Path::new(MEMORY_PATH) {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
            }
            Connection::open(&config.path)?
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Self::init(conn, config.path.clone(), schema)
    }

    /// Fresh in-memory database.
    pub fn in_memory(schema: &str) -> Result<Self, StoreError> {
        Self::open(&DatabaseConfig::in_memory(), schema)
    }

    fn init(conn: Connection, path: PathBuf, schema: &str) -> Result<Self, StoreError> {
        conn.execute_batch(PRAGMAS)
            .map_err(|e| StoreError::Database(format!("pragmas: {e}")))?;
        conn.execute_batch(schema)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;

        info!(path = %path.display(), "database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Run `f` against the connection outside of any explicit transaction.
    /// Meant for reads.
    pub fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside one atomic unit of work.
    ///
    /// `Ok` commits. `Err` rolls back and is returned unchanged. Must not be
    /// nested: the connection lock is held for the whole closure.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StoreError> + Display,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                warn!(error = %e, "transaction rolled back");
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
