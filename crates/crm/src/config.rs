//! Application configuration, read from TOML.
//!
//! ```toml
//! [database]
//! path = "crm.db"
//!
//! [session]
//! secret = "change-me"
//! token_ttl_minutes = 30
//! ```
//!
//! Every key is optional except `session.secret`, which
//! [`SessionManager::new`](crate::session::SessionManager::new) insists on.

use std::path::{Path, PathBuf};

use entity_store::DatabaseConfig;
use serde::Deserialize;

use crate::session::SessionConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl CrmConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },
}
