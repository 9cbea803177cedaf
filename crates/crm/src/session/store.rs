//! Where the current session token lives between commands.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::CrmError;

/// Persistence for the single active token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, CrmError>;
    fn save(&self, token: &str) -> Result<(), CrmError>;
    /// Removing an absent token is not an error.
    fn clear(&self) -> Result<(), CrmError>;
}

/// Token kept in a file readable only by its owner.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CrmError {
    CrmError::Storage(format!("{action} {}: {err}", path.display()))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, CrmError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read token", &self.path, e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), CrmError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create dir", parent, e))?;
        }
        std::fs::write(&self.path, token).map_err(|e| io_error("write token", &self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| io_error("restrict token", &self.path, e))?;
        }

        debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CrmError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "token removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove token", &self.path, e)),
        }
    }
}

/// In-process token slot, for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, CrmError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), CrmError> {
        *self.slot.lock() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), CrmError> {
        self.slot.lock().take();
        Ok(())
    }
}
