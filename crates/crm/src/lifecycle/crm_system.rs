use std::sync::Arc;

use entity_store::Database;
use tracing::info;

use crate::config::CrmConfig;
use crate::error::CrmError;
use crate::schema::CREATE_TABLES;
use crate::services::{ContractService, CustomerService, EmployeeService, EventService};
use crate::session::{Argon2Hasher, FileTokenStore, PasswordHasher, Principal, SessionManager, TokenStore};

/// Everything a command needs: the four services and the session manager,
/// all backed by one database.
///
/// # Example
///
/// ```ignore
/// let system = CrmSystem::open(&config)?;
/// let principal = system.current_principal()?;
/// let customers = system.customers.list(&principal, None, Page::all())?;
/// ```
pub struct CrmSystem {
    pub employees: EmployeeService,
    pub customers: CustomerService,
    pub contracts: ContractService,
    pub events: EventService,
    pub sessions: SessionManager,
}

impl CrmSystem {
    /// Production wiring: Argon2 hashing and the token file from `config`.
    pub fn open(config: &CrmConfig) -> Result<Self, CrmError> {
        let tokens = FileTokenStore::new(config.session.token_path.clone());
        Self::new(config, Arc::new(Argon2Hasher), Box::new(tokens))
    }

    pub fn new(
        config: &CrmConfig,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Box<dyn TokenStore>,
    ) -> Result<Self, CrmError> {
        let db = Database::open(&config.database, CREATE_TABLES)?;
        let sessions = SessionManager::new(&config.session, db.clone(), hasher.clone(), tokens)?;
        info!(path = %db.path().display(), "CRM ready");

        Ok(Self {
            employees: EmployeeService::new(db.clone(), hasher),
            customers: CustomerService::new(db.clone()),
            contracts: ContractService::new(db.clone()),
            events: EventService::new(db),
            sessions,
        })
    }

    /// The principal of the persisted session, or `Unauthenticated`.
    pub fn current_principal(&self) -> Result<Principal, CrmError> {
        self.sessions.status()
    }
}
