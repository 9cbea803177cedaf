//! # Test Support
//!
//! Helpers for exercising the CRM without Argon2's deliberate slowness or a
//! token file on disk.
//!
//! - [`PlainTextHasher`] - a deterministic [`PasswordHasher`]. Never use it
//!   outside tests.
//! - [`TestCrm`] - an in-memory [`CrmSystem`] with a bootstrapped admin who is
//!   already logged in.
//!
//! ```rust
//! use crm::model::Role;
//! use crm::testing::TestCrm;
//!
//! let crm = TestCrm::new().unwrap();
//! let sales = crm.hire("EMP001", Role::Sales).unwrap();
//! let principal = crm.login_as("EMP001").unwrap();
//! assert_eq!(principal.id(), sales.id);
//! ```

use std::sync::Arc;

use entity_store::DatabaseConfig;
use secrecy::{ExposeSecret, SecretString};

use crate::config::CrmConfig;
use crate::error::CrmError;
use crate::lifecycle::CrmSystem;
use crate::model::{Employee, EmployeeCreate, Role};
use crate::session::{MemoryTokenStore, PasswordHasher, Principal, SessionConfig};

/// Password every [`TestCrm`] employee gets. Satisfies the strength rules.
pub const TEST_PASSWORD: &str = "Sup3r-Secret-Pass";

/// Employee number of the bootstrapped admin.
pub const ADMIN_NUMBER: &str = "ADM001";

const HASH_PREFIX: &str = "plain$";

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &SecretString) -> Result<String, CrmError> {
        Ok(format!("{HASH_PREFIX}{}", password.expose_secret()))
    }

    fn verify(&self, password: &SecretString, hash: &str) -> bool {
        hash.strip_prefix(HASH_PREFIX) == Some(password.expose_secret())
    }
}

pub fn test_config() -> CrmConfig {
    CrmConfig {
        database: DatabaseConfig::in_memory(),
        session: SessionConfig {
            secret: SecretString::from("test-signing-secret"),
            ..SessionConfig::default()
        },
    }
}

pub struct TestCrm {
    pub system: CrmSystem,
    pub admin: Principal,
}

impl TestCrm {
    pub fn new() -> Result<Self, CrmError> {
        let system = CrmSystem::new(
            &test_config(),
            Arc::new(PlainTextHasher),
            Box::new(MemoryTokenStore::default()),
        )?;
        system
            .employees
            .bootstrap_admin(employee(ADMIN_NUMBER, Role::Admin))?;
        let (admin, _) = system
            .sessions
            .login(ADMIN_NUMBER, &SecretString::from(TEST_PASSWORD))?;
        Ok(Self { system, admin })
    }

    /// Have the admin create an employee with [`TEST_PASSWORD`].
    pub fn hire(&self, employee_number: &str, role: Role) -> Result<Employee, CrmError> {
        self.system
            .employees
            .create(&self.admin, employee(employee_number, role))
    }

    /// Start a session as `employee_number`, replacing the current one.
    pub fn login_as(&self, employee_number: &str) -> Result<Principal, CrmError> {
        let (principal, _) = self
            .system
            .sessions
            .login(employee_number, &SecretString::from(TEST_PASSWORD))?;
        Ok(principal)
    }
}

/// Create payload with a name and email derived from the employee number.
pub fn employee(employee_number: &str, role: Role) -> EmployeeCreate {
    EmployeeCreate {
        full_name: format!("Employee {employee_number}"),
        email: format!("{}@example.com", employee_number.to_lowercase()),
        employee_number: employee_number.to_owned(),
        role,
        password: SecretString::from(TEST_PASSWORD),
    }
}
