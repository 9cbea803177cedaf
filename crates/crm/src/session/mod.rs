//! # Session / Identity Context
//!
//! Who is running the current command. A [`SessionManager`] authenticates an
//! employee against the stored password hash, issues a signed, expiring
//! [`Token`], keeps it in a [`TokenStore`] between commands and turns it back
//! into a [`Principal`] on the next one.
//!
//! A `Principal` can only be obtained from this module, so holding one means a
//! valid session was resolved. Every service call takes it explicitly.
//!
//! ## Structure
//!
//! - [`token`] - JWT encoding and validation
//! - [`store`] - token persistence (`FileTokenStore`, `MemoryTokenStore`)
//! - [`password`] - the injected [`PasswordHasher`] primitive

pub mod password;
pub mod store;
pub mod token;

pub use password::{Argon2Hasher, PasswordHasher};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::Token;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use entity_store::{Criteria, Database, Repository};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument, warn};

use crate::audit;
use crate::employees::EmployeeAction;
use crate::error::CrmError;
use crate::model::{Employee, EmployeeId, Role};
use token::TokenCodec;

/// The authenticated employee behind a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: EmployeeId,
    role: Role,
}

impl Principal {
    pub(crate) fn new(id: EmployeeId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Session settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where [`FileTokenStore`] keeps the token.
    pub token_path: PathBuf,
    /// HMAC key for signing tokens. Must be set.
    #[serde(deserialize_with = "secret_from_string")]
    pub secret: SecretString,
    pub token_ttl_minutes: i64,
    /// Consecutive failed logins before the account locks.
    pub max_failed_attempts: u32,
    pub lockout_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(".crm_session"),
            secret: empty_secret(),
            token_ttl_minutes: 30,
            max_failed_attempts: 5,
            lockout_minutes: 15,
        }
    }
}

impl SessionConfig {
    pub fn has_secret(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }
}

/// What a login attempt ended with, decided inside the transaction so that
/// failure bookkeeping is committed even though the login is refused.
enum LoginOutcome {
    Accepted(Employee),
    Rejected(String),
}

const BAD_CREDENTIALS: &str = "invalid employee number or password";

pub struct SessionManager {
    db: Database,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Box<dyn TokenStore>,
    codec: TokenCodec,
    max_failed_attempts: u32,
    lockout: Duration,
}

impl SessionManager {
    pub fn new(
        config: &SessionConfig,
        db: Database,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Box<dyn TokenStore>,
    ) -> Result<Self, CrmError> {
        if !config.has_secret() {
            return Err(CrmError::validation("session secret must be configured"));
        }
        Ok(Self {
            db,
            hasher,
            tokens,
            codec: TokenCodec::new(&config.secret, Duration::minutes(config.token_ttl_minutes)),
            max_failed_attempts: config.max_failed_attempts.max(1),
            lockout: Duration::minutes(config.lockout_minutes),
        })
    }

    /// Sign a token for `principal` and persist it as the current session.
    pub fn issue(&self, principal: &Principal) -> Result<Token, CrmError> {
        self.issue_at(principal, Utc::now())
    }

    fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<Token, CrmError> {
        let token = self.codec.encode(principal, now)?;
        self.tokens.save(token.as_str())?;
        debug!(principal = %principal.id(), "session issued");
        Ok(token)
    }

    /// Validate `token`: good signature, not expired, and still the persisted
    /// session (a revoked token no longer resolves).
    ///
    /// The employee is read back from storage, so the principal carries the
    /// current role and a deleted employee no longer resolves.
    pub fn resolve(&self, token: &str) -> Result<Principal, CrmError> {
        let claimed = self.codec.decode(token)?;
        match self.tokens.load()? {
            Some(current) if current == token => {}
            _ => return Err(CrmError::Unauthenticated("session revoked".into())),
        }

        let employee = self.db.with_conn(|conn| -> Result<Option<Employee>, CrmError> {
            Ok(Repository::<Employee>::new(conn).find(claimed.id())?)
        })?;
        let Some(employee) = employee else {
            warn!(principal = %claimed.id(), "session refers to a removed employee");
            return Err(CrmError::Unauthenticated("session invalid".into()));
        };
        if employee.role != claimed.role() {
            debug!(
                principal = %employee.id,
                claimed = %claimed.role(),
                stored = %employee.role,
                "role changed since login"
            );
        }
        Ok(Principal::new(employee.id, employee.role))
    }

    /// Invalidate `token`. Revoking a token that is not current is a no-op.
    pub fn revoke(&self, token: &str) -> Result<(), CrmError> {
        if self.tokens.load()?.as_deref() == Some(token) {
            self.tokens.clear()?;
            debug!("session revoked");
        }
        Ok(())
    }

    /// The principal of the persisted session.
    pub fn status(&self) -> Result<Principal, CrmError> {
        let token = self
            .tokens
            .load()?
            .ok_or_else(|| CrmError::Unauthenticated("not logged in".into()))?;
        self.resolve(&token)
    }

    /// End the persisted session, if any.
    pub fn logout(&self) -> Result<(), CrmError> {
        if let Some(token) = self.tokens.load()? {
            if let Ok(principal) = self.codec.decode(&token) {
                audit::logout(&principal);
            }
            self.revoke(&token)?;
        }
        Ok(())
    }

    /// Check credentials and start a session.
    #[instrument(skip(self, password))]
    pub fn login(
        &self,
        employee_number: &str,
        password: &SecretString,
    ) -> Result<(Principal, Token), CrmError> {
        let now = Utc::now();
        let outcome = self.db.transaction(|tx| -> Result<LoginOutcome, CrmError> {
            let employees = Repository::<Employee>::new(tx);
            let criteria =
                Criteria::new().eq("employee_number", employee_number.trim().to_owned());
            let Some(employee) = employees.filter_by(&criteria)?.into_iter().next() else {
                return Ok(LoginOutcome::Rejected(BAD_CREDENTIALS.into()));
            };

            if let Some(until) = employee.locked_until.filter(|until| *until > now) {
                return Ok(LoginOutcome::Rejected(format!(
                    "account locked until {}",
                    until.to_rfc3339()
                )));
            }

            if self.hasher.verify(password, &employee.password_hash) {
                let (employee, _) =
                    employees.perform_action(employee.id, EmployeeAction::ClearFailedLogins)?;
                return Ok(LoginOutcome::Accepted(employee));
            }

            let (employee, locked) = employees.perform_action(
                employee.id,
                EmployeeAction::RecordFailedLogin {
                    at: now,
                    max_attempts: self.max_failed_attempts,
                    lockout: self.lockout,
                },
            )?;
            match locked {
                Some(until) => {
                    audit::account_locked(&employee, until);
                    Ok(LoginOutcome::Rejected(format!(
                        "too many failed attempts, account locked until {}",
                        until.to_rfc3339()
                    )))
                }
                None => {
                    audit::login_failed(&employee);
                    Ok(LoginOutcome::Rejected(BAD_CREDENTIALS.into()))
                }
            }
        })?;

        match outcome {
            LoginOutcome::Accepted(employee) => {
                let principal = Principal::new(employee.id, employee.role);
                let token = self.issue_at(&principal, now)?;
                audit::login(&principal);
                Ok((principal, token))
            }
            LoginOutcome::Rejected(reason) => Err(CrmError::Unauthenticated(reason)),
        }
    }
}
