//! StoreEntity implementation for [`Employee`].
//!
//! Besides plain updates an employee supports two actions, both about login
//! bookkeeping: recording a failed attempt (which may lock the account) and
//! clearing the counter after a successful login.

use chrono::{DateTime, Duration, Utc};
use entity_store::row::{get, get_opt, parse_enum};
use entity_store::rusqlite::types::Value;
use entity_store::rusqlite::Row;
use entity_store::{StoreEntity, StoreError};

use crate::error::CrmError;
use crate::model::{Employee, EmployeeChanges, EmployeeId, NewEmployee};
use crate::schema::{optional_timestamp, parse_optional_timestamp};
use crate::validation;

#[derive(Debug, Clone)]
pub enum EmployeeAction {
    /// Count a failed login at `at`; lock for `lockout` once `max_attempts`
    /// consecutive failures are reached. An expired lock starts a new count.
    RecordFailedLogin {
        at: DateTime<Utc>,
        max_attempts: u32,
        lockout: Duration,
    },
    ClearFailedLogins,
}

/// Result of an [`EmployeeAction`]: the lock now in force, if any.
pub type LockState = Option<DateTime<Utc>>;

impl StoreEntity for Employee {
    type Id = EmployeeId;
    type Create = NewEmployee;
    type Update = EmployeeChanges;
    type Action = EmployeeAction;
    type ActionResult = LockState;
    type Error = CrmError;

    const TABLE: &'static str = "employees";
    const ENTITY: &'static str = "Employee";
    const COLUMNS: &'static [&'static str] = &[
        "full_name",
        "email",
        "employee_number",
        "role",
        "password_hash",
        "failed_attempts",
        "locked_until",
    ];

    fn id(&self) -> EmployeeId {
        self.id
    }

    fn from_create_params(id: EmployeeId, params: NewEmployee) -> Result<Self, CrmError> {
        Ok(Self {
            id,
            full_name: params.full_name,
            email: params.email,
            employee_number: params.employee_number,
            role: params.role,
            password_hash: params.password_hash,
            failed_attempts: 0,
            locked_until: None,
        })
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let role: String = get(row, 4, Self::TABLE, "role")?;
        let locked_until: Option<String> = get_opt(row, 7, Self::TABLE, "locked_until")?;
        Ok(Self {
            id: EmployeeId::from(get::<i64>(row, 0, Self::TABLE, "id")?),
            full_name: get(row, 1, Self::TABLE, "full_name")?,
            email: get(row, 2, Self::TABLE, "email")?,
            employee_number: get(row, 3, Self::TABLE, "employee_number")?,
            role: parse_enum(&role, Self::TABLE, "role")?,
            password_hash: get(row, 5, Self::TABLE, "password_hash")?,
            failed_attempts: get(row, 6, Self::TABLE, "failed_attempts")?,
            locked_until: parse_optional_timestamp(locked_until, Self::TABLE, "locked_until")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.full_name.clone()),
            Value::Text(self.email.clone()),
            Value::Text(self.employee_number.clone()),
            Value::Text(self.role.as_str().to_owned()),
            Value::Text(self.password_hash.clone()),
            Value::Integer(i64::from(self.failed_attempts)),
            optional_timestamp(self.locked_until),
        ]
    }

    fn on_update(&mut self, changes: EmployeeChanges) -> Result<(), CrmError> {
        if let Some(full_name) = changes.full_name {
            self.full_name = full_name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(employee_number) = changes.employee_number {
            self.employee_number = employee_number;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(password_hash) = changes.password_hash {
            self.password_hash = password_hash;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: EmployeeAction) -> Result<LockState, CrmError> {
        match action {
            EmployeeAction::RecordFailedLogin {
                at,
                max_attempts,
                lockout,
            } => {
                if self.locked_until.is_some_and(|until| until <= at) {
                    self.failed_attempts = 0;
                    self.locked_until = None;
                }
                self.failed_attempts = self.failed_attempts.saturating_add(1);
                if self.failed_attempts >= max_attempts {
                    self.locked_until = Some(at + lockout);
                }
            }
            EmployeeAction::ClearFailedLogins => {
                self.failed_attempts = 0;
                self.locked_until = None;
            }
        }
        Ok(self.locked_until)
    }

    fn validate(&self) -> Result<(), CrmError> {
        validation::non_empty("full name", &self.full_name)?;
        validation::non_empty("employee number", &self.employee_number)?;
        validation::email(&self.email)?;
        Ok(())
    }
}
