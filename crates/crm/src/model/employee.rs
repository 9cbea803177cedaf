use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use super::{EmployeeId, Role};

/// A staff member who can log in.
///
/// Login bookkeeping (`password_hash`, `failed_attempts`, `locked_until`) is
/// persisted with the row but never leaves the process in a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub email: String,
    pub employee_number: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub failed_attempts: u32,
    #[serde(skip_serializing)]
    pub locked_until: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// Input for hiring an employee.
#[derive(Debug, Clone)]
pub struct EmployeeCreate {
    pub full_name: String,
    pub email: String,
    pub employee_number: String,
    pub role: Role,
    pub password: SecretString,
}

/// Partial changes to an employee. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub employee_number: Option<String>,
    pub role: Option<Role>,
    pub password: Option<SecretString>,
}

/// Row-level payload: the create input once the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub full_name: String,
    pub email: String,
    pub employee_number: String,
    pub role: Role,
    pub password_hash: String,
}

/// Row-level changes: the update input once any new password has been hashed.
#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub employee_number: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}
