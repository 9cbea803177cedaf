//! # Workflow Controller
//!
//! The state rules for contracts and events, kept free of storage so that
//! they can be checked (and tested) on plain values.
//!
//! - A contract is `Draft` until signed, then `Signed` for good.
//! - The remaining amount only ever goes down, and never below zero or above
//!   the total.
//! - Events are only organised for signed contracts.
//! - Support assignment names a support employee; assigning the current
//!   assignee again changes nothing.

use serde::Serialize;

use crate::error::CrmError;
use crate::model::{Contract, Employee, EmployeeId, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractState {
    Draft,
    Signed,
}

impl ContractState {
    pub fn of(contract: &Contract) -> Self {
        if contract.signed {
            ContractState::Signed
        } else {
            ContractState::Draft
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractState::Draft => "draft",
            ContractState::Signed => "signed",
        }
    }
}

/// Whether a requested transition changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Unchanged,
}

/// Validate a contract state change. Moving to the current state is a no-op;
/// `Signed -> Draft` is never allowed.
pub fn transition(from: ContractState, to: ContractState) -> Result<Transition, CrmError> {
    match (from, to) {
        (ContractState::Draft, ContractState::Signed) => Ok(Transition::Applied),
        (ContractState::Signed, ContractState::Draft) => Err(CrmError::workflow(
            "a signed contract cannot return to draft",
        )),
        _ => Ok(Transition::Unchanged),
    }
}

pub fn sign(from: ContractState) -> Result<Transition, CrmError> {
    transition(from, ContractState::Signed)
}

/// Check a payment that brings the remaining amount from `current` to
/// `new_remaining`. Returns the amount paid.
pub fn validate_payment(total: u64, current: u64, new_remaining: u64) -> Result<u64, CrmError> {
    if new_remaining > total {
        return Err(CrmError::workflow(format!(
            "remaining amount {new_remaining} exceeds total amount {total}"
        )));
    }
    if new_remaining > current {
        return Err(CrmError::workflow(format!(
            "remaining amount cannot increase (from {current} to {new_remaining})"
        )));
    }
    Ok(current - new_remaining)
}

/// A new total may not fall below what is still owed.
pub fn validate_total_change(new_total: u64, remaining: u64) -> Result<(), CrmError> {
    if new_total < remaining {
        return Err(CrmError::workflow(format!(
            "total amount {new_total} is below the remaining amount {remaining}"
        )));
    }
    Ok(())
}

pub fn ensure_signed(contract: &Contract) -> Result<(), CrmError> {
    match ContractState::of(contract) {
        ContractState::Signed => Ok(()),
        ContractState::Draft => Err(CrmError::workflow("contract not signed")),
    }
}

/// Outcome of putting a support employee on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportAssignment {
    Assigned,
    Reassigned { previous: EmployeeId },
    Unchanged,
}

pub fn plan_support_assignment(
    current: Option<EmployeeId>,
    target: &Employee,
) -> Result<SupportAssignment, CrmError> {
    if target.role != Role::Support {
        return Err(CrmError::workflow(format!(
            "employee {} is in {}, not support",
            target.id, target.role
        )));
    }
    Ok(match current {
        None => SupportAssignment::Assigned,
        Some(previous) if previous == target.id => SupportAssignment::Unchanged,
        Some(previous) => SupportAssignment::Reassigned { previous },
    })
}

/// The owner a sales contract inherits must actually be in sales.
pub fn ensure_sales_contact(employee: &Employee) -> Result<(), CrmError> {
    if employee.role != Role::Sales {
        return Err(CrmError::workflow(format!(
            "employee {} is in {}, not sales",
            employee.id, employee.role
        )));
    }
    Ok(())
}

/// What an employee is still responsible for in their current role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Responsibilities {
    /// Customers and contracts with the employee as sales contact.
    pub owned: u64,
    /// Events with the employee as support contact.
    pub assigned: u64,
}

/// An employee can only leave sales or support once nothing depends on them
/// holding that role.
pub fn ensure_role_change(
    employee: &Employee,
    new_role: Role,
    held: Responsibilities,
) -> Result<(), CrmError> {
    if new_role == employee.role {
        return Ok(());
    }
    match employee.role {
        Role::Sales if held.owned > 0 => Err(CrmError::workflow(format!(
            "employee {} still owns {} customers or contracts",
            employee.id, held.owned
        ))),
        Role::Support if held.assigned > 0 => Err(CrmError::workflow(format!(
            "employee {} is still assigned to {} events",
            employee.id, held.assigned
        ))),
        _ => Ok(()),
    }
}
