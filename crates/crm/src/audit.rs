//! Audit trail for security-relevant and business-relevant changes.
//!
//! Entries are ordinary `tracing` events on the [`TARGET`] target, so they can
//! be routed separately (`RUST_LOG=crm::audit=info`). Callers emit them only
//! once the change they describe has been committed.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::model::{Contract, Customer, Employee, EmployeeId, Event};
use crate::session::Principal;
use crate::workflow::SupportAssignment;

pub const TARGET: &str = "crm::audit";

pub fn login(principal: &Principal) {
    info!(target: TARGET, event = "login", employee = %principal.id(), role = %principal.role(), "Login");
}

pub fn logout(principal: &Principal) {
    info!(target: TARGET, event = "logout", employee = %principal.id(), "Logout");
}

pub fn login_failed(employee: &Employee) {
    warn!(
        target: TARGET,
        event = "login_failed",
        employee = %employee.id,
        failed_attempts = employee.failed_attempts,
        "Login failed"
    );
}

pub fn account_locked(employee: &Employee, until: DateTime<Utc>) {
    warn!(
        target: TARGET,
        event = "account_locked",
        employee = %employee.id,
        until = %until.to_rfc3339(),
        "Account locked"
    );
}

pub fn admin_bootstrapped(employee: &Employee) {
    info!(
        target: TARGET,
        event = "admin_bootstrapped",
        employee = %employee.id,
        employee_number = %employee.employee_number,
        "First administrator created"
    );
}

pub fn employee_created(actor: &Principal, employee: &Employee) {
    info!(
        target: TARGET,
        event = "employee_created",
        actor = %actor.id(),
        employee = %employee.id,
        employee_number = %employee.employee_number,
        role = %employee.role,
        "Employee created"
    );
}

pub fn employee_updated(actor: &Principal, employee: &Employee) {
    info!(
        target: TARGET,
        event = "employee_updated",
        actor = %actor.id(),
        employee = %employee.id,
        role = %employee.role,
        "Employee updated"
    );
}

pub fn employee_deleted(actor: &Principal, id: EmployeeId) {
    info!(target: TARGET, event = "employee_deleted", actor = %actor.id(), employee = %id, "Employee deleted");
}

pub fn ownership_transferred(actor: &Principal, customer: &Customer, previous: Option<EmployeeId>) {
    info!(
        target: TARGET,
        event = "ownership_transferred",
        actor = %actor.id(),
        customer = %customer.id,
        previous = ?previous,
        owner = ?customer.sales_contact_id,
        "Customer ownership transferred"
    );
}

pub fn contract_signed(actor: &Principal, contract: &Contract) {
    info!(
        target: TARGET,
        event = "contract_signed",
        actor = %actor.id(),
        contract = %contract.id,
        customer = %contract.customer_id,
        total_amount = contract.total_amount,
        "Contract signed"
    );
}

pub fn payment_recorded(actor: &Principal, contract: &Contract, paid: u64) {
    info!(
        target: TARGET,
        event = "payment_recorded",
        actor = %actor.id(),
        contract = %contract.id,
        paid,
        remaining_amount = contract.remaining_amount,
        "Payment recorded"
    );
}

pub fn support_assigned(actor: &Principal, event: &Event, outcome: SupportAssignment) {
    info!(
        target: TARGET,
        event = "support_assigned",
        actor = %actor.id(),
        event_id = %event.id,
        support = ?event.support_contact_id,
        outcome = ?outcome,
        "Support assigned"
    );
}
