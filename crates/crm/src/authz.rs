//! # Authorization Engine
//!
//! A pure rule evaluator: `check(principal, action, resource)` looks up the
//! rule for the principal's role, the action and the resource type, then
//! applies the ownership predicate the rule asks for. It never touches storage;
//! callers load the resource first and describe its ownership in a
//! [`Resource`].
//!
//! | Action                      | Admin | Sales          | Support  |
//! |-----------------------------|-------|----------------|----------|
//! | read anything               | allow | allow          | allow    |
//! | create employee             | allow | deny           | deny     |
//! | update/delete employee      | allow | deny           | deny     |
//! | create customer             | allow | allow          | deny     |
//! | update/delete customer      | allow | owner          | deny     |
//! | transfer customer owner     | allow | deny           | deny     |
//! | create/update/sign contract | allow | owner          | deny     |
//! | record contract payment     | allow | deny           | deny     |
//! | delete contract             | allow | deny           | deny     |
//! | create event                | allow | contract owner | deny     |
//! | assign event support        | allow | deny           | deny     |
//! | edit event fields           | allow | deny           | assignee |
//! | delete event                | allow | deny           | deny     |

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::CrmError;
use crate::model::{Contract, Customer, EmployeeId, Event, Role};
use crate::session::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Sign,
    RecordPayment,
    AssignSupport,
    TransferOwnership,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Sign => "sign",
            Action::RecordPayment => "record payment on",
            Action::AssignSupport => "assign support to",
            Action::TransferOwnership => "transfer ownership of",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Employee,
    Customer,
    Contract,
    Event,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceType::Employee => "employee",
            ResourceType::Customer => "customer",
            ResourceType::Contract => "contract",
            ResourceType::Event => "event",
        })
    }
}

/// The resource an action targets, reduced to the facts the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceType,
    /// Sales employee who owns the resource (or will own it, on create).
    pub owner: Option<EmployeeId>,
    /// Support employee assigned to the resource.
    pub assignee: Option<EmployeeId>,
}

impl Resource {
    pub fn employee() -> Self {
        Self {
            kind: ResourceType::Employee,
            owner: None,
            assignee: None,
        }
    }

    /// Any customer, before one exists.
    pub fn new_customer() -> Self {
        Self {
            kind: ResourceType::Customer,
            owner: None,
            assignee: None,
        }
    }

    pub fn customer(customer: &Customer) -> Self {
        Self {
            kind: ResourceType::Customer,
            owner: customer.sales_contact_id,
            assignee: None,
        }
    }

    /// A contract to be drawn up for `customer`; it will inherit the owner.
    pub fn contract_for(customer: &Customer) -> Self {
        Self {
            kind: ResourceType::Contract,
            owner: customer.sales_contact_id,
            assignee: None,
        }
    }

    pub fn contract(contract: &Contract) -> Self {
        Self {
            kind: ResourceType::Contract,
            owner: contract.sales_contact_id,
            assignee: None,
        }
    }

    /// An event to be organised for `contract`.
    pub fn event_for(contract: &Contract) -> Self {
        Self {
            kind: ResourceType::Event,
            owner: contract.sales_contact_id,
            assignee: None,
        }
    }

    /// `contract` is the event's contract; it carries the sales owner.
    pub fn event(event: &Event, contract: &Contract) -> Self {
        Self {
            kind: ResourceType::Event,
            owner: contract.sales_contact_id,
            assignee: event.support_contact_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The role never gets this action on this resource type.
    Role,
    /// The role only gets it on resources it owns.
    NotOwner,
    /// The role only gets it on resources it is assigned to.
    NotAssigned,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DenyReason::Role => "role not permitted",
            DenyReason::NotOwner => "not the owner",
            DenyReason::NotAssigned => "not the assigned support contact",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// What a role needs in order to perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Always,
    IfOwner,
    IfAssignee,
    Never,
}

fn rule(role: Role, action: Action, kind: ResourceType) -> Rule {
    use Action::*;
    use ResourceType as R;

    match (role, action, kind) {
        (_, Read, _) => Rule::Always,
        (Role::Admin, _, _) => Rule::Always,

        (Role::Sales, Create, R::Customer) => Rule::Always,
        (Role::Sales, Update | Delete, R::Customer) => Rule::IfOwner,
        (Role::Sales, Create | Update | Sign, R::Contract) => Rule::IfOwner,
        (Role::Sales, Create, R::Event) => Rule::IfOwner,

        (Role::Support, Update, R::Event) => Rule::IfAssignee,

        _ => Rule::Never,
    }
}

/// Evaluate the rule table. Never mutates anything.
pub fn check(principal: &Principal, action: Action, resource: &Resource) -> Decision {
    match rule(principal.role(), action, resource.kind) {
        Rule::Always => Decision::Allow,
        Rule::Never => Decision::Deny(DenyReason::Role),
        Rule::IfOwner if resource.owner == Some(principal.id()) => Decision::Allow,
        Rule::IfOwner => Decision::Deny(DenyReason::NotOwner),
        Rule::IfAssignee if resource.assignee == Some(principal.id()) => Decision::Allow,
        Rule::IfAssignee => Decision::Deny(DenyReason::NotAssigned),
    }
}

/// [`check`], turning a denial into `PermissionDenied`.
pub fn require(principal: &Principal, action: Action, resource: &Resource) -> Result<(), CrmError> {
    match check(principal, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                principal = %principal.id(),
                role = %principal.role(),
                %action,
                resource_type = %resource.kind,
                %reason,
                "Permission denied"
            );
            Err(CrmError::PermissionDenied {
                action,
                resource_type: resource.kind,
                role: principal.role(),
            })
        }
    }
}
