use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{ContractId, CustomerId, EmployeeId, EventId};

/// An occasion organised for a signed contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub contract_id: ContractId,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub attendees: u32,
    pub notes: String,
    /// Assigned support employee; `None` until an admin assigns one.
    pub support_contact_id: Option<EmployeeId>,
}

#[derive(Debug, Clone)]
pub struct EventCreate {
    pub contract_id: ContractId,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub attendees: u32,
    pub notes: String,
}

/// Field edits. The assigned support employee may change all of these,
/// including the name and the dates, not only location, attendees and notes.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub attendees: Option<u32>,
    pub notes: Option<String>,
}

/// Every set field must match. Date bounds are inclusive except
/// `ended_before`.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub contract_id: Option<ContractId>,
    /// Events of any contract of this customer.
    pub customer_id: Option<CustomerId>,
    pub support_contact_id: Option<EmployeeId>,
    /// Only events nobody has been assigned to yet.
    pub unassigned: bool,
    pub starts_from: Option<DateTime<Utc>>,
    pub starts_until: Option<DateTime<Utc>>,
    pub ended_before: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Events starting between `from` and `to`.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            starts_from: Some(from),
            starts_until: Some(to),
            ..Self::default()
        }
    }

    /// Events starting within `window` after `now`.
    pub fn upcoming(now: DateTime<Utc>, window: Duration) -> Self {
        Self::between(now, now + window)
    }

    /// Events already over at `now`.
    pub fn past(now: DateTime<Utc>) -> Self {
        Self {
            ended_before: Some(now),
            ..Self::default()
        }
    }
}
