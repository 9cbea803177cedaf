use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CustomerId, EmployeeId};

/// A client company contact, owned by one sales employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    /// Owning sales employee; `None` until assigned.
    pub sales_contact_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub last_contact: Option<DateTime<Utc>>,
}

/// Input for registering a customer.
///
/// `sales_contact_id` is only honoured when an admin creates the customer; a
/// sales employee always becomes the owner of the customers they create.
#[derive(Debug, Clone)]
pub struct CustomerCreate {
    pub full_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub sales_contact_id: Option<EmployeeId>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub last_contact: Option<DateTime<Utc>>,
}
