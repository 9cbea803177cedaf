use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ContractId, CustomerId, EmployeeId};

/// An agreement with a customer. Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub id: ContractId,
    pub customer_id: CustomerId,
    /// Copied from the customer when the contract is drawn up.
    pub sales_contact_id: Option<EmployeeId>,
    pub total_amount: u64,
    pub remaining_amount: u64,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn is_fully_paid(&self) -> bool {
        self.remaining_amount == 0
    }
}

/// Input for drawing up a contract. `remaining_amount` defaults to the total.
#[derive(Debug, Clone)]
pub struct ContractCreate {
    pub customer_id: CustomerId,
    pub total_amount: u64,
    pub remaining_amount: Option<u64>,
}

/// Row-level payload, with the owner resolved from the customer.
#[derive(Debug, Clone)]
pub struct NewContract {
    pub customer_id: CustomerId,
    pub sales_contact_id: Option<EmployeeId>,
    pub total_amount: u64,
    pub remaining_amount: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ContractUpdate {
    pub total_amount: Option<u64>,
}

/// Which contracts to list. All set filters must hold.
#[derive(Debug, Clone, Default)]
pub struct ContractFilter {
    pub customer_id: Option<CustomerId>,
    pub sales_contact_id: Option<EmployeeId>,
    pub signed: Option<bool>,
    /// `Some(true)`: something left to pay. `Some(false)`: fully paid.
    pub outstanding: Option<bool>,
}

/// Money figures over the contracts matching a [`ContractFilter`], in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContractTotals {
    pub contracts: u64,
    /// Revenue: the sum of contract totals.
    pub total_amount: u64,
    /// Still owed across those contracts.
    pub remaining_amount: u64,
}

impl ContractTotals {
    pub fn collected(&self) -> u64 {
        self.total_amount.saturating_sub(self.remaining_amount)
    }
}
