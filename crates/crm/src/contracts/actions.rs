//! Custom actions for contracts.
//!
//! Both actions are state transitions governed by the
//! [`workflow`](crate::workflow) rules; they are applied through
//! [`Repository::perform_action`](entity_store::Repository::perform_action)
//! so the check and the write happen in the same transaction.

use crate::workflow::Transition;

#[derive(Debug, Clone)]
pub enum ContractAction {
    /// Draft -> Signed. Signing a signed contract changes nothing.
    Sign,
    /// Bring the remaining amount down to `remaining_amount` (in cents).
    RecordPayment { remaining_amount: u64 },
}

/// Results from ContractActions - variants match 1:1 with ContractAction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractActionResult {
    Sign(Transition),
    /// Amount paid by this payment.
    RecordPayment(u64),
}
