//! # Customers
//!
//! A customer is owned by at most one sales employee, who alone (besides an
//! admin) may change it. Ownership moves through the
//! [`CustomerAction::TransferOwnership`] action.

pub mod entity;

pub use entity::CustomerAction;
