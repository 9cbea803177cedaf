//! # Employees
//!
//! Staff accounts. Besides the usual fields an employee row carries the login
//! bookkeeping used by the [`session`](crate::session) module, which is why
//! the entity has actions for recording and clearing failed logins.
//!
//! ## Structure
//!
//! - [`entity`] - [`StoreEntity`](entity_store::StoreEntity) implementation for
//!   [`Employee`](crate::model::Employee)
//!
//! The operations themselves live in
//! [`EmployeeService`](crate::services::EmployeeService).

pub mod entity;

pub use entity::{EmployeeAction, LockState};
