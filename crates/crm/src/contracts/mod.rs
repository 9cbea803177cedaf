//! # Contracts
//!
//! Contract persistence. Signing and payments are entity actions so that the
//! [`workflow`](crate::workflow) checks run on the freshly loaded row, inside
//! the caller's transaction.
//!
//! - [`entity`] - [`StoreEntity`](entity_store::StoreEntity) implementation
//! - [`actions`] - [`ContractAction`] and its results

pub mod actions;
pub mod entity;

pub use actions::{ContractAction, ContractActionResult};
