//! # System Wiring
//!
//! [`CrmSystem`] opens the database, applies the schema and hands every
//! service a clone of the same [`Database`](entity_store::Database) handle.
//! The password hasher and token store are injected so tests can swap in
//! fast, in-memory versions; [`CrmSystem::open`] picks the production ones.

pub mod crm_system;

pub use crm_system::*;
