//! # CRM
//!
//! Back-office CRM for a sales organisation: employees, customers, contracts
//! and events behind role-gated operations.
//!
//! ## Core Components
//!
//! - **[services]**: one service per resource. Each operation validates its
//!   input, asks [`authz`] for permission, applies the [`workflow`] rules and
//!   persists through [`entity_store`], all in one transaction.
//! - **[authz]**: the pure rule table deciding who may do what.
//! - **[workflow]**: contract signing, payments, event prerequisites and
//!   support assignment.
//! - **[session]**: login, lockout, signed session tokens and the
//!   [`Principal`](session::Principal) every operation is called with.
//! - **[model]**: the entity data types; their storage mappings live in
//!   [`employees`], [`customers`], [`contracts`] and [`events`].
//! - **[lifecycle]**: [`CrmSystem`](lifecycle::CrmSystem) wires it together.
//!
//! ## Quick Start
//!
//! The binary in `main.rs` walks the whole flow on an in-memory database:
//! an admin hires a sales employee, who registers a customer, draws up and
//! signs a contract and organises an event; the admin then puts a support
//! employee in charge of it.
//!
//! ## Testing
//!
//! See [`testing`] for a fast in-memory harness.

pub mod audit;
pub mod authz;
pub mod config;
pub mod contracts;
pub mod customers;
pub mod employees;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod model;
pub mod schema;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod testing;
pub mod validation;
pub mod workflow;

pub use error::{CrmError, ErrorKind};
