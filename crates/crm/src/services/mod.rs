//! # Service Layer
//!
//! One service per resource. Every operation takes the acting [`Principal`]
//! explicitly and runs its checks in the same order: input validation, then
//! [`authz`](crate::authz), then the [`workflow`](crate::workflow) rules, then
//! the store. Mutations run inside a single
//! [`Database::transaction`](entity_store::Database::transaction), so a failure
//! at any step leaves nothing behind.
//!
//! Services are cheap to clone; they share the underlying [`Database`].
//!
//! [`Principal`]: crate::session::Principal
//! [`Database`]: entity_store::Database

pub mod contract_service;
pub mod customer_service;
pub mod employee_service;
pub mod event_service;

pub use contract_service::ContractService;
pub use customer_service::CustomerService;
pub use employee_service::EmployeeService;
pub use event_service::EventService;
