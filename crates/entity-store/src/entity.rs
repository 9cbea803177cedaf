//! # StoreEntity Trait
//!
//! The `StoreEntity` trait is the contract every persisted resource implements
//! to be managed by the generic [`Repository`](crate::Repository). It names the
//! associated types for ids, payloads, actions and errors, maps the entity to
//! and from a table row, and provides the hooks the repository calls around
//! each write (`validate`, `on_update`, `handle_action`).
//!
//! # Identity
//! Entities are identified by their `Id` alone. Two values with the same id
//! denote the same row, whatever their other fields say; see
//! [`StoreEntity::same_identity`].
//!
//! # Provided Methods (Hooks)
//! - [`StoreEntity::validate`]
//! - [`StoreEntity::same_identity`]
//!
//! The default `validate` accepts everything (`Ok(())`).

use rusqlite::types::Value;
use rusqlite::Row;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::StoreError;

/// Trait that any persisted entity must implement to be managed by a
/// [`Repository`](crate::Repository).
pub trait StoreEntity: Clone + Debug + Sized {
    /// Typed identifier. Backed by the table's `INTEGER PRIMARY KEY`.
    type Id: Copy + Eq + Hash + Debug + Display + From<i64> + Into<i64>;

    /// Data required to create a new instance.
    type Create: Debug;

    /// Partial changes; `None` fields are left untouched.
    type Update: Debug;

    /// Resource-specific operations beyond plain updates.
    type Action: Debug;

    /// The result type returned by custom actions.
    type ActionResult: Debug;

    /// Entity error type. Store failures convert into it so that hooks and the
    /// repository share one error channel.
    type Error: std::error::Error + From<StoreError>;

    /// Table holding the rows (must be declared `AUTOINCREMENT`).
    const TABLE: &'static str;

    /// Human readable entity name used in errors and logs.
    const ENTITY: &'static str;

    /// Persisted columns, excluding `id`, in the order produced by
    /// [`to_values`](StoreEntity::to_values) and consumed by
    /// [`from_row`](StoreEntity::from_row) after the id.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Self::Id;

    /// Build the full entity from the allocated id and the create payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Decode a row selected as `id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> Result<Self, StoreError>;

    /// Encode the persisted columns, matching `COLUMNS` one to one.
    fn to_values(&self) -> Vec<Value>;

    /// Merge the provided fields into `self`.
    fn on_update(&mut self, update: Self::Update) -> Result<(), Self::Error>;

    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;

    /// Checked before every insert and every write-back.
    fn validate(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Equality by identity.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
