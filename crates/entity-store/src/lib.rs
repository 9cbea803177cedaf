//! # Entity Store
//!
//! A small, generic persistence layer for stateful business entities on top of
//! SQLite. Each entity type describes itself once through the [`StoreEntity`]
//! trait; the store then offers the same CRUD + Action surface for all of them
//! through [`Repository`].
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`StoreEntity`]) - domain types, their row mapping and
//!    their merge/action/validation hooks
//! 2. **Unit of Work** ([`Database::transaction`]) - one atomic transaction per
//!    command, rolled back on every error path
//! 3. **Access Layer** ([`Repository`]) - typed create/get/list/update/delete,
//!    criteria filtering, `exists` and `count`
//!
//! Business rules live in the entity hooks and in the caller; the repository
//! never decides *whether* a write is allowed, only *how* it is stored.
//!
//! ## Example
//!
//! ```rust
//! use entity_store::row::get;
//! use entity_store::{Criteria, Database, Page, Repository, StoreEntity, StoreError};
//! use entity_store::rusqlite::types::Value;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! struct NoteId(i64);
//! impl From<i64> for NoteId { fn from(v: i64) -> Self { Self(v) } }
//! impl From<NoteId> for i64 { fn from(v: NoteId) -> Self { v.0 } }
//! impl std::fmt::Display for NoteId {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
//! }
//!
//! #[derive(Debug, Clone)]
//! struct Note { id: NoteId, body: String }
//!
//! impl StoreEntity for Note {
//!     type Id = NoteId;
//!     type Create = String;
//!     type Update = String;
//!     type Action = ();
//!     type ActionResult = ();
//!     type Error = StoreError;
//!     const TABLE: &'static str = "notes";
//!     const ENTITY: &'static str = "Note";
//!     const COLUMNS: &'static [&'static str] = &["body"];
//!
//!     fn id(&self) -> NoteId { self.id }
//!     fn from_create_params(id: NoteId, body: String) -> Result<Self, StoreError> {
//!         Ok(Self { id, body })
//!     }
//!     fn from_row(row: &entity_store::rusqlite::Row<'_>) -> Result<Self, StoreError> {
//!         Ok(Self {
//!             id: NoteId(get(row, 0, "notes", "id")?),
//!             body: get(row, 1, "notes", "body")?,
//!         })
//!     }
//!     fn to_values(&self) -> Vec<Value> { vec![Value::Text(self.body.clone())] }
//!     fn on_update(&mut self, body: String) -> Result<(), StoreError> {
//!         self.body = body;
//!         Ok(())
//!     }
//!     fn handle_action(&mut self, _: ()) -> Result<(), StoreError> { Ok(()) }
//! }
//!
//! let db = Database::in_memory(
//!     "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL);",
//! ).unwrap();
//!
//! let note = db
//!     .transaction(|tx| Repository::<Note>::new(tx).create("hello".to_string()))
//!     .unwrap();
//!
//! let notes = db
//!     .with_conn(|conn| Repository::<Note>::new(conn).list(&Criteria::new(), Page::all()))
//!     .unwrap();
//! assert_eq!(notes.len(), 1);
//! assert!(notes[0].same_identity(&note));
//! ```
//!
//! ## Errors
//!
//! Everything the store raises is a [`StoreError`]. Entity error types embed it
//! through `From<StoreError>`, so `?` works across hooks and repository calls.

pub mod criteria;
pub mod database;
pub mod entity;
pub mod error;
pub mod repository;
pub mod row;

pub use criteria::{Criteria, Page};
pub use database::{Database, DatabaseConfig};
pub use entity::StoreEntity;
pub use error::StoreError;
pub use repository::Repository;

pub use rusqlite;
