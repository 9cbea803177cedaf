//! # Events

pub mod entity;

pub use entity::EventAction;
