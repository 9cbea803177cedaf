//! # Domain Model
//!
//! Plain data for the four managed resources. Each type implements
//! [`StoreEntity`](entity_store::StoreEntity) in its resource module
//! (`employees`, `customers`, `contracts`, `events`); this module only holds the
//! fields, the create/update payloads and the typed ids.
//!
//! Every entity serialises to a flat JSON object, see [`to_record`].

pub mod contract;
pub mod customer;
pub mod employee;
pub mod event;

pub use contract::*;
pub use customer::*;
pub use employee::*;
pub use event::*;

use std::fmt;
use std::str::FromStr;

use entity_store::rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::error::CrmError;

/// Generates one `i64`-backed id newtype per entity, e.g. `EmployeeId`.
macro_rules! entity_ids {
    ($($entity:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!("Identifier of a stored `", stringify!($entity), "`.")]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
                #[serde(transparent)]
                pub struct [<$entity Id>](i64);

                impl [<$entity Id>] {
                    pub fn get(self) -> i64 {
                        self.0
                    }
                }

                impl From<i64> for [<$entity Id>] {
                    fn from(raw: i64) -> Self {
                        Self(raw)
                    }
                }

                impl From<[<$entity Id>]> for i64 {
                    fn from(id: [<$entity Id>]) -> Self {
                        id.0
                    }
                }

                impl From<[<$entity Id>]> for Value {
                    fn from(id: [<$entity Id>]) -> Self {
                        Value::Integer(id.0)
                    }
                }

                impl fmt::Display for [<$entity Id>] {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "{}", self.0)
                    }
                }
            )*
        }
    };
}

entity_ids!(Employee, Customer, Contract, Event);

/// Department of an employee; decides what they may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Sales,
    Support,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sales => "sales",
            Role::Support => "support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "management" => Ok(Role::Admin),
            "sales" => Ok(Role::Sales),
            "support" => Ok(Role::Support),
            other => Err(CrmError::validation(format!("unknown role: {other}"))),
        }
    }
}

/// Field-name to value mapping handed to presentation code.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Serialise an entity into a [`Record`].
pub fn to_record<T: Serialize>(entity: &T) -> Result<Record, CrmError> {
    match serde_json::to_value(entity) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(CrmError::Storage(format!("record is not an object: {other}"))),
        Err(e) => Err(CrmError::Storage(format!("record: {e}"))),
    }
}
