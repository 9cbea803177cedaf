//! # Generic Repository
//!
//! `Repository<T>` is the one CRUD implementation shared by every
//! [`StoreEntity`]. It borrows a connection (normally the [`Transaction`]
//! handed out by [`Database::transaction`]) so that every call made through it
//! belongs to the caller's unit of work.
//!
//! ## Operations
//!
//! * **Create**: allocates the next id from `sqlite_sequence`, builds the entity
//!   with `T::from_create_params`, runs `validate`, inserts the row.
//! * **Get**: selects by id; a missing row is `NotFound`.
//! * **List / filter_by**: conjunction of [`Criteria`], ordered by ascending id,
//!   sliced by [`Page`].
//! * **Update**: loads the row, merges the changes through `on_update`,
//!   validates, writes every column back.
//! * **Action**: same as update but through `handle_action`, returning the
//!   action result alongside the saved entity.
//! * **Aggregate**: `count`, `count_matching` and `sum` over the rows matching
//!   a [`Criteria`].
//! * **Delete**: removes the row; rows still referenced by a foreign key fail
//!   with `ReferentialIntegrityViolation`.
//!
//! [`Transaction`]: rusqlite::Transaction
//! [`Database::transaction`]: crate::Database::transaction

use std::marker::PhantomData;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info, warn};

use crate::criteria::{Criteria, Page};
use crate::entity::StoreEntity;
use crate::error::StoreError;

pub struct Repository<'c, T: StoreEntity> {
    conn: &'c Connection,
    _entity: PhantomData<T>,
}

impl<'c, T: StoreEntity> Repository<'c, T> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    fn select_sql() -> String {
        format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }

    fn next_id(&self) -> Result<T::Id, StoreError> {
        let current: i64 = self.conn.query_row(
            "SELECT COALESCE((SELECT seq FROM sqlite_sequence WHERE name = ?1), 0)",
            [T::TABLE],
            |row| row.get(0),
        )?;
        Ok(T::Id::from(current + 1))
    }

    fn insert(&self, item: &T) -> Result<(), StoreError> {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len() + 1)
            .map(|i| format!("?{i}"))
            .collect();
        let sql = format!(
            "INSERT INTO {} (id, {}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        );
        let mut values = vec![Value::Integer(item.id().into())];
        values.extend(item.to_values());
        self.conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| StoreError::from_sqlite(e, T::ENTITY))?;
        Ok(())
    }

    fn write_back(&self, item: &T) -> Result<(), StoreError> {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            T::TABLE,
            assignments.join(", "),
            T::COLUMNS.len() + 1
        );
        let mut values = item.to_values();
        values.push(Value::Integer(item.id().into()));
        self.conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| StoreError::from_sqlite(e, T::ENTITY))?;
        Ok(())
    }

    fn query(&self, criteria: &Criteria, page: Page) -> Result<Vec<T>, StoreError> {
        let (filter, values) = criteria.to_sql(T::ENTITY, T::COLUMNS)?;
        let sql = format!(
            "{}{filter} ORDER BY id ASC{}",
            Self::select_sql(),
            page.to_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(T::from_row(row)?);
        }
        Ok(items)
    }

    /// Insert a new entity built from `params`.
    pub fn create(&self, params: T::Create) -> Result<T, T::Error> {
        debug!(entity_type = T::ENTITY, ?params, "Create");
        let id = self.next_id()?;
        let item = T::from_create_params(id, params)?;
        if let Err(e) = item.validate() {
            warn!(entity_type = T::ENTITY, error = %e, "Create rejected");
            return Err(e);
        }
        self.insert(&item)?;
        info!(entity_type = T::ENTITY, %id, "Created");
        Ok(item)
    }

    /// Load an entity, `None` when absent.
    pub fn find(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let sql = format!("{} WHERE id = ?1", Self::select_sql());
        let raw: i64 = id.into();
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([raw])?;
        let item = match rows.next()? {
            Some(row) => Some(T::from_row(row)?),
            None => None,
        };
        debug!(entity_type = T::ENTITY, %id, found = item.is_some(), "Get");
        Ok(item)
    }

    pub fn get_by_id(&self, id: T::Id) -> Result<T, StoreError> {
        self.find(id)?.ok_or_else(|| StoreError::NotFound {
            entity: T::ENTITY,
            id: id.to_string(),
        })
    }

    pub fn list(&self, criteria: &Criteria, page: Page) -> Result<Vec<T>, StoreError> {
        let items = self.query(criteria, page)?;
        debug!(entity_type = T::ENTITY, ?page, size = items.len(), "List");
        Ok(items)
    }

    /// Every entity matching all of `criteria`.
    pub fn filter_by(&self, criteria: &Criteria) -> Result<Vec<T>, StoreError> {
        self.query(criteria, Page::all())
    }

    /// Merge `changes` into the stored entity and persist the result.
    pub fn update(&self, id: T::Id, changes: T::Update) -> Result<T, T::Error> {
        debug!(entity_type = T::ENTITY, %id, ?changes, "Update");
        let mut item = self.get_by_id(id)?;
        let outcome = item.on_update(changes).and_then(|()| item.validate());
        if let Err(e) = outcome {
            warn!(entity_type = T::ENTITY, %id, error = %e, "Update failed");
            return Err(e);
        }
        self.write_back(&item)?;
        info!(entity_type = T::ENTITY, %id, "Updated");
        Ok(item)
    }

    /// Apply a resource-specific action and persist the entity.
    pub fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<(T, T::ActionResult), T::Error> {
        debug!(entity_type = T::ENTITY, %id, ?action, "Action");
        let mut item = self.get_by_id(id)?;
        let outcome = item
            .handle_action(action)
            .and_then(|result| item.validate().map(|()| result));
        match outcome {
            Ok(result) => {
                self.write_back(&item)?;
                info!(entity_type = T::ENTITY, %id, "Action ok");
                Ok((item, result))
            }
            Err(e) => {
                warn!(entity_type = T::ENTITY, %id, error = %e, "Action failed");
                Err(e)
            }
        }
    }

    pub fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        debug!(entity_type = T::ENTITY, %id, "Delete");
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        let raw: i64 = id.into();
        let removed = self
            .conn
            .execute(&sql, [raw])
            .map_err(|e| StoreError::from_sqlite(e, T::ENTITY))?;
        if removed == 0 {
            warn!(entity_type = T::ENTITY, %id, "Not found");
            return Err(StoreError::NotFound {
                entity: T::ENTITY,
                id: id.to_string(),
            });
        }
        info!(entity_type = T::ENTITY, %id, "Deleted");
        Ok(())
    }

    pub fn exists(&self, id: T::Id) -> Result<bool, StoreError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", T::TABLE);
        let raw: i64 = id.into();
        let found: bool = self.conn.query_row(&sql, [raw], |row| row.get(0))?;
        Ok(found)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.count_matching(&Criteria::new())
    }

    /// Sum of an integer `column` over the matching rows (0 when none match).
    pub fn sum(&self, column: &str, criteria: &Criteria) -> Result<i64, StoreError> {
        if !T::COLUMNS.contains(&column) {
            return Err(StoreError::UnknownColumn {
                entity: T::ENTITY,
                column: column.to_owned(),
            });
        }
        let (filter, values) = criteria.to_sql(T::ENTITY, T::COLUMNS)?;
        let sql = format!("SELECT COALESCE(SUM({column}), 0) FROM {}{filter}", T::TABLE);
        let total: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(total)
    }

    pub fn count_matching(&self, criteria: &Criteria) -> Result<u64, StoreError> {
        let (filter, values) = criteria.to_sql(T::ENTITY, T::COLUMNS)?;
        let sql = format!("SELECT COUNT(*) FROM {}{filter}", T::TABLE);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
