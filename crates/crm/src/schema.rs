//! SQLite schema and column codecs shared by the entity implementations.

use chrono::{DateTime, SecondsFormat, Utc};
use entity_store::rusqlite::types::Value;
use entity_store::StoreError;

/// Tables are `AUTOINCREMENT` so ids are never reused after a delete.
pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS employees (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name       TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    employee_number TEXT NOT NULL UNIQUE,
    role            TEXT NOT NULL CHECK (role IN ('admin', 'sales', 'support')),
    password_hash   TEXT NOT NULL,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    locked_until    TEXT
);

CREATE TABLE IF NOT EXISTS customers (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name        TEXT NOT NULL,
    email            TEXT NOT NULL UNIQUE,
    company          TEXT NOT NULL,
    phone            TEXT NOT NULL,
    sales_contact_id INTEGER REFERENCES employees(id) ON DELETE SET NULL,
    created_at       TEXT NOT NULL,
    last_contact     TEXT
);

CREATE TABLE IF NOT EXISTS contracts (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id      INTEGER NOT NULL REFERENCES customers(id) ON DELETE RESTRICT,
    sales_contact_id INTEGER REFERENCES employees(id) ON DELETE RESTRICT,
    total_amount     INTEGER NOT NULL CHECK (total_amount >= 0),
    remaining_amount INTEGER NOT NULL CHECK (remaining_amount >= 0 AND remaining_amount <= total_amount),
    signed           INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id        INTEGER NOT NULL REFERENCES contracts(id) ON DELETE RESTRICT,
    name               TEXT NOT NULL,
    start_at           TEXT NOT NULL,
    end_at             TEXT NOT NULL,
    location           TEXT NOT NULL,
    attendees          INTEGER NOT NULL CHECK (attendees > 0),
    notes              TEXT NOT NULL DEFAULT '',
    support_contact_id INTEGER REFERENCES employees(id) ON DELETE RESTRICT
);

CREATE INDEX IF NOT EXISTS idx_customers_sales_contact ON customers(sales_contact_id);
CREATE INDEX IF NOT EXISTS idx_contracts_customer ON contracts(customer_id);
CREATE INDEX IF NOT EXISTS idx_contracts_sales_contact ON contracts(sales_contact_id);
CREATE INDEX IF NOT EXISTS idx_events_contract ON events(contract_id);
CREATE INDEX IF NOT EXISTS idx_events_support_contact ON events(support_contact_id);
";

pub(crate) fn timestamp(at: DateTime<Utc>) -> Value {
    Value::Text(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub(crate) fn optional_timestamp(at: Option<DateTime<Utc>>) -> Value {
    at.map_or(Value::Null, timestamp)
}

/// Amounts past `i64::MAX` become NULL, which the `NOT NULL` amount columns
/// refuse.
pub(crate) fn amount(cents: u64) -> Value {
    i64::try_from(cents).map_or(Value::Null, Value::Integer)
}

pub(crate) fn parse_timestamp(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid timestamp {raw}: {e}"),
        })
}

pub(crate) fn parse_optional_timestamp(
    raw: Option<String>,
    table: &'static str,
    column: &'static str,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    raw.map(|raw| parse_timestamp(&raw, table, column))
        .transpose()
}
