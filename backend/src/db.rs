//! SQLite persistence.
//!
//! A `Database` is just the path of the SQLite file; every unit of work opens
//! its own connection on actix's blocking pool through [`Database::run`].
//! Identifiers are stored as hyphenated UUID text, money and hours as decimal
//! text, dates as ISO-8601 text.

use crate::error::ApiError;
use actix_web::web;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    full_name   TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'staff',
    avatar_url  TEXT,
    client_id   TEXT REFERENCES clients(id)
);
CREATE TABLE IF NOT EXISTS clients (
    id      TEXT PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE,
    email   TEXT,
    phone   TEXT,
    siret   TEXT
);
CREATE TABLE IF NOT EXISTS employees (
    id          TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    hourly_rate TEXT,
    manager_id  TEXT REFERENCES employees(id)
);
CREATE TABLE IF NOT EXISTS projects (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    client_id   TEXT REFERENCES clients(id),
    start_date  TEXT,
    status      TEXT NOT NULL DEFAULT 'active'
);
CREATE TABLE IF NOT EXISTS time_entries (
    id          TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(id),
    project_id  TEXT REFERENCES projects(id),
    date        TEXT NOT NULL,
    hours       TEXT NOT NULL,
    description TEXT,
    validated   INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS time_entries_employee_date ON time_entries(employee_id, date);
CREATE TABLE IF NOT EXISTS suppliers (
    id      TEXT PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE,
    siret   TEXT,
    email   TEXT
);
CREATE TABLE IF NOT EXISTS purchase_invoices (
    id          TEXT PRIMARY KEY,
    supplier_id TEXT NOT NULL REFERENCES suppliers(id),
    number      TEXT NOT NULL,
    issue_date  TEXT NOT NULL,
    total_ht    TEXT NOT NULL,
    vat_amount  TEXT NOT NULL,
    total_ttc   TEXT NOT NULL,
    status      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS expense_reports (
    id          TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(id),
    period      TEXT NOT NULL,
    total_ht    TEXT NOT NULL,
    vat_amount  TEXT NOT NULL,
    total_ttc   TEXT NOT NULL,
    status      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS custom_field_configs (
    key         TEXT PRIMARY KEY,
    scope       TEXT NOT NULL,
    position    INTEGER NOT NULL,
    config      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS import_jobs (
    id              TEXT PRIMARY KEY,
    entity_type     TEXT NOT NULL,
    file_name       TEXT NOT NULL,
    object_path     TEXT NOT NULL,
    checksum        TEXT NOT NULL,
    state           TEXT NOT NULL,
    total_rows      INTEGER NOT NULL DEFAULT 0,
    imported_rows   INTEGER NOT NULL DEFAULT 0,
    error_count     INTEGER NOT NULL DEFAULT 0,
    errors          TEXT,
    failure         TEXT,
    created_at      TEXT NOT NULL,
    finished_at     TEXT
);
CREATE TABLE IF NOT EXISTS messages (
    id              TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    sender_id       TEXT NOT NULL,
    content         TEXT NOT NULL,
    file_url        TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS messages_conversation ON messages(conversation_id, created_at);
"#;

#[derive(Clone)]
pub struct Database {
    path: Arc<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let db = Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        };
        db.connect()?.execute_batch(SCHEMA)?;
        Ok(db)
    }

    pub fn connect(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(self.path.as_path())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    /// Runs `work` with a fresh connection on the blocking thread pool.
    pub async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let db = self.clone();
        web::block(move || {
            let mut conn = db.connect()?;
            work(&mut conn)
        })
        .await?
    }
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

pub fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => Uuid::parse_str(&text)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| conversion_error(idx, e))
}

/// Parses a stored enum column through its `FromStr` impl.
pub fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let text: String = row.get(idx)?;
    text.parse::<T>()
        .map_err(|e| conversion_error(idx, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let t = test_db();
        let path = t.db.path.as_path().to_path_buf();
        assert!(Database::open(&path).is_ok());
    }

    #[actix_web::test]
    async fn run_executes_on_blocking_pool() {
        let t = test_db();
        let count: i64 = t
            .db
            .run(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM employees", [], |r| r.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
