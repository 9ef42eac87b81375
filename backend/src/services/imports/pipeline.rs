//! Background processing of an uploaded import file.
//!
//! The job downloads the stored file, parses it with the `csv` crate, checks
//! every data row in parallel with `rayon` and inserts the rows that pass in
//! one transaction. Rows that fail (bad cell, unknown reference, duplicate)
//! are collected as [`RowError`]s; only an unreadable file or a storage or
//! database outage fails the job as a whole.

use crate::clients::storage::{ObjectStore, StorageError};
use crate::db::Database;
use crate::job_controller::state::JobUpdate;
use chrono::{NaiveDate, Utc};
use common::jobs::JobStatus;
use common::model::import::{
    normalize_header, ColumnKind, ImportEntityType, ImportJob, ImportJobState, ImportReport,
    RowError,
};
use log::{error, info, warn};
use rayon::prelude::*;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;
use validator::ValidateEmail;

/// Candidate separators; spreadsheets exported in European locales use `;`.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];
/// A progress update is sent every this many persisted rows.
const PROGRESS_EVERY: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("the file contains no header row")]
    Empty,

    #[error("the file could not be read as CSV: {0}")]
    Parse(#[from] csv::Error),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("import task stopped unexpectedly: {0}")]
    Interrupted(String),
}

/// Header and non-blank data rows of a sheet. Each row keeps its 1-based line number.
#[derive(Debug)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<(usize, Vec<String>)>,
}

/// A row whose cells passed validation, normalized and aligned with
/// `ImportEntityType::columns()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub line: usize,
    pub values: Vec<Option<String>>,
}

impl ParsedRow {
    fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Picks the separator occurring most often in the first line. Ties go to the
/// earlier entry of `DELIMITERS`, and a single-column sheet gets `,`.
pub fn detect_delimiter(data: &[u8]) -> u8 {
    let first_line = strip_bom(data).split(|b| *b == b'\n').next().unwrap_or_default();
    DELIMITERS
        .iter()
        .rev()
        .map(|d| (*d, first_line.iter().filter(|b| *b == d).count()))
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(_, n)| *n)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
    let data = strip_bom(data);
    csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(data))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data)
}

/// Normalized header cells only. Used to reject a bad file before it is stored.
pub fn sheet_headers(data: &[u8]) -> Result<Vec<String>, ImportError> {
    let headers: Vec<String> = reader(data).headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::Empty);
    }
    Ok(headers)
}

pub fn parse_sheet(data: &[u8]) -> Result<Sheet, ImportError> {
    let mut reader = reader(data);
    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        rows.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(Sheet { headers, rows })
}

/// Position in the sheet of every expected column, in `columns()` order.
/// Extra sheet columns are ignored; a missing required one is an error.
pub fn map_columns(
    entity: ImportEntityType,
    headers: &[String],
) -> Result<Vec<Option<usize>>, ImportError> {
    let mut missing = Vec::new();
    let positions = entity
        .columns()
        .iter()
        .map(|column| {
            let position = headers.iter().position(|h| h == column.name);
            if position.is_none() && column.required {
                missing.push(column.name.to_string());
            }
            position
        })
        .collect();

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(ImportError::MissingColumns(missing))
    }
}

/// Checks one cell and returns its normalized form.
fn validate_cell(kind: ColumnKind, raw: &str) -> Result<String, String> {
    match kind {
        ColumnKind::Text => Ok(raw.to_string()),
        ColumnKind::Email => {
            if raw.validate_email() {
                Ok(raw.to_lowercase())
            } else {
                Err(format!("'{}' is not a valid email", raw))
            }
        }
        ColumnKind::Number => {
            let cleaned: String = raw
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            match Decimal::from_str(&cleaned) {
                Ok(value) if value.is_sign_negative() => {
                    Err(format!("'{}' must not be negative", raw))
                }
                Ok(value) => Ok(value.normalize().to_string()),
                Err(_) => Err(format!("'{}' is not a number", raw)),
            }
        }
        ColumnKind::Date => DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .map(|date| date.to_string())
            .ok_or_else(|| format!("'{}' is not a date (expected YYYY-MM-DD)", raw)),
    }
}

fn validate_row(
    entity: ImportEntityType,
    positions: &[Option<usize>],
    line: usize,
    cells: &[String],
) -> Result<ParsedRow, Vec<RowError>> {
    let mut values = Vec::with_capacity(positions.len());
    let mut errors = Vec::new();

    for (column, position) in entity.columns().iter().zip(positions) {
        let raw = position
            .and_then(|p| cells.get(p))
            .map(|c| c.as_str())
            .filter(|c| !c.is_empty());
        match raw {
            None if column.required => errors.push(RowError {
                row: line,
                column: Some(column.name.to_string()),
                message: format!("{} is required", column.name),
            }),
            None => values.push(None),
            Some(raw) => match validate_cell(column.kind, raw) {
                Ok(value) => values.push(Some(value)),
                Err(message) => errors.push(RowError {
                    row: line,
                    column: Some(column.name.to_string()),
                    message,
                }),
            },
        }
    }

    if errors.is_empty() {
        Ok(ParsedRow { line, values })
    } else {
        Err(errors)
    }
}

/// Splits rows into valid ones and cell errors. Order of both follows the sheet.
pub fn validate_rows(
    entity: ImportEntityType,
    positions: &[Option<usize>],
    rows: &[(usize, Vec<String>)],
) -> (Vec<ParsedRow>, Vec<RowError>) {
    let results: Vec<Result<ParsedRow, Vec<RowError>>> = rows
        .par_iter()
        .map(|(line, cells)| validate_row(entity, positions, *line, cells))
        .collect();

    let mut valid = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(row) => valid.push(row),
            Err(mut row_errors) => errors.append(&mut row_errors),
        }
    }
    (valid, errors)
}

enum RowFailure {
    Rejected(Option<&'static str>, String),
    Fatal(rusqlite::Error),
}

impl From<rusqlite::Error> for RowFailure {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                RowFailure::Rejected(None, "row conflicts with an existing record".to_string())
            }
            _ => RowFailure::Fatal(err),
        }
    }
}

fn lookup(
    tx: &Transaction<'_>,
    sql: &str,
    key: &str,
    column: &'static str,
) -> Result<String, RowFailure> {
    tx.query_row(sql, params![key], |row| row.get::<_, String>(0))
        .optional()?
        .ok_or_else(|| RowFailure::Rejected(Some(column), format!("no record matches '{}'", key)))
}

fn insert_row(
    tx: &Transaction<'_>,
    entity: ImportEntityType,
    row: &ParsedRow,
) -> Result<(), RowFailure> {
    let id = Uuid::new_v4().to_string();
    match entity {
        ImportEntityType::Clients => {
            tx.execute(
                "INSERT INTO clients (id, name, email, phone, siret) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, row.get(0), row.get(1), row.get(2), row.get(3)],
            )?;
        }
        ImportEntityType::Employees => {
            tx.execute(
                "INSERT INTO employees (id, full_name, email, hourly_rate) VALUES (?1, ?2, ?3, ?4)",
                params![id, row.get(0), row.get(1), row.get(2)],
            )?;
        }
        ImportEntityType::Projects => {
            let client_id = match row.get(1) {
                Some(name) => Some(lookup(
                    tx,
                    "SELECT id FROM clients WHERE name = ?1",
                    name,
                    "client_name",
                )?),
                None => None,
            };
            tx.execute(
                "INSERT INTO projects (id, name, client_id, start_date) VALUES (?1, ?2, ?3, ?4)",
                params![id, row.get(0), client_id, row.get(2)],
            )?;
        }
        ImportEntityType::TimeEntries => {
            let employee_id = match row.get(0) {
                Some(email) => lookup(
                    tx,
                    "SELECT id FROM employees WHERE lower(email) = ?1",
                    email,
                    "employee_email",
                )?,
                None => {
                    return Err(RowFailure::Rejected(
                        Some("employee_email"),
                        "employee_email is required".to_string(),
                    ))
                }
            };
            let project_id = match row.get(3) {
                Some(name) => Some(lookup(
                    tx,
                    "SELECT id FROM projects WHERE name = ?1",
                    name,
                    "project_name",
                )?),
                None => None,
            };
            tx.execute(
                "INSERT INTO time_entries (id, employee_id, project_id, date, hours, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, employee_id, project_id, row.get(1), row.get(2), row.get(4)],
            )?;
        }
        ImportEntityType::Suppliers => {
            tx.execute(
                "INSERT INTO suppliers (id, name, siret, email) VALUES (?1, ?2, ?3, ?4)",
                params![id, row.get(0), row.get(1), row.get(2)],
            )?;
        }
    }
    Ok(())
}

/// Inserts `rows` in one transaction. A rejected row is reported and skipped;
/// any other database error rolls everything back.
pub fn persist_rows(
    conn: &mut Connection,
    entity: ImportEntityType,
    rows: &[ParsedRow],
    mut progress: impl FnMut(usize),
) -> Result<(u32, Vec<RowError>), rusqlite::Error> {
    let tx = conn.transaction()?;
    let mut imported = 0u32;
    let mut errors = Vec::new();

    for (done, row) in rows.iter().enumerate() {
        match insert_row(&tx, entity, row) {
            Ok(()) => imported += 1,
            Err(RowFailure::Rejected(column, message)) => errors.push(RowError {
                row: row.line,
                column: column.map(str::to_string),
                message,
            }),
            Err(RowFailure::Fatal(e)) => return Err(e),
        }
        if (done + 1) % PROGRESS_EVERY == 0 {
            progress(done + 1);
        }
    }

    tx.commit()?;
    Ok((imported, errors))
}

/// A lost progress update only affects what pollers see, so the import goes on.
fn report_progress(tx: &mpsc::Sender<JobUpdate>, job_id: Uuid, rows: u32) {
    if let Err(e) = tx.blocking_send(JobUpdate::progress(job_id, JobStatus::InProgress(rows))) {
        warn!("Progress of import {} was not recorded: {}", job_id, e);
    }
}

/// Whole import of an already downloaded file. Runs on the blocking pool.
pub fn process_file(
    db: &Database,
    entity: ImportEntityType,
    data: &[u8],
    job_id: Uuid,
    tx: &mpsc::Sender<JobUpdate>,
) -> Result<ImportReport, ImportError> {
    let start = Instant::now();
    let sheet = parse_sheet(data)?;
    let positions = map_columns(entity, &sheet.headers)?;
    let (valid, mut errors) = validate_rows(entity, &positions, &sheet.rows);

    report_progress(tx, job_id, 0);
    let mut conn = db.connect()?;
    let (imported_rows, mut rejected) =
        persist_rows(&mut conn, entity, &valid, |done| report_progress(tx, job_id, done as u32))?;

    errors.append(&mut rejected);
    errors.sort_by_key(|e| e.row);
    info!(
        "Import {} ({}) finished in {:.2?}: {} rows, {} imported, {} errors",
        job_id,
        entity.as_str(),
        start.elapsed(),
        sheet.rows.len(),
        imported_rows,
        errors.len()
    );
    Ok(ImportReport {
        total_rows: sheet.rows.len() as u32,
        imported_rows,
        errors,
    })
}

fn set_state(conn: &Connection, job_id: Uuid, state: ImportJobState) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE import_jobs SET state = ?1 WHERE id = ?2",
        params![state.as_str(), job_id.to_string()],
    )?;
    Ok(())
}

/// Persists the final status of a job.
pub(crate) fn finish_job(conn: &Connection, job_id: Uuid, status: &JobStatus) -> rusqlite::Result<()> {
    let now = Utc::now();
    match status {
        JobStatus::Completed(report) => {
            let errors = serde_json::to_string(&report.errors)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            conn.execute(
                "UPDATE import_jobs
                 SET state = ?1, total_rows = ?2, imported_rows = ?3, error_count = ?4,
                     errors = ?5, finished_at = ?6
                 WHERE id = ?7",
                params![
                    report.final_state().as_str(),
                    report.total_rows,
                    report.imported_rows,
                    report.errors.len() as u32,
                    errors,
                    now,
                    job_id.to_string()
                ],
            )?;
        }
        JobStatus::Failed(reason) => {
            conn.execute(
                "UPDATE import_jobs SET state = ?1, failure = ?2, finished_at = ?3 WHERE id = ?4",
                params![ImportJobState::Failed.as_str(), reason, now, job_id.to_string()],
            )?;
        }
        JobStatus::Pending | JobStatus::InProgress(_) => {}
    }
    Ok(())
}

async fn execute(
    db: &Database,
    store: &dyn ObjectStore,
    bucket: &str,
    job: &ImportJob,
    tx: &mpsc::Sender<JobUpdate>,
) -> Result<ImportReport, ImportError> {
    let data = store.download(bucket, &job.object_path).await?;
    let db = db.clone();
    let tx = tx.clone();
    let (entity, job_id) = (job.entity_type, job.id);

    tokio::task::spawn_blocking(move || {
        set_state(&db.connect()?, job_id, ImportJobState::Processing)?;
        process_file(&db, entity, &data, job_id, &tx)
    })
    .await
    .map_err(|e| ImportError::Interrupted(e.to_string()))?
}

/// Runs a scheduled import to its end and publishes the outcome.
///
/// The final status is written to `import_jobs` before it reaches the job
/// map, so a client that sees a finished status can also list it.
pub(crate) async fn run(
    db: Database,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    job: ImportJob,
    tx: mpsc::Sender<JobUpdate>,
) {
    let status = match execute(&db, store.as_ref(), &bucket, &job, &tx).await {
        Ok(report) => JobStatus::Completed(report),
        Err(e) => {
            error!("Import {} failed: {}", job.id, e);
            JobStatus::Failed(e.to_string())
        }
    };

    let job_id = job.id;
    let stored = status.clone();
    let saved = tokio::task::spawn_blocking(move || {
        let conn = db.connect()?;
        finish_job(&conn, job_id, &stored)
    })
    .await;
    let stored = match saved {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("Could not record outcome of import {}: {}", job_id, e);
            false
        }
        Err(e) => {
            error!("Could not record outcome of import {}: {}", job_id, e);
            false
        }
    };

    if let Err(e) = tx.send(JobUpdate { job_id, status, stored }).await {
        warn!("Outcome of import {} did not reach the job map: {}", job_id, e);
    }
}
