//! Bulk import of spreadsheet data exported as CSV.
//!
//! The provided routes are:
//! - `POST /api/imports/upload`: multipart/form-data with a `meta` part
//!   (`{"entityType": "clients"}`) followed by a `file` part. The header row
//!   is checked against the entity's columns, the file is stored in the
//!   import bucket as `<entity>/<md5>.csv` and a background job is
//!   scheduled. Answers `202` with `{ "jobId" }`.
//! - `GET /api/imports/status/{job_id}`: live `JobStatus` of a job, falling
//!   back to the stored outcome for jobs finished before a restart.
//! - `GET /api/imports/recent`: paginated import history, newest first.
//! - `GET /api/imports/templates/{entity_type}`: empty CSV with the expected header.
//! - `GET /api/imports/{job_id}/file`: the file exactly as it was uploaded.

mod download;
mod get_status;
pub mod pipeline;
mod recent;
mod template;
mod upload;

use crate::db::{parsed_at, uuid_at};
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use common::model::import::ImportJob;
use rusqlite::Row;

const API_PATH: &str = "/api/imports";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/status/{job_id}", get().to(get_status::process))
        .route("/recent", get().to(recent::process))
        .route("/templates/{entity_type}", get().to(template::process))
        .route("/{job_id}/file", get().to(download::process))
}

/// Column list matching [`job_from_row`].
const JOB_COLUMNS: &str = "id, entity_type, file_name, object_path, checksum, state, \
     total_rows, imported_rows, error_count, created_at, finished_at";

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<ImportJob> {
    Ok(ImportJob {
        id: uuid_at(row, 0)?,
        entity_type: parsed_at(row, 1)?,
        file_name: row.get(2)?,
        object_path: row.get(3)?,
        checksum: row.get(4)?,
        state: parsed_at(row, 5)?,
        total_rows: row.get(6)?,
        imported_rows: row.get(7)?,
        error_count: row.get(8)?,
        created_at: row.get(9)?,
        finished_at: row.get(10)?,
    })
}
