use super::{job_from_row, JOB_COLUMNS};
use crate::error::ApiError;
use crate::export::attachment;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::export::ExportFormat;
use common::validation::ValidationFailure;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

/// Serves the stored original file of an import job.
pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = Uuid::parse_str(&job_id)
        .map_err(|_| ValidationFailure::single("job_id", "job id must be a UUID"))?;

    let job = state
        .db
        .run(move |conn| {
            let sql = format!("SELECT {} FROM import_jobs WHERE id = ?1", JOB_COLUMNS);
            Ok(conn
                .query_row(&sql, params![job_id.to_string()], job_from_row)
                .optional()?)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("import job".into()))?;

    let data = state
        .store
        .download(&state.import_bucket, &job.object_path)
        .await?;
    Ok(attachment(data.to_vec(), &job.file_name, ExportFormat::Csv))
}
