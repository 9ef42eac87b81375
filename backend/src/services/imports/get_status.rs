use super::{job_from_row, JOB_COLUMNS};
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::jobs::JobStatus;
use common::model::import::{ImportJob, ImportJobState, ImportReport, RowError};
use common::validation::ValidationFailure;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = Uuid::parse_str(&job_id)
        .map_err(|_| ValidationFailure::single("job_id", "job id must be a UUID"))?;

    if let Some(status) = state.jobs.status(&job_id).await {
        return Ok(HttpResponse::Ok().json(status));
    }

    let stored = state
        .db
        .run(move |conn| {
            let sql = format!("SELECT {}, errors, failure FROM import_jobs WHERE id = ?1", JOB_COLUMNS);
            Ok(conn
                .query_row(&sql, params![job_id.to_string()], |row| {
                    Ok((
                        job_from_row(row)?,
                        row.get::<_, Option<String>>(11)?,
                        row.get::<_, Option<String>>(12)?,
                    ))
                })
                .optional()?)
        })
        .await?;

    match stored {
        Some((job, errors, failure)) => Ok(HttpResponse::Ok().json(stored_status(&job, errors, failure))),
        None => Err(ApiError::NotFound("import job".into())),
    }
}

/// Status of a job that is no longer tracked in memory.
fn stored_status(job: &ImportJob, errors: Option<String>, failure: Option<String>) -> JobStatus {
    match job.state {
        ImportJobState::Pending => JobStatus::Pending,
        ImportJobState::Completed | ImportJobState::CompletedWithErrors => {
            let errors: Vec<RowError> = errors
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or_default();
            JobStatus::Completed(ImportReport {
                total_rows: job.total_rows,
                imported_rows: job.imported_rows,
                errors,
            })
        }
        ImportJobState::Failed => {
            JobStatus::Failed(failure.unwrap_or_else(|| "import failed".to_string()))
        }
        // the worker died with the previous process
        ImportJobState::Processing => JobStatus::Failed("import was interrupted".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::imports::pipeline::finish_job;
    use crate::state::testing::test_app;
    use actix_web::{test, web, App};
    use chrono::Utc;
    use common::jobs::JobStatus;
    use common::model::import::{ImportReport, RowError};
    use rusqlite::params;
    use uuid::Uuid;

    #[actix_web::test]
    async fn falls_back_to_the_stored_outcome() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO import_jobs (id, entity_type, file_name, object_path, checksum, state, created_at)
             VALUES (?1, 'clients', 'c.csv', 'clients/x.csv', 'x', 'processing', ?2)",
            params![id.to_string(), Utc::now()],
        )
        .unwrap();
        let report = ImportReport {
            total_rows: 2,
            imported_rows: 1,
            errors: vec![RowError {
                row: 3,
                column: Some("email".into()),
                message: "bad".into(),
            }],
        };
        finish_job(&conn, id, &JobStatus::Completed(report.clone())).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/imports/status/{}", id))
            .to_request();
        let status: JobStatus = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status, JobStatus::Completed(report));

        let req = test::TestRequest::get()
            .uri(&format!("/api/imports/status/{}", Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/api/imports/status/42").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
