use super::{job_from_row, JOB_COLUMNS};
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::pagination::{Page, Pagination};
use rusqlite::params;

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: ValidatedQuery<Pagination>,
) -> Result<HttpResponse, ApiError> {
    let pagination = query.into_inner();

    let page = state
        .db
        .run(move |conn| {
            let sql = format!(
                "SELECT {} FROM import_jobs ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                JOB_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let jobs = stmt
                .query_map(
                    params![pagination.limit, pagination.offset() as i64],
                    job_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM import_jobs", [], |r| r.get(0))?;
            Ok(Page::new(jobs, pagination, total.max(0) as u64))
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
