use super::entries_between;
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::timesheet::{week_bounds, Timesheet};
use common::requests::WeeklyTimesheetQuery;

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: ValidatedQuery<WeeklyTimesheetQuery>,
) -> Result<HttpResponse, ApiError> {
    let WeeklyTimesheetQuery {
        employee_id,
        week_start,
    } = query.into_inner();
    let (from, to) = week_bounds(week_start);

    let entries = state
        .db
        .run(move |conn| entries_between(conn, Some(employee_id), from, to))
        .await?;
    Ok(HttpResponse::Ok().json(Timesheet::from_entries(employee_id, from, to, entries)))
}
