use super::entries_between;
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::timesheet::{month_bounds, Timesheet};
use common::requests::MonthlyTimesheetQuery;
use common::validation::ValidationFailure;

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: ValidatedQuery<MonthlyTimesheetQuery>,
) -> Result<HttpResponse, ApiError> {
    let MonthlyTimesheetQuery { employee_id, month } = query.into_inner();
    let (from, to) = month_bounds(&month)
        .ok_or_else(|| ValidationFailure::single("month", "month must be formatted YYYY-MM"))?;

    let entries = state
        .db
        .run(move |conn| entries_between(conn, Some(employee_id), from, to))
        .await?;
    Ok(HttpResponse::Ok().json(Timesheet::from_entries(employee_id, from, to, entries)))
}

#[cfg(test)]
mod tests {
    use crate::db::testing::{insert_employee, insert_entry};
    use crate::state::testing::test_app;
    use actix_web::{test, web, App};
    use common::model::timesheet::Timesheet;
    use common::validation::ValidationFailure;
    use rust_decimal::Decimal;

    #[actix_web::test]
    async fn month_totals_and_bad_month() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let ada = insert_employee(&conn, "Ada", "ada@example.com", None);
        insert_entry(&conn, ada, "2024-02-01", "7.5");
        insert_entry(&conn, ada, "2024-02-01", "0.5");
        insert_entry(&conn, ada, "2024-02-29", "4");
        insert_entry(&conn, ada, "2024-03-01", "8");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/timesheets/monthly?employeeId={}&month=2024-02", ada))
            .to_request();
        let sheet: Timesheet = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sheet.days.len(), 2);
        assert_eq!(sheet.total_hours, Decimal::new(12, 0));

        let req = test::TestRequest::get()
            .uri(&format!("/api/timesheets/monthly?employeeId={}&month=2024-13", ada))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("month"));
    }
}
