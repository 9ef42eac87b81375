use super::entries_between;
use crate::error::ApiError;
use crate::export::{attachment, to_csv};
use crate::extract::ValidatedJson;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::TimesheetExportRequest;
use log::info;

const HEADER: [&str; 6] = ["date", "employee_id", "project_id", "hours", "validated", "description"];

pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: ValidatedJson<TimesheetExportRequest>,
) -> Result<HttpResponse, ApiError> {
    let TimesheetExportRequest {
        employee_id,
        date_from,
        date_to,
        format,
    } = payload.into_inner();

    let entries = state
        .db
        .run(move |conn| entries_between(conn, employee_id, date_from, date_to))
        .await?;

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.date.to_string(),
                e.employee_id.to_string(),
                e.project_id.map(|p| p.to_string()).unwrap_or_default(),
                e.hours.to_string(),
                e.validated.to_string(),
                e.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let bytes = to_csv(&HEADER, &rows)?;

    info!("Exported {} time entries ({} to {})", rows.len(), date_from, date_to);
    let filename = format!("timesheet-{}-{}.{}", date_from, date_to, format.extension());
    Ok(attachment(bytes, &filename, format))
}

#[cfg(test)]
mod tests {
    use crate::db::testing::{insert_employee, insert_entry};
    use crate::state::testing::test_app;
    use actix_web::http::header::CONTENT_DISPOSITION;
    use actix_web::{test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn exports_range_as_csv_attachment() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let ada = insert_employee(&conn, "Ada", "ada@example.com", None);
        insert_entry(&conn, ada, "2024-02-01", "7.5");
        insert_entry(&conn, ada, "2024-03-01", "8");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/timesheets/export")
            .set_json(json!({ "dateFrom": "2024-02-01", "dateTo": "2024-02-29" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let disposition = resp.headers().get(CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
        assert!(disposition.contains("timesheet-2024-02-01-2024-02-29.csv"));

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("date,employee_id"));
        assert!(lines[1].starts_with("2024-02-01,"));
    }

    #[actix_web::test]
    async fn unknown_format_is_a_validation_error() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/timesheets/export")
            .set_json(json!({ "dateFrom": "2024-02-01", "dateTo": "2024-02-29", "format": "pdf" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
