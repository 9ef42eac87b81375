use crate::db::decimal_at;
use crate::error::ApiError;
use crate::export::{attachment, to_csv};
use crate::extract::ValidatedJson;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use common::model::export::{export_filename, DashboardExportType};
use common::requests::DashboardExportRequest;
use log::info;
use rusqlite::{params, Connection};

type Rows = Vec<Vec<String>>;

const TIME_ENTRIES_HEADER: &[&str] = &["date", "employee", "project", "hours", "validated", "description"];
const PROJECTS_HEADER: &[&str] = &["name", "client", "start_date", "status"];
const INVOICES_HEADER: &[&str] = &["number", "supplier", "issue_date", "total_ht", "vat_amount", "total_ttc", "status"];
const EXPENSES_HEADER: &[&str] = &["employee", "period", "total_ht", "vat_amount", "total_ttc", "status"];

pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: ValidatedJson<DashboardExportRequest>,
) -> Result<HttpResponse, ApiError> {
    let DashboardExportRequest {
        kind,
        start_date,
        end_date,
        format,
    } = payload.into_inner();

    let (header, rows) = state
        .db
        .run(move |conn| collect(conn, kind, start_date, end_date))
        .await?;
    let bytes = to_csv(header, &rows)?;

    let filename = export_filename(kind, Utc::now().date_naive(), format);
    info!("Dashboard export {} ({} rows)", filename, rows.len());
    Ok(attachment(bytes, &filename, format))
}

/// Header and rows of one export kind. Open bounds are unbounded.
fn collect(
    conn: &Connection,
    kind: DashboardExportType,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(&'static [&'static str], Rows), ApiError> {
    match kind {
        DashboardExportType::TimeEntries => Ok((TIME_ENTRIES_HEADER, time_entries(conn, start, end)?)),
        DashboardExportType::Projects => Ok((PROJECTS_HEADER, projects(conn, start, end)?)),
        DashboardExportType::Invoices => Ok((INVOICES_HEADER, invoices(conn, start, end)?)),
        DashboardExportType::Expenses => Ok((EXPENSES_HEADER, expenses(conn, start, end)?)),
    }
}

fn time_entries(conn: &Connection, start: Option<NaiveDate>, end: Option<NaiveDate>) -> rusqlite::Result<Rows> {
    let mut stmt = conn.prepare(
        "SELECT t.date, e.full_name, p.name, t.hours, t.validated, t.description
         FROM time_entries t
         JOIN employees e ON e.id = t.employee_id
         LEFT JOIN projects p ON p.id = t.project_id
         WHERE (?1 IS NULL OR t.date >= ?1) AND (?2 IS NULL OR t.date <= ?2)
         ORDER BY t.date, e.full_name",
    )?;
    let rows = stmt
        .query_map(params![start, end], |row| {
            Ok(vec![
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                decimal_at(row, 3)?.to_string(),
                row.get::<_, bool>(4)?.to_string(),
                row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            ])
        })?
        .collect();
    rows
}

fn projects(conn: &Connection, start: Option<NaiveDate>, end: Option<NaiveDate>) -> rusqlite::Result<Rows> {
    let mut stmt = conn.prepare(
        "SELECT p.name, c.name, p.start_date, p.status
         FROM projects p
         LEFT JOIN clients c ON c.id = p.client_id
         WHERE (?1 IS NULL OR p.start_date >= ?1) AND (?2 IS NULL OR p.start_date <= ?2)
         ORDER BY p.name",
    )?;
    let rows = stmt
        .query_map(params![start, end], |row| {
            Ok(vec![
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                row.get::<_, String>(3)?,
            ])
        })?
        .collect();
    rows
}

fn invoices(conn: &Connection, start: Option<NaiveDate>, end: Option<NaiveDate>) -> rusqlite::Result<Rows> {
    let mut stmt = conn.prepare(
        "SELECT i.number, s.name, i.issue_date, i.total_ht, i.vat_amount, i.total_ttc, i.status
         FROM purchase_invoices i
         JOIN suppliers s ON s.id = i.supplier_id
         WHERE (?1 IS NULL OR i.issue_date >= ?1) AND (?2 IS NULL OR i.issue_date <= ?2)
         ORDER BY i.issue_date, i.number",
    )?;
    let rows = stmt
        .query_map(params![start, end], |row| {
            Ok(vec![
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                decimal_at(row, 3)?.to_string(),
                decimal_at(row, 4)?.to_string(),
                decimal_at(row, 5)?.to_string(),
                row.get::<_, String>(6)?,
            ])
        })?
        .collect();
    rows
}

/// Expense reports are per month; a bound matches every report of its month.
fn expenses(conn: &Connection, start: Option<NaiveDate>, end: Option<NaiveDate>) -> rusqlite::Result<Rows> {
    let month = |d: NaiveDate| d.format("%Y-%m").to_string();
    let mut stmt = conn.prepare(
        "SELECT e.full_name, r.period, r.total_ht, r.vat_amount, r.total_ttc, r.status
         FROM expense_reports r
         JOIN employees e ON e.id = r.employee_id
         WHERE (?1 IS NULL OR r.period >= ?1) AND (?2 IS NULL OR r.period <= ?2)
         ORDER BY r.period, e.full_name",
    )?;
    let rows = stmt
        .query_map(params![start.map(month), end.map(month)], |row| {
            Ok(vec![
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                decimal_at(row, 2)?.to_string(),
                decimal_at(row, 3)?.to_string(),
                decimal_at(row, 4)?.to_string(),
                row.get::<_, String>(5)?,
            ])
        })?
        .collect();
    rows
}

#[cfg(test)]
mod tests {
    use crate::db::testing::{insert_employee, insert_entry};
    use crate::services::accounting::testing::{insert_invoice, insert_supplier};
    use crate::state::testing::test_app;
    use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use actix_web::{test, web, App};
    use chrono::Utc;
    use serde_json::json;

    #[actix_web::test]
    async fn time_entries_export_is_filtered_and_named() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let ada = insert_employee(&conn, "Ada", "ada@example.com", None);
        insert_entry(&conn, ada, "2024-01-31", "8");
        insert_entry(&conn, ada, "2024-02-01", "7.5");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/dashboard/export")
            .set_json(json!({ "type": "time-entries", "startDate": "2024-02-01" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert!(resp
            .headers()
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let expected = format!("dashboard-time-entries-{}.csv", Utc::now().date_naive().format("%Y-%m-%d"));
        let disposition = resp.headers().get(CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains(&expected), "{}", disposition);

        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert_eq!(body.lines().count(), 2);
        assert!(body.contains("2024-02-01,Ada,,7.5,false,"));
    }

    #[actix_web::test]
    async fn invoices_export_and_unknown_type() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let acme = insert_supplier(&conn, "Acme");
        insert_invoice(&conn, acme, "F-1", "120.50", "pending");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/dashboard/export")
            .set_json(json!({ "type": "invoices", "format": "csv" }))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("F-1,Acme,2024-02-01,120.50,0,120.50,pending"));

        let req = test::TestRequest::post()
            .uri("/api/dashboard/export")
            .set_json(json!({ "type": "payroll" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
