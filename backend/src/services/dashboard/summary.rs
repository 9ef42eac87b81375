use crate::db::decimal_at;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::{Datelike, NaiveDate, Utc};
use common::model::dashboard::DashboardSummary;
use common::model::timesheet::month_bounds;
use rusqlite::{params, Connection, Params};
use rust_decimal::Decimal;

pub(crate) async fn process(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let today = Utc::now().date_naive();
    let summary = state.db.run(move |conn| summarize(conn, today)).await?;
    Ok(HttpResponse::Ok().json(summary))
}

fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<u64> {
    conn.query_row(sql, params, |row| row.get::<_, i64>(0))
        .map(|n| n.max(0) as u64)
}

fn sum_decimals<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Decimal> {
    let mut stmt = conn.prepare(sql)?;
    let values = stmt
        .query_map(params, |row| decimal_at(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values.into_iter().sum())
}

pub(crate) fn summarize(conn: &Connection, today: NaiveDate) -> Result<DashboardSummary, ApiError> {
    let month = format!("{:04}-{:02}", today.year(), today.month());
    let (first, last) = month_bounds(&month)
        .ok_or_else(|| ApiError::Internal(format!("no month bounds for {}", month)))?;

    Ok(DashboardSummary {
        employees: count(conn, "SELECT COUNT(*) FROM employees", [])?,
        active_projects: count(
            conn,
            "SELECT COUNT(*) FROM projects WHERE status = 'active'",
            [],
        )?,
        hours_this_month: sum_decimals(
            conn,
            "SELECT hours FROM time_entries WHERE date BETWEEN ?1 AND ?2",
            params![first, last],
        )?,
        unvalidated_entries: count(
            conn,
            "SELECT COUNT(*) FROM time_entries WHERE validated = 0",
            [],
        )?,
        pending_invoices: count(
            conn,
            "SELECT COUNT(*) FROM purchase_invoices WHERE status = 'pending'",
            [],
        )?,
        pending_invoices_ttc: sum_decimals(
            conn,
            "SELECT total_ttc FROM purchase_invoices WHERE status = 'pending'",
            [],
        )?,
        open_expense_reports: count(
            conn,
            "SELECT COUNT(*) FROM expense_reports WHERE status IN ('submitted', 'approved')",
            [],
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_employee, insert_entry, test_db};
    use crate::services::accounting::testing::{insert_invoice, insert_supplier};

    #[test]
    fn figures_cover_current_month_only() {
        let t = test_db();
        let conn = t.db.connect().unwrap();
        let ada = insert_employee(&conn, "Ada", "ada@example.com", None);
        let validated = insert_entry(&conn, ada, "2024-02-01", "7.5");
        insert_entry(&conn, ada, "2024-02-29", "2.25");
        insert_entry(&conn, ada, "2024-01-31", "8");
        conn.execute(
            "UPDATE time_entries SET validated = 1 WHERE id = ?1",
            [validated.to_string()],
        )
        .unwrap();
        let acme = insert_supplier(&conn, "Acme");
        insert_invoice(&conn, acme, "F-1", "100.10", "pending");
        insert_invoice(&conn, acme, "F-2", "50", "pending");
        insert_invoice(&conn, acme, "F-3", "999", "paid");

        let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let summary = summarize(&conn, today).unwrap();
        assert_eq!(summary.employees, 1);
        assert_eq!(summary.hours_this_month, Decimal::new(975, 2));
        assert_eq!(summary.unvalidated_entries, 2);
        assert_eq!(summary.pending_invoices, 2);
        assert_eq!(summary.pending_invoices_ttc, Decimal::new(15010, 2));
        assert_eq!(summary.open_expense_reports, 0);
    }
}
