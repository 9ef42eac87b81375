use super::count_rows;
use crate::db::{decimal_at, parsed_at, uuid_at};
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::accounting::ExpenseReportSummary;
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
            let mut stmt = conn.prepare(
                "SELECT r.id, e.full_name, r.period, r.total_ht, r.vat_amount, r.total_ttc, r.status
                 FROM expense_reports r
                 JOIN employees e ON e.id = r.employee_id
                 ORDER BY r.period DESC, e.full_name
                 LIMIT ?1 OFFSET ?2",
            )?;
            let items = stmt
                .query_map(
                    params![pagination.limit, pagination.offset() as i64],
                    |row| {
                        Ok(ExpenseReportSummary {
                            id: uuid_at(row, 0)?,
                            employee_name: row.get(1)?,
                            period: row.get(2)?,
                            total_ht: decimal_at(row, 3)?,
                            vat_amount: decimal_at(row, 4)?,
                            total_ttc: decimal_at(row, 5)?,
                            status: parsed_at(row, 6)?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;
            let total = count_rows(conn, "expense_reports")?;
            Ok(Page::new(items, pagination, total))
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
