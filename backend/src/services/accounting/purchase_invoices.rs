use super::count_rows;
use crate::db::{decimal_at, parsed_at, uuid_at};
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::accounting::PurchaseInvoiceSummary;
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
                "SELECT i.id, s.name, i.number, i.issue_date, i.total_ht, i.vat_amount, i.total_ttc, i.status
                 FROM purchase_invoices i
                 JOIN suppliers s ON s.id = i.supplier_id
                 ORDER BY i.issue_date DESC, i.number DESC
                 LIMIT ?1 OFFSET ?2",
            )?;
            let items = stmt
                .query_map(
                    params![pagination.limit, pagination.offset() as i64],
                    |row| {
                        Ok(PurchaseInvoiceSummary {
                            id: uuid_at(row, 0)?,
                            supplier_name: row.get(1)?,
                            number: row.get(2)?,
                            issue_date: row.get(3)?,
                            total_ht: decimal_at(row, 4)?,
                            vat_amount: decimal_at(row, 5)?,
                            total_ttc: decimal_at(row, 6)?,
                            status: parsed_at(row, 7)?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;
            let total = count_rows(conn, "purchase_invoices")?;
            Ok(Page::new(items, pagination, total))
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
