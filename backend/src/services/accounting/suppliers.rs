use super::count_rows;
use crate::db::{decimal_at, uuid_at};
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::accounting::SupplierSummary;
use common::model::pagination::{Page, Pagination};
use rusqlite::params;
use rust_decimal::Decimal;

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: ValidatedQuery<Pagination>,
) -> Result<HttpResponse, ApiError> {
    let pagination = query.into_inner();

    let page = state
        .db
        .run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, siret, email FROM suppliers ORDER BY name LIMIT ?1 OFFSET ?2",
            )?;
            let mut suppliers = stmt
                .query_map(
                    params![pagination.limit, pagination.offset() as i64],
                    |row| {
                        Ok(SupplierSummary {
                            id: uuid_at(row, 0)?,
                            name: row.get(1)?,
                            siret: row.get(2)?,
                            email: row.get(3)?,
                            invoice_count: 0,
                            total_ttc: Decimal::ZERO,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;

            let mut totals =
                conn.prepare("SELECT total_ttc FROM purchase_invoices WHERE supplier_id = ?1")?;
            for supplier in suppliers.iter_mut() {
                let amounts = totals
                    .query_map(params![supplier.id.to_string()], |row| decimal_at(row, 0))?
                    .collect::<Result<Vec<_>, _>>()?;
                supplier.invoice_count = amounts.len() as u32;
                supplier.total_ttc = amounts.into_iter().sum();
            }

            let total = count_rows(conn, "suppliers")?;
            Ok(Page::new(suppliers, pagination, total))
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
