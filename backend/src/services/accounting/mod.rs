//! Read-only accounting lists, paginated with `?page=&limit=`.
//!
//! - `GET /api/accounting/suppliers`: suppliers with their invoice count and TTC total.
//! - `GET /api/accounting/purchase-invoices`: newest first.
//! - `GET /api/accounting/expense-reports`: newest period first.

mod expense_reports;
mod purchase_invoices;
mod suppliers;

use actix_web::web::{get, scope};
use actix_web::Scope;
use rusqlite::Connection;

const API_PATH: &str = "/api/accounting";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/suppliers", get().to(suppliers::process))
        .route("/purchase-invoices", get().to(purchase_invoices::process))
        .route("/expense-reports", get().to(expense_reports::process))
}

fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n.max(0) as u64)
}

#[cfg(test)]
pub(crate) mod testing {
    use rusqlite::{params, Connection};
    use uuid::Uuid;

    pub fn insert_supplier(conn: &Connection, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO suppliers (id, name) VALUES (?1, ?2)",
            params![id.to_string(), name],
        )
        .unwrap();
        id
    }

    pub fn insert_invoice(conn: &Connection, supplier: Uuid, number: &str, ttc: &str, status: &str) -> Uuid {
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO purchase_invoices (id, supplier_id, number, issue_date, total_ht, vat_amount, total_ttc, status)
             VALUES (?1, ?2, ?3, '2024-02-01', ?4, '0', ?4, ?5)",
            params![id.to_string(), supplier.to_string(), number, ttc, status],
        )
        .unwrap();
        id
    }
}
