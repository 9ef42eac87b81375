//! Dashboard figures and the dashboard CSV exports.
//!
//! - `GET /api/dashboard/summary`
//! - `POST /api/dashboard/export`: body `{ type, startDate?, endDate?, format? }`,
//!   answers a file named `dashboard-<type>-<today>.csv`.

mod export;
mod summary;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/dashboard";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/summary", get().to(summary::process))
        .route("/export", post().to(export::process))
}
