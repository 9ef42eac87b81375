//! Time entry endpoints.
//!
//! - `POST /api/time-entries/validate`: marks a batch of entries as validated.
//!   Unknown ids are ignored; the response tells how many rows were updated.

mod validate;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/time-entries";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/validate", post().to(validate::process))
}
