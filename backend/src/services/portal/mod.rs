//! Client portal.
//!
//! - `GET /api/portal/me`: the client linked to the signed-in account and
//!   its projects. An account without a linked client is not an error: the
//!   answer carries no client and a message to show instead.

mod me;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/portal";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/me", get().to(me::process))
}
