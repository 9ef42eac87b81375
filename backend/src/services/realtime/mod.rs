//! Server-sent event stream of inserted chat messages.
//!
//! - `GET /api/realtime/messages?conversationId=`: every message inserted in
//!   that conversation after the stream opened, one `INSERT` event each, the
//!   record as JSON in `data`. Nothing is replayed.

mod stream;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/realtime";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/messages", get().to(stream::process))
}
