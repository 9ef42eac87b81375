//! Sign-in and sign-out.
//!
//! - `POST /api/auth/login`: `{ email, password }`. On success the provider's
//!   access token is stored in the `session` cookie. Failures only tell apart
//!   a malformed request (`400`) from wrong credentials (`401`).
//! - `POST /api/auth/logout`: revokes the token and clears the cookie.

mod login;
mod logout;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/logout", post().to(logout::process))
}
