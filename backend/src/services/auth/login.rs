use crate::clients::auth::AuthError;
use crate::error::ApiError;
use crate::session::SESSION_COOKIE;
use crate::state::AppState;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpResponse};
use common::requests::LoginRequest;
use common::validation::check;
use log::{info, warn};

const MALFORMED: &str = "malformed input";

/// Parses the body by hand so that every malformed request gets the same
/// generic answer, without field details.
pub(crate) async fn process(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request: LoginRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest(MALFORMED.to_string()))?;
    check(&request).map_err(|_| ApiError::BadRequest(MALFORMED.to_string()))?;

    let session = match state.auth.sign_in(&request.email, &request.password).await {
        Ok(session) => session,
        Err(AuthError::InvalidCredentials) => {
            warn!("Rejected sign-in for {}", request.email);
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!("User {} signed in", session.user.email);
    let cookie = Cookie::build(SESSION_COOKIE, session.access_token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(session.user))
}
