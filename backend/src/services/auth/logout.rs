use crate::error::ApiError;
use crate::session::SESSION_COOKIE;
use crate::state::AppState;
use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        state.auth.sign_out(cookie.value()).await?;
    }
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();
    Ok(HttpResponse::NoContent().cookie(removal).finish())
}
