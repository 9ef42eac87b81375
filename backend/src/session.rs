//! Session cookie handling and the authentication gate in front of every route.

use crate::clients::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, LOCATION};
use actix_web::middleware::Next;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use serde_json::json;
use std::future::{ready, Ready};

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PAGE: &str = "/login";

/// Routes reachable without a session.
fn is_public(path: &str) -> bool {
    if path == LOGIN_PAGE || path == "/api/auth/login" {
        return true;
    }
    // static assets of the embedded frontend (js, wasm, css, icons)
    !path.starts_with("/api/")
        && path
            .rsplit('/')
            .next()
            .map(|segment| segment.contains('.'))
            .unwrap_or(false)
}

fn access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Resolves the session for every request.
///
/// Anonymous calls to `/api/*` get `401`; anonymous page loads are
/// redirected to `/login`.
pub async fn require_session(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    let path = req.path().to_string();
    if is_public(&path) {
        return Ok(next.call(req).await?.map_into_left_body());
    }

    let user = match (req.app_data::<web::Data<AppState>>(), access_token(&req)) {
        (Some(state), Some(token)) => state.auth.user(&token).await.ok(),
        _ => None,
    };

    match user {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            Ok(next.call(req).await?.map_into_left_body())
        }
        None if path.starts_with("/api/") => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({ "error": "unauthorized", "message": "authentication required" }));
            Ok(req.into_response(resp).map_into_right_body())
        }
        None => {
            let resp = HttpResponse::Found()
                .insert_header((LOCATION, LOGIN_PAGE))
                .finish();
            Ok(req.into_response(resp).map_into_right_body())
        }
    }
}

/// The signed-in user, put in the request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_app;
    use actix_web::cookie::Cookie;
    use actix_web::middleware::from_fn;
    use actix_web::{test, App};

    async fn whoami(user: CurrentUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0.email)
    }

    #[actix_web::test]
    async fn public_paths() {
        assert!(is_public("/login"));
        assert!(is_public("/frontend-1234.wasm"));
        assert!(!is_public("/"));
        assert!(!is_public("/dashboard"));
        assert!(!is_public("/api/imports/recent"));
    }

    #[actix_web::test]
    async fn pages_redirect_and_api_rejects_without_session() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .wrap(from_fn(require_session))
                .route("/api/me", web::get().to(whoami))
                .route("/dashboard", web::get().to(whoami)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/dashboard").to_request()).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/me").to_request()).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/me")
            .cookie(Cookie::new(SESSION_COOKIE, t.token.clone()))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(&body[..], b"manager@example.com");
    }
}
