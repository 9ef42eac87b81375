//! Custom field configuration endpoints.
//!
//! - `GET /api/custom-fields/{scope}`: configured fields of `task` or `site`, in display order.
//! - `PUT /api/custom-fields`: replaces the whole configuration. The body is an
//!   `UpdateCustomFieldsRequest`; it is validated as a whole before anything is
//!   written and then stored in a single transaction.

mod get;
mod update;

use actix_web::web::{get, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/custom-fields";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", put().to(update::process))
        .route("/{scope}", get().to(get::process))
}

#[cfg(test)]
mod tests {
    use crate::session::SESSION_COOKIE;
    use crate::state::testing::test_app;
    use actix_web::cookie::Cookie;
    use actix_web::{test, web, App};
    use common::model::custom_field::CustomFieldConfig;
    use common::validation::ValidationFailure;
    use serde_json::json;

    fn field(key: &str, scope: &str) -> serde_json::Value {
        json!({ "key": key, "label": key, "type": "select", "scope": scope, "options": ["a", "b"] })
    }

    #[actix_web::test]
    async fn replace_then_read_back_per_scope() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/custom-fields")
            .cookie(Cookie::new(SESSION_COOKIE, t.token.clone()))
            .set_json(json!({ "fields": [field("zone", "site"), field("weather", "task"), field("badge", "site")] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::get().uri("/api/custom-fields/site").to_request();
        let fields: Vec<CustomFieldConfig> = test::call_and_read_body_json(&app, req).await;
        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["zone", "badge"]);
    }

    #[actix_web::test]
    async fn invalid_payload_leaves_configuration_untouched() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/custom-fields")
            .set_json(json!({ "fields": [field("zone", "site")] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        // unknown type
        let req = test::TestRequest::put()
            .uri("/api/custom-fields")
            .set_json(json!({ "fields": [
                field("other", "site"),
                { "key": "colour", "label": "Colour", "type": "color", "scope": "site" }
            ]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert_eq!(failure.error, "validation");

        // duplicate key
        let req = test::TestRequest::put()
            .uri("/api/custom-fields")
            .set_json(json!({ "fields": [field("dup", "site"), field("dup", "task")] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("fields[1].key"));

        let req = test::TestRequest::get().uri("/api/custom-fields/site").to_request();
        let fields: Vec<CustomFieldConfig> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].key, "zone");
    }

    #[actix_web::test]
    async fn unknown_scope_is_rejected() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::configure_routes()),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/custom-fields/invoice").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
