use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::timesheet::BulkValidateResult;
use common::requests::BulkValidateTimeEntriesRequest;
use log::info;
use rusqlite::params_from_iter;

pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: ValidatedJson<BulkValidateTimeEntriesRequest>,
) -> Result<HttpResponse, ApiError> {
    let ids: Vec<String> = payload.ids.iter().map(|id| id.to_string()).collect();
    let requested = ids.len();

    let validated = state
        .db
        .run(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "UPDATE time_entries SET validated = 1 WHERE id IN ({})",
                placeholders
            );
            Ok(conn.execute(&sql, params_from_iter(ids.iter()))?)
        })
        .await?;

    info!("Validated {} of {} requested time entries", validated, requested);
    Ok(HttpResponse::Ok().json(BulkValidateResult {
        requested,
        validated,
    }))
}

#[cfg(test)]
mod tests {
    use crate::db::testing::{insert_employee, insert_entry};
    use crate::state::testing::test_app;
    use actix_web::{test, web, App};
    use common::model::timesheet::BulkValidateResult;
    use common::validation::ValidationFailure;
    use serde_json::json;
    use uuid::Uuid;

    #[actix_web::test]
    async fn validates_known_ids_only() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let emp = insert_employee(&conn, "Ada", "ada@example.com", None);
        let a = insert_entry(&conn, emp, "2024-02-01", "7.5");
        let b = insert_entry(&conn, emp, "2024-02-02", "8");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/time-entries/validate")
            .set_json(json!({ "ids": [a, b, Uuid::new_v4()] }))
            .to_request();
        let result: BulkValidateResult = test::call_and_read_body_json(&app, req).await;
        assert_eq!(result, BulkValidateResult { requested: 3, validated: 2 });

        let flagged: i64 = conn
            .query_row("SELECT COUNT(*) FROM time_entries WHERE validated = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(flagged, 2);
    }

    #[actix_web::test]
    async fn empty_and_oversized_batches_are_rejected() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/time-entries/validate")
            .set_json(json!({ "ids": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("ids"));

        let ids: Vec<Uuid> = (0..501).map(|_| Uuid::new_v4()).collect();
        let req = test::TestRequest::post()
            .uri("/api/time-entries/validate")
            .set_json(json!({ "ids": ids }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/time-entries/validate")
            .set_json(json!({ "ids": ["nope"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("body"));
    }
}
