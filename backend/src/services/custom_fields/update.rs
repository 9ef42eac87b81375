use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::UpdateCustomFieldsRequest;
use log::info;
use rusqlite::params;

/// Replaces the stored configuration with the (already validated) payload.
pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: ValidatedJson<UpdateCustomFieldsRequest>,
) -> Result<HttpResponse, ApiError> {
    let fields = payload.into_inner().fields;
    let count = fields.len();

    let saved = state
        .db
        .run(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM custom_field_configs", [])?;
            for (position, field) in fields.iter().enumerate() {
                let config = serde_json::to_string(field)
                    .map_err(|e| ApiError::Internal(e.to_string()))?;
                tx.execute(
                    "INSERT INTO custom_field_configs (key, scope, position, config) VALUES (?1, ?2, ?3, ?4)",
                    params![field.key, field.scope.as_str(), position as i64, config],
                )?;
            }
            tx.commit()?;
            Ok(fields)
        })
        .await?;

    info!("Custom field configuration replaced ({} fields)", count);
    Ok(HttpResponse::Ok().json(saved))
}
