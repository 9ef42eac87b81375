use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::custom_field::{CustomFieldConfig, CustomFieldScope};
use common::validation::ValidationFailure;
use rusqlite::params;

pub(crate) async fn process(
    scope: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let scope: CustomFieldScope = scope
        .parse()
        .map_err(|e: String| ValidationFailure::single("scope", e))?;
    let fields = state.db.run(move |conn| load_fields(conn, scope)).await?;
    Ok(HttpResponse::Ok().json(fields))
}

pub(crate) fn load_fields(
    conn: &rusqlite::Connection,
    scope: CustomFieldScope,
) -> Result<Vec<CustomFieldConfig>, ApiError> {
    let mut stmt =
        conn.prepare("SELECT config FROM custom_field_configs WHERE scope = ?1 ORDER BY position")?;
    let raw: Vec<String> = stmt
        .query_map(params![scope.as_str()], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    raw.iter()
        .map(|json| {
            serde_json::from_str(json)
                .map_err(|e| ApiError::Internal(format!("stored custom field is corrupt: {}", e)))
        })
        .collect()
}
