use crate::db::{opt_uuid_at, uuid_at};
use crate::error::ApiError;
use crate::session::CurrentUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::portal::{PortalClient, PortalOverview, PortalProject};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub(crate) const NOT_LINKED: &str =
    "Your account is not linked to a client yet. Please contact your account manager.";

pub(crate) async fn process(
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user_id = user.0.id;
    let overview = state.db.run(move |conn| overview(conn, user_id)).await?;
    Ok(HttpResponse::Ok().json(overview))
}

fn overview(conn: &Connection, user_id: Uuid) -> Result<PortalOverview, ApiError> {
    let client_id = conn
        .query_row(
            "SELECT client_id FROM users WHERE id = ?1",
            params![user_id.to_string()],
            |row| opt_uuid_at(row, 0),
        )
        .optional()?
        .flatten();

    let client = match client_id {
        Some(id) => conn
            .query_row(
                "SELECT id, name FROM clients WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(PortalClient {
                        id: uuid_at(row, 0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?,
        None => None,
    };

    let Some(client) = client else {
        return Ok(PortalOverview {
            client: None,
            projects: Vec::new(),
            message: Some(NOT_LINKED.to_string()),
        });
    };

    let mut stmt =
        conn.prepare("SELECT id, name, status FROM projects WHERE client_id = ?1 ORDER BY name")?;
    let projects = stmt
        .query_map(params![client.id.to_string()], |row| {
            Ok(PortalProject {
                id: uuid_at(row, 0)?,
                name: row.get(1)?,
                status: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PortalOverview {
        client: Some(client),
        projects,
        message: None,
    })
}
