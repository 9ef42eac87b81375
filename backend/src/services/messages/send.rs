use super::{message_from_row, MESSAGE_SELECT};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::session::CurrentUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::requests::SendMessageRequest;
use log::debug;
use rusqlite::params;
use uuid::Uuid;

pub(crate) async fn process(
    conversation_id: web::Path<Uuid>,
    user: CurrentUser,
    state: web::Data<AppState>,
    payload: ValidatedJson<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let conversation_id = conversation_id.into_inner();
    let SendMessageRequest { content, file_url } = payload.into_inner();
    let id = Uuid::new_v4();
    let sender_id = user.0.id;

    let message = state
        .db
        .run(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, content, file_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.to_string(),
                    conversation_id.to_string(),
                    sender_id.to_string(),
                    content,
                    file_url,
                    Utc::now()
                ],
            )?;
            let sql = format!("{} WHERE m.id = ?1", MESSAGE_SELECT);
            Ok(conn.query_row(&sql, params![id.to_string()], message_from_row)?)
        })
        .await?;

    // no receivers just means nobody is listening
    let listeners = state.realtime.send(message.clone()).unwrap_or(0);
    debug!("Message {} published to {} listeners", message.id, listeners);

    Ok(HttpResponse::Created().json(message))
}
