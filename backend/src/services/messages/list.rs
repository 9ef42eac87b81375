use super::{message_from_row, MESSAGE_SELECT};
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::pagination::{Page, Pagination};
use rusqlite::params;
use uuid::Uuid;

pub(crate) async fn process(
    conversation_id: web::Path<Uuid>,
    state: web::Data<AppState>,
    query: ValidatedQuery<Pagination>,
) -> Result<HttpResponse, ApiError> {
    let conversation_id = conversation_id.into_inner().to_string();
    let pagination = query.into_inner();

    let page = state
        .db
        .run(move |conn| {
            let sql = format!(
                "{} WHERE m.conversation_id = ?1 ORDER BY m.created_at DESC, m.rowid DESC LIMIT ?2 OFFSET ?3",
                MESSAGE_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(
                    params![conversation_id, pagination.limit, pagination.offset() as i64],
                    message_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
                |r| r.get(0),
            )?;
            Ok(Page::new(items, pagination, total.max(0) as u64))
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
