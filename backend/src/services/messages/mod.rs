//! Conversation messages.
//!
//! - `GET /api/conversations/{id}/messages`: paginated history, newest first.
//! - `POST /api/conversations/{id}/messages`: stores a message from the
//!   signed-in user and publishes it to realtime subscribers.

mod list;
mod send;

use crate::db::{opt_uuid_at, uuid_at};
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use common::model::message::{MessageSender, RealtimeMessage};
use rusqlite::Row;

const API_PATH: &str = "/api/conversations";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/{conversation_id}/messages", get().to(list::process))
        .route("/{conversation_id}/messages", post().to(send::process))
}

const MESSAGE_SELECT: &str = "SELECT m.id, m.conversation_id, m.sender_id, m.content, m.file_url, \
     m.is_read, m.created_at, u.id, u.full_name, u.avatar_url \
     FROM messages m LEFT JOIN users u ON u.id = m.sender_id";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<RealtimeMessage> {
    let sender = match opt_uuid_at(row, 7)? {
        Some(id) => Some(MessageSender {
            id,
            full_name: row.get(8)?,
            avatar_url: row.get(9)?,
        }),
        None => None,
    };
    Ok(RealtimeMessage {
        id: uuid_at(row, 0)?,
        conversation_id: uuid_at(row, 1)?,
        sender_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        file_url: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
        sender,
    })
}

#[cfg(test)]
mod tests {
    use crate::session::{require_session, SESSION_COOKIE};
    use crate::state::testing::test_app;
    use actix_web::cookie::Cookie;
    use actix_web::middleware::from_fn;
    use actix_web::{test, web, App};
    use common::model::message::RealtimeMessage;
    use common::model::pagination::Page;
    use common::validation::ValidationFailure;
    use serde_json::json;
    use uuid::Uuid;

    #[actix_web::test]
    async fn send_publishes_and_list_pages_newest_first() {
        let t = test_app().await;
        let mut events = t.state.realtime.subscribe();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .wrap(from_fn(require_session))
                .service(super::configure_routes()),
        )
        .await;
        let conversation = Uuid::new_v4();
        let uri = format!("/api/conversations/{}/messages", conversation);

        for content in ["first", "second", "third"] {
            let req = test::TestRequest::post()
                .uri(&uri)
                .cookie(Cookie::new(SESSION_COOKIE, t.token.clone()))
                .set_json(json!({ "content": content }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 201);
        }

        let published = events.recv().await.unwrap();
        assert_eq!(published.content, "first");
        assert_eq!(published.conversation_id, conversation);
        assert_eq!(published.sender.as_ref().unwrap().full_name, "Marie Curie");

        let req = test::TestRequest::get()
            .uri(&format!("{}?limit=2", uri))
            .cookie(Cookie::new(SESSION_COOKIE, t.token.clone()))
            .to_request();
        let page: Page<RealtimeMessage> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.total, 3);
        let contents: Vec<&str> = page.items.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second"]);
    }

    #[actix_web::test]
    async fn empty_content_is_rejected() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .wrap(from_fn(require_session))
                .service(super::configure_routes()),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/conversations/{}/messages", Uuid::new_v4()))
            .cookie(Cookie::new(SESSION_COOKIE, t.token.clone()))
            .set_json(json!({ "content": "", "fileUrl": "not a url" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("content"));
        assert!(failure.has_field("file_url"));
    }
}
