use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{web, HttpResponse};
use bytes::Bytes;
use common::model::message::RealtimeMessage;
use common::realtime::INSERT_EVENT;
use common::requests::RealtimeQuery;
use futures_util::StreamExt;
use log::warn;
use std::future::ready;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

fn event(message: &RealtimeMessage) -> Option<Bytes> {
    serde_json::to_string(message)
        .ok()
        .map(|json| Bytes::from(format!("event: {}\ndata: {}\n\n", INSERT_EVENT, json)))
}

fn frame(
    item: Result<RealtimeMessage, BroadcastStreamRecvError>,
    conversation_id: Uuid,
) -> Option<Result<Bytes, actix_web::Error>> {
    match item {
        Ok(message) if message.conversation_id == conversation_id => event(&message).map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            warn!("Realtime subscriber of {} skipped {} messages", conversation_id, missed);
            None
        }
    }
}

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: ValidatedQuery<RealtimeQuery>,
) -> Result<HttpResponse, ApiError> {
    let conversation_id = query.conversation_id;
    let events = BroadcastStream::new(state.realtime.subscribe())
        .filter_map(move |item| ready(frame(item, conversation_id)));

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(conversation_id: Uuid) -> RealtimeMessage {
        RealtimeMessage {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id: Uuid::new_v4(),
            content: "hello".into(),
            file_url: None,
            is_read: false,
            created_at: Utc::now(),
            sender: None,
        }
    }

    #[test]
    fn frames_only_the_followed_conversation() {
        let followed = Uuid::new_v4();
        let bytes = frame(Ok(message(followed)), followed).unwrap().unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("event: INSERT\ndata: {"));
        assert!(text.ends_with("\n\n"));
        assert!(text.contains(&followed.to_string()));

        assert!(frame(Ok(message(Uuid::new_v4())), followed).is_none());
        assert!(frame(Err(BroadcastStreamRecvError::Lagged(3)), followed).is_none());
    }

    #[actix_web::test]
    async fn stream_delivers_inserts_after_subscription() {
        use crate::state::testing::test_app;
        use actix_web::{test, App};

        let t = test_app().await;
        let conversation = Uuid::new_v4();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/realtime/messages?conversationId={}", conversation))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/event-stream");

        t.state.realtime.send(message(Uuid::new_v4())).unwrap();
        t.state.realtime.send(message(conversation)).unwrap();

        let mut body = resp.into_body();
        let first = futures_util::future::poll_fn(|cx| {
            actix_web::body::MessageBody::poll_next(std::pin::Pin::new(&mut body), cx)
        })
        .await
        .unwrap()
        .unwrap();
        let text = String::from_utf8(first.to_vec()).unwrap();
        assert!(text.contains(&conversation.to_string()));
    }
}
