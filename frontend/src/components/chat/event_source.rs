//! [`ChangeFeed`] over the server's event stream (`GET /api/realtime/{table}`).

use common::realtime::{ChangeFeed, ColumnFilter, FeedSubscription, InsertCallback, INSERT_EVENT};
use gloo_console::{error, warn};
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent};

type Listener = Closure<dyn FnMut(MessageEvent)>;

/// Opens one `EventSource` per subscription.
#[derive(Clone, Default)]
pub struct EventSourceFeed;

impl ChangeFeed for EventSourceFeed {
    fn subscribe_inserts(
        &self,
        table: &str,
        filter: ColumnFilter,
        on_insert: InsertCallback,
    ) -> Box<dyn FeedSubscription> {
        let url = format!("/api/realtime/{}?{}", table, filter.query_param());
        let source = match EventSource::new(&url) {
            Ok(source) => source,
            Err(err) => {
                error!(format!("could not open {}", url), err);
                return Box::new(EventSourceSubscription::default());
            }
        };

        let listener: Listener = Closure::new(move |event: MessageEvent| {
            let Some(data) = event.data().as_string() else {
                return;
            };
            match serde_json::from_str::<Value>(&data) {
                Ok(record) if filter.matches(&record) => on_insert(record),
                Ok(_) => {}
                Err(err) => warn!(format!("dropping malformed realtime event: {}", err)),
            }
        });
        if let Err(err) =
            source.add_event_listener_with_callback(INSERT_EVENT, listener.as_ref().unchecked_ref())
        {
            error!("could not listen to realtime inserts", err);
        }

        Box::new(EventSourceSubscription {
            source: Some(source),
            listener: Some(listener),
        })
    }
}

#[derive(Default)]
pub struct EventSourceSubscription {
    source: Option<EventSource>,
    listener: Option<Listener>,
}

impl FeedSubscription for EventSourceSubscription {
    fn unsubscribe(&mut self) {
        if let Some(source) = self.source.take() {
            if let Some(listener) = &self.listener {
                let _ = source.remove_event_listener_with_callback(
                    INSERT_EVENT,
                    listener.as_ref().unchecked_ref(),
                );
            }
            source.close();
        }
        self.listener = None;
    }
}

impl Drop for EventSourceSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
