use super::{ChangeFeed, ColumnFilter, FeedSubscription};
use crate::model::message::{CONVERSATION_COLUMN, MESSAGES_TABLE, RealtimeMessage};
use std::rc::Rc;
use uuid::Uuid;

/// Pushes new messages of the open conversation to a callback.
///
/// At most one subscription is alive at any time: `start` with a different
/// conversation tears the previous one down before subscribing again, and
/// `stop` (also run on drop) releases it. Nothing is buffered or replayed;
/// only messages inserted while subscribed are delivered.
pub struct MessageBridge<F: ChangeFeed> {
    feed: F,
    on_message: Rc<dyn Fn(RealtimeMessage)>,
    active: Option<(Uuid, Box<dyn FeedSubscription>)>,
}

impl<F: ChangeFeed> MessageBridge<F> {
    pub fn new(feed: F, on_message: impl Fn(RealtimeMessage) + 'static) -> Self {
        Self {
            feed,
            on_message: Rc::new(on_message),
            active: None,
        }
    }

    /// Follows `conversation_id`. `None` behaves like [`MessageBridge::stop`].
    pub fn start(&mut self, conversation_id: Option<Uuid>) {
        if self.conversation() == conversation_id && conversation_id.is_some() {
            return;
        }
        self.stop();

        let Some(id) = conversation_id else {
            return;
        };
        let on_message = self.on_message.clone();
        let subscription = self.feed.subscribe_inserts(
            MESSAGES_TABLE,
            ColumnFilter::eq(CONVERSATION_COLUMN, id.to_string()),
            Rc::new(move |record| {
                // rows that don't decode, or leak from another conversation, are dropped
                if let Ok(message) = serde_json::from_value::<RealtimeMessage>(record) {
                    if message.conversation_id == id {
                        on_message(message);
                    }
                }
            }),
        );
        self.active = Some((id, subscription));
    }

    pub fn stop(&mut self) {
        if let Some((_, mut subscription)) = self.active.take() {
            subscription.unsubscribe();
        }
    }

    pub fn conversation(&self) -> Option<Uuid> {
        self.active.as_ref().map(|(id, _)| *id)
    }
}

impl<F: ChangeFeed> Drop for MessageBridge<F> {
    fn drop(&mut self) {
        self.stop();
    }
}
