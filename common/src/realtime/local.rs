use super::{ChangeFeed, ColumnFilter, FeedSubscription, InsertCallback};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Listener {
    id: u64,
    table: String,
    filter: ColumnFilter,
    callback: InsertCallback,
    live: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// In-process change feed. Clones share the same set of listeners.
#[derive(Clone, Default)]
pub struct LocalChangeFeed {
    registry: Rc<RefCell<Registry>>,
}

impl LocalChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an inserted record to every matching listener.
    /// Returns how many listeners were called.
    pub fn publish_insert(&self, table: &str, record: &Value) -> usize {
        // Collected first so callbacks may (un)subscribe while we deliver.
        let targets: Vec<(InsertCallback, Rc<Cell<bool>>)> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.table == table && l.filter.matches(record))
            .map(|l| (l.callback.clone(), l.live.clone()))
            .collect();

        let mut delivered = 0;
        for (callback, live) in targets {
            if live.get() {
                callback(record.clone());
                delivered += 1;
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

struct LocalSubscription {
    id: u64,
    live: Rc<Cell<bool>>,
    registry: Rc<RefCell<Registry>>,
}

impl FeedSubscription for LocalSubscription {
    fn unsubscribe(&mut self) {
        if self.live.replace(false) {
            self.registry.borrow_mut().listeners.retain(|l| l.id != self.id);
        }
    }
}

impl ChangeFeed for LocalChangeFeed {
    fn subscribe_inserts(
        &self,
        table: &str,
        filter: ColumnFilter,
        on_insert: InsertCallback,
    ) -> Box<dyn FeedSubscription> {
        let live = Rc::new(Cell::new(true));
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.push(Listener {
            id,
            table: table.to_string(),
            filter,
            callback: on_insert,
            live: live.clone(),
        });
        Box::new(LocalSubscription {
            id,
            live,
            registry: self.registry.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unsubscribe_is_idempotent_and_stops_delivery() {
        let feed = LocalChangeFeed::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let mut sub = feed.subscribe_inserts(
            "messages",
            ColumnFilter::eq("conversation_id", "a"),
            Rc::new(move |_| h.set(h.get() + 1)),
        );
        assert_eq!(feed.publish_insert("messages", &json!({ "conversationId": "a" })), 1);
        assert_eq!(feed.publish_insert("other", &json!({ "conversationId": "a" })), 0);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(feed.listener_count(), 0);
        assert_eq!(feed.publish_insert("messages", &json!({ "conversationId": "a" })), 0);
        assert_eq!(hits.get(), 1);
    }
}
