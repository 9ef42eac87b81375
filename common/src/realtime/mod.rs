//! Subscription side of the realtime change feed.
//!
//! A [`ChangeFeed`] delivers rows inserted into a table, filtered by a single
//! column equality. The browser talks to the server's event stream through
//! one implementation, tests and in-process consumers use [`LocalChangeFeed`].
//! [`MessageBridge`] sits on top and keeps one subscription per open
//! conversation.

mod bridge;
mod local;

pub use bridge::MessageBridge;
pub use local::LocalChangeFeed;

use serde_json::Value;
use std::rc::Rc;

/// Server-sent event name carrying one inserted record as its `data`.
pub const INSERT_EVENT: &str = "INSERT";

/// Invoked with the JSON record of each inserted row.
pub type InsertCallback = Rc<dyn Fn(Value)>;

/// `column = value` predicate restricting a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Records travel in their API (camelCase) shape while filters name the
    /// table column, so both spellings are looked up.
    pub fn matches(&self, record: &Value) -> bool {
        record
            .get(camel_case(&self.column))
            .or_else(|| record.get(&self.column))
            .map(|v| match v {
                Value::String(s) => *s == self.value,
                other => other.to_string() == self.value,
            })
            .unwrap_or(false)
    }

    /// Query-string form understood by the event stream, `conversationId=<value>`.
    pub fn query_param(&self) -> String {
        format!("{}={}", camel_case(&self.column), self.value)
    }
}

fn camel_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Handle to a live subscription. `unsubscribe` must be idempotent.
pub trait FeedSubscription {
    fn unsubscribe(&mut self);
}

pub trait ChangeFeed {
    /// Starts delivering `INSERT`s on `table` whose record matches `filter`.
    fn subscribe_inserts(
        &self,
        table: &str,
        filter: ColumnFilter,
        on_insert: InsertCallback,
    ) -> Box<dyn FeedSubscription>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_camel_and_snake_records() {
        let f = ColumnFilter::eq("conversation_id", "abc");
        assert!(f.matches(&json!({ "conversationId": "abc" })));
        assert!(f.matches(&json!({ "conversation_id": "abc" })));
        assert!(!f.matches(&json!({ "conversationId": "xyz" })));
        assert!(!f.matches(&json!({})));
        assert_eq!(f.query_param(), "conversationId=abc");
    }
}
