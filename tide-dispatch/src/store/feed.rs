//! Live-query fan-out
//!
//! Turns committed writes into per-subscriber add/modify/remove changes.
//! Stores call `publish` while still holding their write lock, so every
//! subscriber sees changes in commit order.

use super::{ChangeBatch, ChangeStream, DocumentChange, StoreError, StoreResult, WatchQuery};
use crate::models::{ChangeKind, Order};
use parking_lot::Mutex;
use tokio::sync::mpsc;

struct Subscriber {
    query: WatchQuery,
    tx: mpsc::UnboundedSender<ChangeBatch>,
}

/// Subscriber registry for one collection
pub struct ChangeHub {
    collection: String,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ChangeHub {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn check_collection(&self, collection: &str) -> StoreResult<()> {
        if collection == self.collection {
            Ok(())
        } else {
            Err(StoreError::UnknownCollection(collection.to_string()))
        }
    }

    /// Register a live query, delivering the current matches as `added`
    pub fn subscribe<'a>(
        &self,
        query: WatchQuery,
        snapshot: impl IntoIterator<Item = &'a Order>,
    ) -> ChangeStream {
        let (tx, rx) = mpsc::unbounded_channel();

        let initial: Vec<DocumentChange> = snapshot
            .into_iter()
            .filter(|o| query.matches(o))
            .map(|o| DocumentChange {
                kind: ChangeKind::Added,
                order: o.clone(),
            })
            .collect();

        if !initial.is_empty() {
            // Receiver is in hand, cannot be closed yet
            let _ = tx.send(Ok(initial));
        }

        self.subscribers.lock().push(Subscriber { query, tx });
        rx
    }

    /// Fan out one committed write
    ///
    /// `before`/`after` are the document before and after the commit
    /// (`None` for absent).
    pub fn publish(&self, before: Option<&Order>, after: Option<&Order>) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| {
            let Some(change) = diff(&sub.query, before, after) else {
                return !sub.tx.is_closed();
            };
            sub.tx.send(Ok(vec![change])).is_ok()
        });
    }

    /// Deliver a subscription-level error to every subscriber
    pub fn publish_error(&self, message: &str) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| {
            sub.tx
                .send(Err(StoreError::Subscription(message.to_string())))
                .is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| !sub.tx.is_closed());
        subscribers.len()
    }
}

fn diff(query: &WatchQuery, before: Option<&Order>, after: Option<&Order>) -> Option<DocumentChange> {
    let matched_before = before.is_some_and(|o| query.matches(o));
    let matches_now = after.is_some_and(|o| query.matches(o));

    let (kind, order) = match (matched_before, matches_now, before, after) {
        (false, true, _, Some(after)) => (ChangeKind::Added, after),
        (true, true, Some(before), Some(after)) if before != after => (ChangeKind::Modified, after),
        (true, false, Some(before), after) => (ChangeKind::Removed, after.unwrap_or(before)),
        _ => return None,
    };

    Some(DocumentChange {
        kind,
        order: order.clone(),
    })
}
