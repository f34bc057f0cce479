//! In-process order store
//!
//! Backs tests and single-node deployments that feed orders in from the
//! host application.

use super::{
    ChangeHub, ChangeStream, Decide, OrderStore, OrderWriter, SkipReason, StoreResult, TxDecision,
    TxOutcome, WatchQuery,
};
use crate::models::{Order, PrintFlag};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;

pub struct MemoryOrderStore {
    orders: Mutex<BTreeMap<String, Order>>,
    hub: ChangeHub,
}

impl MemoryOrderStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            orders: Mutex::new(BTreeMap::new()),
            hub: ChangeHub::new(collection),
        }
    }

    pub fn collection(&self) -> &str {
        self.hub.collection()
    }

    /// Insert or replace an order
    pub fn upsert(&self, order: Order) {
        let mut orders = self.orders.lock();
        let before = orders.insert(order.id.clone(), order.clone());
        self.hub.publish(before.as_ref(), Some(&order));
    }

    pub fn remove(&self, order_id: &str) -> Option<Order> {
        let mut orders = self.orders.lock();
        let removed = orders.remove(order_id);
        if let Some(before) = &removed {
            self.hub.publish(Some(before), None);
        }
        removed
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.lock().get(order_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }

    /// Raise the reprint flag on an existing order
    ///
    /// Returns false if the order does not exist.
    pub fn request_reprint(&self, order_id: &str) -> bool {
        let mut orders = self.orders.lock();
        let Some(order) = orders.get_mut(order_id) else {
            return false;
        };
        let before = order.clone();
        order.set_flag(PrintFlag::ReprintRequested, true);
        let after = order.clone();
        self.hub.publish(Some(&before), Some(&after));
        true
    }

    /// Push a subscription error to every live query
    pub fn notify_error(&self, message: &str) {
        self.hub.publish_error(message);
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

impl OrderWriter for MemoryOrderStore {
    fn put_order(&self, order: Order) -> StoreResult<()> {
        self.upsert(order);
        Ok(())
    }

    fn flag_reprint(&self, order_id: &str) -> StoreResult<bool> {
        Ok(self.request_reprint(order_id))
    }

    fn delete_order(&self, order_id: &str) -> StoreResult<bool> {
        Ok(self.remove(order_id).is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn watch(&self, query: WatchQuery) -> StoreResult<ChangeStream> {
        self.hub.check_collection(&query.collection)?;
        let orders = self.orders.lock();
        Ok(self.hub.subscribe(query, orders.values()))
    }

    async fn transact(&self, order_id: &str, decide: &Decide) -> StoreResult<TxOutcome> {
        let mut orders = self.orders.lock();
        let Some(current) = orders.get_mut(order_id) else {
            return Ok(match decide(None) {
                TxDecision::Skip(reason) => TxOutcome::Skipped(reason),
                // Nothing to write against
                TxDecision::Write(_) => TxOutcome::Skipped(SkipReason::Missing),
            });
        };

        match decide(Some(current)) {
            TxDecision::Skip(reason) => Ok(TxOutcome::Skipped(reason)),
            TxDecision::Write(patch) => {
                let before = current.clone();
                current.apply_patch(&patch, Utc::now());
                let after = current.clone();
                self.hub.publish(Some(&before), Some(&after));
                Ok(TxOutcome::Committed(after))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeKind, FlagFilter, OrderPatch};
    use crate::store::StoreError;

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn printed_patch() -> OrderPatch {
        OrderPatch {
            flags: vec![(PrintFlag::Printed, true)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transact_commits_and_notifies() {
        let store = MemoryOrderStore::new("orders");
        store.upsert(order("o-1"));

        let mut rx = store
            .watch(WatchQuery {
                collection: "orders".to_string(),
                filter: FlagFilter::equals(PrintFlag::Printed, false),
            })
            .await
            .unwrap();
        let snapshot = rx.recv().await.unwrap().unwrap();
        assert_eq!(snapshot[0].kind, ChangeKind::Added);

        let patch = printed_patch();
        let outcome = store
            .transact("o-1", &move |_: Option<&Order>| TxDecision::Write(patch.clone()))
            .await
            .unwrap();
        assert!(matches!(outcome, TxOutcome::Committed(ref o) if o.printed));
        assert!(store.get("o-1").unwrap().printed);

        let removed = rx.recv().await.unwrap().unwrap();
        assert_eq!(removed[0].kind, ChangeKind::Removed);
    }

    #[tokio::test]
    async fn test_transact_missing_document() {
        let store = MemoryOrderStore::new("orders");
        let patch = printed_patch();
        let outcome = store
            .transact("ghost", &move |_: Option<&Order>| TxDecision::Write(patch.clone()))
            .await
            .unwrap();
        assert_eq!(outcome, TxOutcome::Skipped(SkipReason::Missing));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_request_reprint_enters_query_as_added() {
        let store = MemoryOrderStore::new("orders");
        let mut o = order("o-1");
        o.printed = true;
        store.upsert(o);

        let mut rx = store
            .watch(WatchQuery {
                collection: "orders".to_string(),
                filter: FlagFilter::equals(PrintFlag::ReprintRequested, true),
            })
            .await
            .unwrap();

        assert!(store.request_reprint("o-1"));
        assert!(!store.request_reprint("ghost"));

        // The order was outside the reprint query until now
        let batch = rx.recv().await.unwrap().unwrap();
        assert_eq!(batch[0].kind, ChangeKind::Added);
        assert!(batch[0].order.reprint_requested);
    }

    #[tokio::test]
    async fn test_watch_unknown_collection() {
        let store = MemoryOrderStore::new("orders");
        let result = store
            .watch(WatchQuery {
                collection: "bookings".to_string(),
                filter: FlagFilter::equals(PrintFlag::Printed, false),
            })
            .await;
        assert!(matches!(result, Err(StoreError::UnknownCollection(_))));
    }
}
