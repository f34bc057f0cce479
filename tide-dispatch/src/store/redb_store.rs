//! redb-backed order store
//!
//! Orders are stored as JSON in a single table keyed by order id. redb
//! serializes write transactions; the extra write lock keeps change
//! notification in the same order as commits.

use super::{
    ChangeHub, ChangeStream, Decide, OrderStore, OrderWriter, SkipReason, StoreResult, TxDecision,
    TxOutcome, WatchQuery,
};
use crate::models::{Order, PrintFlag};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Orders table: key = order_id, value = JSON
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

#[derive(Clone)]
pub struct RedbOrderStore {
    db: Arc<Database>,
    hub: Arc<ChangeHub>,
    write_lock: Arc<Mutex<()>>,
}

impl RedbOrderStore {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>, collection: impl Into<String>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, collection.into())
    }

    /// Open in-memory database
    pub fn open_in_memory(collection: impl Into<String>) -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, collection.into())
    }

    fn init(db: Database, collection: String) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            hub: Arc::new(ChangeHub::new(collection)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn collection(&self) -> &str {
        self.hub.collection()
    }

    pub fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All stored orders, by id
    pub fn list(&self) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_, guard) = result?;
            orders.push(serde_json::from_slice(guard.value())?);
        }
        Ok(orders)
    }

    /// Insert or replace an order
    pub fn upsert(&self, order: &Order) -> StoreResult<()> {
        let _guard = self.write_lock.lock();

        let value = serde_json::to_vec(order)?;
        let txn = self.db.begin_write()?;
        let before = {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let previous = table
                .insert(order.id.as_str(), value.as_slice())?
                .map(|guard| guard.value().to_vec());
            previous
        };
        txn.commit()?;

        let before: Option<Order> = before.map(|b| serde_json::from_slice(&b)).transpose()?;
        self.hub.publish(before.as_ref(), Some(order));
        Ok(())
    }

    pub fn remove(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let _guard = self.write_lock.lock();

        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let previous = table
                .remove(order_id)?
                .map(|guard| guard.value().to_vec());
            previous
        };
        txn.commit()?;

        let removed: Option<Order> = removed.map(|b| serde_json::from_slice(&b)).transpose()?;
        if let Some(before) = &removed {
            self.hub.publish(Some(before), None);
        }
        Ok(removed)
    }

    /// Raise the reprint flag on an existing order
    pub fn request_reprint(&self, order_id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();

        let txn = self.db.begin_write()?;
        let change = {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let bytes = match table.get(order_id)? {
                Some(guard) => guard.value().to_vec(),
                None => return Ok(false),
            };
            let before: Order = serde_json::from_slice(&bytes)?;
            let mut after = before.clone();
            after.set_flag(PrintFlag::ReprintRequested, true);
            let value = serde_json::to_vec(&after)?;
            table.insert(order_id, value.as_slice())?;
            (before, after)
        };
        txn.commit()?;

        self.hub.publish(Some(&change.0), Some(&change.1));
        Ok(true)
    }

    pub fn notify_error(&self, message: &str) {
        self.hub.publish_error(message);
    }
}

impl OrderWriter for RedbOrderStore {
    fn put_order(&self, order: Order) -> StoreResult<()> {
        self.upsert(&order)
    }

    fn flag_reprint(&self, order_id: &str) -> StoreResult<bool> {
        self.request_reprint(order_id)
    }

    fn delete_order(&self, order_id: &str) -> StoreResult<bool> {
        Ok(self.remove(order_id)?.is_some())
    }
}

#[async_trait]
impl OrderStore for RedbOrderStore {
    async fn watch(&self, query: WatchQuery) -> StoreResult<ChangeStream> {
        self.hub.check_collection(&query.collection)?;
        // Snapshot and registration under the write lock so no commit slips
        // between them
        let _guard = self.write_lock.lock();
        let snapshot = self.list()?;
        Ok(self.hub.subscribe(query, snapshot.iter()))
    }

    async fn transact(&self, order_id: &str, decide: &Decide) -> StoreResult<TxOutcome> {
        let _guard = self.write_lock.lock();

        let txn = self.db.begin_write()?;
        let committed = {
            let mut table = txn.open_table(ORDERS_TABLE)?;

            // Read first
            let bytes = table.get(order_id)?.map(|guard| guard.value().to_vec());
            let current: Option<Order> = bytes.map(|b| serde_json::from_slice(&b)).transpose()?;

            let Some(before) = current else {
                return Ok(match decide(None) {
                    TxDecision::Skip(reason) => TxOutcome::Skipped(reason),
                    TxDecision::Write(_) => TxOutcome::Skipped(SkipReason::Missing),
                });
            };
            let patch = match decide(Some(&before)) {
                TxDecision::Skip(reason) => return Ok(TxOutcome::Skipped(reason)),
                TxDecision::Write(patch) => patch,
            };

            let mut after = before.clone();
            after.apply_patch(&patch, Utc::now());

            let value = serde_json::to_vec(&after)?;
            table.insert(order_id, value.as_slice())?;
            (before, after)
        };
        txn.commit()?;

        let (before, after) = committed;
        self.hub.publish(Some(&before), Some(&after));
        Ok(TxOutcome::Committed(after))
    }
}
