//! Order store contract
//!
//! The print engine needs two things from the document store that owns the
//! orders:
//!
//! - **Live queries**: an ordered stream of add/modify/remove changes for
//!   documents matching an equality filter
//! - **Serializable transactions**: read-modify-write against a fresh read
//!
//! ```text
//! OrderStore::watch(query) ──► mpsc ──► ChangeFeedWatcher (one consumer)
//! OrderStore::transact(id, decide) ◄── TransactionalStateUpdater
//! ```
//!
//! Two local implementations share the `ChangeHub` fan-out:
//! [`MemoryOrderStore`] (in-process) and [`RedbOrderStore`] (durable). Both
//! also accept operator writes through [`OrderWriter`].

mod feed;
mod memory;
mod redb_store;

pub use feed::ChangeHub;
pub use memory::MemoryOrderStore;
pub use redb_store::RedbOrderStore;

use crate::models::{ChangeKind, FlagFilter, Order, OrderPatch};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Subscription error: {0}")]
    Subscription(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Live query: documents of `collection` whose flag equals the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchQuery {
    pub collection: String,
    pub filter: FlagFilter,
}

impl WatchQuery {
    pub fn matches(&self, order: &Order) -> bool {
        order.flag(self.filter.flag) == self.filter.value
    }
}

/// One change delivered by a live query
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub order: Order,
}

/// Changes from one commit (or the initial snapshot), in delivery order
pub type ChangeBatch = StoreResult<Vec<DocumentChange>>;

/// Receiving side of a live query
pub type ChangeStream = mpsc::UnboundedReceiver<ChangeBatch>;

/// Why a transaction wrote nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Document no longer exists
    Missing,
    /// Precondition already flipped by another writer
    AlreadyHandled,
}

/// Verdict of a transaction body over a fresh read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxDecision {
    Write(OrderPatch),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    /// Patch committed; the document as written
    Committed(Order),
    Skipped(SkipReason),
}

/// Transaction body; may run more than once if the store retries
pub type Decide = dyn Fn(Option<&Order>) -> TxDecision + Send + Sync;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Subscribe to a live query
    ///
    /// Every currently matching document is delivered first as one `added`
    /// batch; later commits follow in commit order.
    async fn watch(&self, query: WatchQuery) -> StoreResult<ChangeStream>;

    /// Serializable read-modify-write of one order
    ///
    /// `decide` sees the document as read inside the transaction. Timestamps
    /// in the patch are stamped with the store's commit time.
    async fn transact(&self, order_id: &str, decide: &Decide) -> StoreResult<TxOutcome>;
}

/// Plain writes from outside the print engine (the operator inbox)
pub trait OrderWriter: Send + Sync {
    /// Insert or replace an order
    fn put_order(&self, order: Order) -> StoreResult<()>;

    /// Raise the reprint flag; false if the order does not exist
    fn flag_reprint(&self, order_id: &str) -> StoreResult<bool>;

    /// Delete an order; false if it did not exist
    fn delete_order(&self, order_id: &str) -> StoreResult<bool>;
}
