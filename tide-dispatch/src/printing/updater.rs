//! Compare-and-swap print-state transition
//!
//! The watch's filter is the precondition: the transition only commits if
//! the freshly read document still matches it. When several instances print
//! the same order, exactly one transaction sees the precondition hold; the
//! rest observe the flipped flag and write nothing.

use crate::audit_log;
use crate::models::{JobKind, Order, WatchDefinition};
use crate::store::{OrderStore, SkipReason, StoreResult, TxDecision, TxOutcome};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Flag flip and audit fields written
    Committed,
    /// Precondition already false; another writer got there first
    AlreadyHandled,
    /// Order no longer exists
    Missing,
}

pub struct TransactionalStateUpdater {
    store: Arc<dyn OrderStore>,
}

impl TransactionalStateUpdater {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Apply `watch`'s transition to `order_id` if its filter still holds
    #[instrument(skip(self, watch), fields(watch = %watch.name))]
    pub async fn commit(
        &self,
        order_id: &str,
        watch: &WatchDefinition,
    ) -> StoreResult<TransitionOutcome> {
        let filter = watch.filter;
        let patch = watch.transition.to_patch();

        let decide = move |current: Option<&Order>| match current {
            None => TxDecision::Skip(SkipReason::Missing),
            Some(order) if order.flag(filter.flag) != filter.value => {
                TxDecision::Skip(SkipReason::AlreadyHandled)
            }
            Some(_) => TxDecision::Write(patch.clone()),
        };

        let outcome = match self.store.transact(order_id, &decide).await? {
            TxOutcome::Committed(order) => {
                let resource = format!("order:{}", order_id);
                let details = format!("watch={} reprint_count={}", watch.name, order.reprint_count);
                audit_log!(action_name(watch.kind), resource.as_str(), details.as_str());
                debug!("Print state committed");
                TransitionOutcome::Committed
            }
            TxOutcome::Skipped(SkipReason::AlreadyHandled) => {
                info!(flag = %filter.flag, "Already handled by another instance");
                TransitionOutcome::AlreadyHandled
            }
            TxOutcome::Skipped(SkipReason::Missing) => {
                info!("Order no longer exists, nothing to commit");
                TransitionOutcome::Missing
            }
        };

        Ok(outcome)
    }
}

fn action_name(kind: JobKind) -> &'static str {
    match kind {
        JobKind::New => "printed",
        JobKind::Reprint => "reprinted",
        JobKind::Kitchen => "kitchen_printed",
    }
}
