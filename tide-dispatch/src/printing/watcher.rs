//! Live-query watcher
//!
//! One watcher per watch definition. Changes are handled strictly one at a
//! time in delivery order, so jobs from one watcher never interleave on a
//! printer. Different watchers run concurrently.

use super::coordinator::{JobOutcome, PrintJobCoordinator};
use crate::models::WatchDefinition;
use crate::store::{DocumentChange, OrderStore, WatchQuery};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

/// Delay before resubscribing after the stream failed or closed
pub const RESUBSCRIBE_BACKOFF: Duration = Duration::from_secs(5);

pub struct ChangeFeedWatcher {
    watch: WatchDefinition,
    store: Arc<dyn OrderStore>,
    coordinator: Arc<PrintJobCoordinator>,
    backoff: Duration,
}

impl ChangeFeedWatcher {
    pub fn new(
        watch: WatchDefinition,
        store: Arc<dyn OrderStore>,
        coordinator: Arc<PrintJobCoordinator>,
    ) -> Self {
        Self {
            watch,
            store,
            coordinator,
            backoff: RESUBSCRIBE_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn definition(&self) -> &WatchDefinition {
        &self.watch
    }

    pub fn query(&self) -> WatchQuery {
        WatchQuery {
            collection: self.watch.collection.clone(),
            filter: self.watch.filter,
        }
    }

    /// Consume changes until `shutdown` fires
    ///
    /// Subscription errors are logged and the watcher keeps going; a closed
    /// or failed subscription is retried after the back-off. A job that has
    /// started always runs to completion.
    #[instrument(skip_all, fields(watch = %self.watch.name))]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(collection = %self.watch.collection, filter = %self.watch.filter.flag, "Watcher started");

        loop {
            let subscribed = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.store.watch(self.query()) => result,
            };

            match subscribed {
                Ok(mut stream) => loop {
                    let batch = tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("Watcher stopped");
                            return;
                        }
                        batch = stream.recv() => batch,
                    };

                    match batch {
                        Some(Ok(changes)) => {
                            self.process_batch(changes).await;
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Subscription error");
                        }
                        None => {
                            warn!("Change stream closed");
                            break;
                        }
                    }
                },
                Err(e) => {
                    error!(error = %e, "Failed to subscribe");
                }
            }

            debug!(backoff_ms = self.backoff.as_millis() as u64, "Resubscribing after back-off");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        info!("Watcher stopped");
    }

    /// Handle one delivered batch, in order
    ///
    /// Returns the outcome of every change the watch accepts.
    pub async fn process_batch(&self, changes: Vec<DocumentChange>) -> Vec<JobOutcome> {
        let mut outcomes = Vec::with_capacity(changes.len());

        for change in changes {
            if !self.watch.accepts(change.kind) {
                trace!(order_id = %change.order.id, change = %change.kind, "Ignoring change");
                continue;
            }

            let outcome = self.coordinator.handle(&change.order, &self.watch).await;
            match &outcome {
                JobOutcome::Failed(e) => {
                    warn!(order_id = %change.order.id, error = %e, "Job failed, order stays pending")
                }
                other => debug!(order_id = %change.order.id, outcome = ?other, "Job finished"),
            }
            outcomes.push(outcome);
        }

        outcomes
    }
}
