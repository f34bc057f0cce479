//! Print job orchestration
//!
//! gate → resolve target → format → print → commit, with the gate released
//! on every exit path. Any print-side failure leaves the order's flags alone
//! so the order stays in the watched query and is retried by the next
//! notification.

use super::gate::ConcurrencyGate;
use super::receipt::ReceiptFormatter;
use super::registry::PrinterRegistry;
use super::updater::{TransactionalStateUpdater, TransitionOutcome};
use crate::models::{Order, WatchDefinition, normalize_target_name};
use crate::store::OrderStore;
use crate::utils::{JobError, JobResult};
use std::sync::Arc;
use tide_printer::Alignment;
use tracing::{debug, error, info, instrument, warn};

/// Result of one `handle` call
#[derive(Debug)]
pub enum JobOutcome {
    /// A job for the same order and kind is already in flight here
    Busy,
    /// Printing is disabled; nothing printed, nothing committed
    Skipped,
    /// Printed; carries what the state transition did
    Printed(TransitionOutcome),
    /// Not printed, or printed but not recorded; flags untouched
    Failed(JobError),
}

impl JobOutcome {
    pub fn is_printed(&self) -> bool {
        matches!(self, JobOutcome::Printed(_))
    }
}

pub struct PrintJobCoordinator {
    gate: Arc<ConcurrencyGate>,
    registry: Arc<PrinterRegistry>,
    formatter: ReceiptFormatter,
    updater: TransactionalStateUpdater,
    printing_enabled: bool,
}

impl PrintJobCoordinator {
    pub fn new(
        gate: Arc<ConcurrencyGate>,
        registry: Arc<PrinterRegistry>,
        formatter: ReceiptFormatter,
        store: Arc<dyn OrderStore>,
        printing_enabled: bool,
    ) -> Self {
        Self {
            gate,
            registry,
            formatter,
            updater: TransactionalStateUpdater::new(store),
            printing_enabled,
        }
    }

    pub fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.gate
    }

    pub fn registry(&self) -> &Arc<PrinterRegistry> {
        &self.registry
    }

    pub fn printing_enabled(&self) -> bool {
        self.printing_enabled
    }

    /// Run one print job for `order` under `watch`
    #[instrument(skip_all, fields(order_id = %order.id, watch = %watch.name, kind = %watch.kind))]
    pub async fn handle(&self, order: &Order, watch: &WatchDefinition) -> JobOutcome {
        let Some(_permit) = self.gate.try_lock(watch.kind, &order.id) else {
            debug!("Job already in flight, dropping event");
            return JobOutcome::Busy;
        };

        let target = self.resolve_target(order, watch);

        if !self.printing_enabled {
            self.preview(order, &target);
            info!(printer = %target, "Printing disabled, skipped print; order stays pending");
            return JobOutcome::Skipped;
        }

        if let Err(e) = self.print(order, watch, &target).await {
            error!(printer = %target, error = %e, "Print failed");
            self.registry.invalidate(&target);
            return JobOutcome::Failed(e);
        }
        info!(printer = %target, "Receipt printed");

        match self.updater.commit(&order.id, watch).await {
            Ok(outcome) => JobOutcome::Printed(outcome),
            Err(e) => {
                error!(error = %e, "Printed but failed to record print state");
                JobOutcome::Failed(e.into())
            }
        }
    }

    /// Fixed override for the watch, else the order's routing attribute
    pub fn resolve_target(&self, order: &Order, watch: &WatchDefinition) -> String {
        match &watch.target_override {
            Some(fixed) => normalize_target_name(fixed),
            None => self.registry.resolve(order.print_target.as_deref()),
        }
    }

    async fn print(&self, order: &Order, watch: &WatchDefinition, target: &str) -> JobResult<()> {
        let width = self
            .registry
            .target(target)
            .map(|t| t.width)
            .ok_or_else(|| JobError::UnknownTarget(target.to_string()))?;

        // Render before touching the device so a bad order never leaves a
        // half-written buffer behind
        let ops = self.formatter.format(order, width)?;

        if !self.registry.is_ready(target).await {
            return Err(JobError::Unreachable(target.to_string()));
        }

        let handle = self.registry.get(target)?;
        let mut device = handle.lock().await;
        device.clear();

        if let Some(label) = &watch.label {
            device.set_align(Alignment::Center);
            device.set_bold(true);
            device.println(label);
            device.set_bold(false);
            device.set_align(Alignment::Left);
        }
        device.write_ops(&ops);

        if let Err(e) = device.execute().await {
            device.clear();
            return Err(e.into());
        }
        Ok(())
    }

    /// Render without printing, for logs only
    fn preview(&self, order: &Order, target: &str) {
        let Some(width) = self.registry.target(target).map(|t| t.width) else {
            warn!(printer = %target, "Print target not configured");
            return;
        };
        match self.formatter.format(order, width) {
            Ok(ops) => debug!(printer = %target, ops = ops.len(), "Receipt rendered"),
            Err(e) => warn!(printer = %target, error = %e, "Receipt would not render"),
        }
    }
}
