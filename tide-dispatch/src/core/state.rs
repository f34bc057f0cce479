use super::config::Config;
use super::inbox::OrderInbox;
use super::tasks::{BackgroundTasks, TaskKind};
use crate::models::{WatchDefinition, normalize_target_name};
use crate::printing::{
    ChangeFeedWatcher, ConcurrencyGate, DeviceFactory, PrintJobCoordinator, PrinterRegistry,
    ReceiptFormatter, ThermalPrinterFactory,
};
use crate::store::{OrderStore, OrderWriter, RedbOrderStore};
use crate::utils::logger::{CLEANUP_INTERVAL, cleanup_old_logs};
use anyhow::Context;
use std::sync::Arc;

/// Wired-up dispatch engine
pub struct DispatchState {
    pub config: Config,
    pub store: Arc<dyn OrderStore>,
    pub registry: Arc<PrinterRegistry>,
    pub coordinator: Arc<PrintJobCoordinator>,
    writer: Arc<dyn OrderWriter>,
    watches: Vec<WatchDefinition>,
}

impl DispatchState {
    /// Open the order store under the work dir and build the engine
    ///
    /// Order:
    /// 1. Work directory
    /// 2. Order store (work_dir/orders.redb)
    /// 3. Printers, formatter, coordinator, watch definitions, inbox
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;

        let store_path = config.store_path();
        let store = RedbOrderStore::open(&store_path, config.order_collection.clone())
            .with_context(|| format!("Failed to open order store {}", store_path.display()))?;

        Self::with_store(config, Arc::new(store), Arc::new(ThermalPrinterFactory))
    }

    /// Build the engine over an existing store and device factory
    pub fn with_store<S>(
        config: &Config,
        store: Arc<S>,
        factory: Arc<dyn DeviceFactory>,
    ) -> anyhow::Result<Self>
    where
        S: OrderStore + OrderWriter + 'static,
    {
        config.validate()?;
        let writer: Arc<dyn OrderWriter> = store.clone();
        let store: Arc<dyn OrderStore> = store;

        let timezone = config.timezone()?;
        let formatter = ReceiptFormatter::new(config.venue(), timezone)
            .with_layout(config.identifier_layout());

        let registry = Arc::new(PrinterRegistry::with_factory(
            config.targets.iter().cloned(),
            &config.fallback_target,
            factory,
        ));

        let coordinator = Arc::new(PrintJobCoordinator::new(
            Arc::new(ConcurrencyGate::new()),
            Arc::clone(&registry),
            formatter,
            Arc::clone(&store),
            config.printing_enabled,
        ));

        let mut watches = config.watch_definitions()?;
        watches.retain(|watch| match &watch.target_override {
            Some(target) if !registry.contains(&normalize_target_name(target)) => {
                tracing::warn!(watch = %watch.name, printer = %target, "Watcher disabled: its print target is not configured");
                false
            }
            _ => true,
        });

        tracing::info!(
            targets = ?registry.target_names(),
            fallback = %registry.fallback(),
            printing_enabled = config.printing_enabled,
            "Dispatch engine ready"
        );

        Ok(Self {
            config: config.clone(),
            store,
            registry,
            coordinator,
            writer,
            watches,
        })
    }

    pub fn watch_definitions(&self) -> &[WatchDefinition] {
        &self.watches
    }

    pub fn watchers(&self) -> Vec<ChangeFeedWatcher> {
        self.watches
            .iter()
            .cloned()
            .map(|watch| {
                ChangeFeedWatcher::new(watch, Arc::clone(&self.store), Arc::clone(&self.coordinator))
            })
            .collect()
    }

    /// Command files from `inbox_dir` applied to this engine's store
    pub fn inbox(&self) -> OrderInbox {
        OrderInbox::new(self.config.inbox_dir(), Arc::clone(&self.writer))
    }

    /// Spawn one listener per watch, the inbox sweep and the hourly log cleanup
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        for watcher in self.watchers() {
            let name = format!("watcher:{}", watcher.definition().name);
            let token = tasks.shutdown_token();
            tasks.spawn(name, TaskKind::Listener, watcher.run(token));
        }

        let inbox = self.inbox();
        tracing::info!(dir = %inbox.dir().display(), "Order inbox enabled");
        tasks.spawn_periodic("order_inbox", self.config.inbox_poll_interval(), move || {
            if let Err(e) = inbox.scan() {
                tracing::error!(error = %e, "Failed to process order inbox");
            }
        });

        let log_dir = self.config.log_dir();
        tasks.spawn_periodic("log_cleanup", CLEANUP_INTERVAL, move || {
            if let Err(e) = cleanup_old_logs(&log_dir) {
                tracing::error!(error = %e, "Failed to cleanup old logs");
            }
        });
    }
}
