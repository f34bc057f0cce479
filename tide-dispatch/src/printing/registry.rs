//! Named printer handles
//!
//! Targets are fixed at startup. Each target's device is built on first use
//! and memoized; a failed print invalidates it so the next job reconnects.

use crate::models::{PrintTarget, normalize_target_name};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tide_printer::{NetworkPrinter, PrintError, PrintResult, PrinterDevice, ThermalPrinter};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Shared device handle; the lock covers one job's buffer-and-execute
pub type DeviceHandle = Arc<Mutex<Box<dyn PrinterDevice>>>;

/// Builds the device behind a target
pub trait DeviceFactory: Send + Sync {
    fn build(&self, target: &PrintTarget) -> PrintResult<Box<dyn PrinterDevice>>;
}

/// Raw TCP thermal printers
#[derive(Debug, Default, Clone, Copy)]
pub struct ThermalPrinterFactory;

impl DeviceFactory for ThermalPrinterFactory {
    fn build(&self, target: &PrintTarget) -> PrintResult<Box<dyn PrinterDevice>> {
        let transport = NetworkPrinter::from_interface(&target.interface)?.with_timeout(target.timeout);
        Ok(Box::new(ThermalPrinter::new(
            target.family,
            target.width,
            transport,
        )))
    }
}

pub struct PrinterRegistry {
    targets: HashMap<String, PrintTarget>,
    fallback: String,
    factory: Arc<dyn DeviceFactory>,
    handles: DashMap<String, DeviceHandle>,
}

impl PrinterRegistry {
    pub fn new(targets: impl IntoIterator<Item = PrintTarget>, fallback: &str) -> Self {
        Self::with_factory(targets, fallback, Arc::new(ThermalPrinterFactory))
    }

    pub fn with_factory(
        targets: impl IntoIterator<Item = PrintTarget>,
        fallback: &str,
        factory: Arc<dyn DeviceFactory>,
    ) -> Self {
        let targets: HashMap<String, PrintTarget> = targets
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        let fallback = normalize_target_name(fallback);
        if !targets.contains_key(&fallback) {
            warn!(fallback = %fallback, "Fallback print target is not configured");
        }
        Self {
            targets,
            fallback,
            factory,
            handles: DashMap::new(),
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn target(&self, name: &str) -> Option<&PrintTarget> {
        self.targets.get(name)
    }

    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Map an order's routing attribute to a configured target
    ///
    /// Missing, blank or unknown routing resolves to the fallback target.
    pub fn resolve(&self, routing: Option<&str>) -> String {
        let Some(raw) = routing else {
            return self.fallback.clone();
        };
        let name = normalize_target_name(raw);
        if self.targets.contains_key(&name) {
            name
        } else {
            if !name.is_empty() {
                debug!(routing = %raw, fallback = %self.fallback, "Unknown print target, using fallback");
            }
            self.fallback.clone()
        }
    }

    /// Memoized handle for `name`, built on first call
    pub fn get(&self, name: &str) -> PrintResult<DeviceHandle> {
        if let Some(handle) = self.handles.get(name).map(|h| Arc::clone(h.value())) {
            return Ok(handle);
        }

        let target = self
            .targets
            .get(name)
            .ok_or_else(|| PrintError::InvalidConfig(format!("Unknown print target: {}", name)))?;
        let device = self.factory.build(target)?;
        info!(printer = %name, interface = %target.interface, width = target.width, "Printer handle created");

        // Another caller may have raced us here; keep whichever landed first
        let handle = self
            .handles
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(device)))
            .value()
            .clone();
        Ok(handle)
    }

    /// Reachability check; never errors
    pub async fn is_ready(&self, name: &str) -> bool {
        let Some(target) = self.targets.get(name) else {
            return false;
        };
        let handle = match self.get(name) {
            Ok(h) => h,
            Err(e) => {
                warn!(printer = %name, error = %e, "Cannot build printer handle");
                return false;
            }
        };

        // Waiting behind another job is not unreachability; only the
        // device check itself runs against the deadline
        let device = handle.lock().await;
        match tokio::time::timeout(target.timeout, device.is_connected()).await {
            Ok(ready) => ready,
            Err(_) => {
                warn!(printer = %name, "Printer readiness check timed out");
                false
            }
        }
    }

    /// Drop the memoized handle so the next `get` rebuilds it
    pub fn invalidate(&self, name: &str) {
        if self.handles.remove(name).is_some() {
            info!(printer = %name, "Printer handle invalidated");
        }
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }
}
