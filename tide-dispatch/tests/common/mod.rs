//! Shared fixtures: a recording printer and a coordinator over an in-memory store

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tide_dispatch::models::{ItemVariant, OrderItem};
use tide_dispatch::printing::{DeviceFactory, VenueInfo};
use tide_dispatch::{
    ConcurrencyGate, MemoryOrderStore, Order, OrderStore, PrintJobCoordinator, PrintTarget,
    PrinterRegistry, ReceiptFormatter,
};
use tide_printer::{Alignment, PrintError, PrintOp, PrintResult, PrinterDevice};

pub const COLLECTION: &str = "orders";
pub const WIDTH: usize = 32;

/// What every recording device saw, shared across rebuilt handles
#[derive(Default)]
pub struct PrinterSpy {
    jobs: Mutex<Vec<Vec<PrintOp>>>,
    executes: AtomicUsize,
    builds: AtomicUsize,
    offline: AtomicBool,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl PrinterSpy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Successfully executed jobs, in order
    pub fn jobs(&self) -> Vec<Vec<PrintOp>> {
        self.jobs.lock().clone()
    }

    pub fn printed_count(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Every `execute` call, successful or not
    pub fn execute_count(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

/// Printer that records its buffer on execute instead of sending it
pub struct RecordingDevice {
    buffer: Vec<PrintOp>,
    spy: Arc<PrinterSpy>,
}

#[async_trait]
impl PrinterDevice for RecordingDevice {
    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn set_align(&mut self, align: Alignment) {
        self.buffer.push(PrintOp::Align(align));
    }

    fn set_bold(&mut self, on: bool) {
        self.buffer.push(PrintOp::Bold(on));
    }

    fn set_double_height(&mut self, on: bool) {
        self.buffer.push(PrintOp::DoubleHeight(on));
    }

    fn println(&mut self, text: &str) {
        self.buffer.push(PrintOp::Line(text.to_string()));
    }

    fn draw_line(&mut self) {
        self.buffer.push(PrintOp::Rule);
    }

    fn feed(&mut self, lines: u8) {
        self.buffer.push(PrintOp::Feed(lines));
    }

    fn cut(&mut self) {
        self.buffer.push(PrintOp::Cut);
    }

    async fn execute(&mut self) -> PrintResult<()> {
        self.spy.executes.fetch_add(1, Ordering::SeqCst);
        let delay = self.spy.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.spy.failing.load(Ordering::SeqCst) {
            return Err(PrintError::Connection("paper jam".to_string()));
        }
        self.spy.jobs.lock().push(std::mem::take(&mut self.buffer));
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        !self.spy.offline.load(Ordering::SeqCst)
    }
}

pub struct RecordingFactory {
    spy: Arc<PrinterSpy>,
}

impl RecordingFactory {
    pub fn new(spy: Arc<PrinterSpy>) -> Arc<Self> {
        Arc::new(Self { spy })
    }
}

impl DeviceFactory for RecordingFactory {
    fn build(&self, _target: &PrintTarget) -> PrintResult<Box<dyn PrinterDevice>> {
        self.spy.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingDevice {
            buffer: Vec::new(),
            spy: Arc::clone(&self.spy),
        }))
    }
}

pub fn targets() -> Vec<PrintTarget> {
    vec![
        PrintTarget::new("restaurant", "tcp://127.0.0.1:9100", WIDTH),
        PrintTarget::new("kitchen", "tcp://127.0.0.1:9101", WIDTH),
    ]
}

pub fn formatter() -> ReceiptFormatter {
    ReceiptFormatter::new(
        VenueInfo {
            name: "Tide Beach Club".to_string(),
            address: vec!["1 Shore Road".to_string()],
            phones: vec!["+30 210 000 0000".to_string()],
        },
        chrono_tz::UTC,
    )
}

/// Coordinator printing to recording devices over `store`
pub fn coordinator(
    store: Arc<dyn OrderStore>,
    spy: &Arc<PrinterSpy>,
    printing_enabled: bool,
) -> Arc<PrintJobCoordinator> {
    coordinator_with_targets(store, spy, targets(), printing_enabled)
}

pub fn coordinator_with_targets(
    store: Arc<dyn OrderStore>,
    spy: &Arc<PrinterSpy>,
    targets: Vec<PrintTarget>,
    printing_enabled: bool,
) -> Arc<PrintJobCoordinator> {
    let registry = Arc::new(PrinterRegistry::with_factory(
        targets,
        "restaurant",
        RecordingFactory::new(Arc::clone(spy)),
    ));
    Arc::new(PrintJobCoordinator::new(
        Arc::new(ConcurrencyGate::new()),
        registry,
        formatter(),
        store,
        printing_enabled,
    ))
}

pub struct Harness {
    pub store: Arc<MemoryOrderStore>,
    pub spy: Arc<PrinterSpy>,
    pub coordinator: Arc<PrintJobCoordinator>,
}

pub fn harness(printing_enabled: bool) -> Harness {
    let store = Arc::new(MemoryOrderStore::new(COLLECTION));
    let spy = PrinterSpy::new();
    let coordinator = coordinator(store.clone(), &spy, printing_enabled);
    Harness {
        store,
        spy,
        coordinator,
    }
}

/// Two large colas, one dollar on top for the size
pub fn cola_order(id: &str) -> Order {
    Order {
        id: id.to_string(),
        order_number: Some("A1".to_string()),
        items: vec![OrderItem {
            name: Some("Cola - Large".to_string()),
            variant: Some(ItemVariant {
                name: Some("Large".to_string()),
                price: Decimal::ONE,
            }),
            quantity: Decimal::from(2),
            price: Decimal::from(3),
            ..Default::default()
        }],
        subtotal: Decimal::from(6),
        total_amount: Decimal::from(7),
        ..Default::default()
    }
}

pub fn text_lines(ops: &[PrintOp]) -> Vec<String> {
    ops.iter().filter_map(PrintOp::text).map(String::from).collect()
}

/// Poll until `check` holds or two seconds pass
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
