//! Print-dispatch engine
//!
//! ```text
//! ChangeFeedWatcher ─► PrintJobCoordinator ─┬─► ConcurrencyGate
//!                                           ├─► ReceiptFormatter
//!                                           ├─► PrinterRegistry ─► PrinterDevice
//!                                           └─► TransactionalStateUpdater ─► OrderStore
//! ```

pub mod coordinator;
pub mod gate;
pub mod receipt;
pub mod registry;
pub mod updater;
pub mod watcher;

pub use coordinator::{JobOutcome, PrintJobCoordinator};
pub use gate::{ConcurrencyGate, GatePermit};
pub use receipt::{FormatError, IdentifierLayout, ReceiptFormatter, VenueInfo};
pub use registry::{DeviceFactory, DeviceHandle, PrinterRegistry, ThermalPrinterFactory};
pub use updater::{TransactionalStateUpdater, TransitionOutcome};
pub use watcher::{ChangeFeedWatcher, RESUBSCRIBE_BACKOFF};
