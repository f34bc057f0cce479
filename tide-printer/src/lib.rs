//! # tide-printer
//!
//! Receipt printer transport - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Command sets per device family (generic ESC/POS, Star line mode)
//! - Windows-1252 encoding for western receipt printers
//! - Network printing (TCP port 9100) with bounded timeouts
//! - The `PrintOp` vocabulary a receipt is rendered into
//!
//! Business logic (WHAT to print) stays in the dispatch engine:
//! - Receipt layout → tide-dispatch `printing::receipt`
//! - Job orchestration → tide-dispatch `printing::coordinator`
//!
//! ## Example
//!
//! ```ignore
//! use tide_printer::{DeviceFamily, NetworkPrinter, PrinterDevice, ThermalPrinter};
//!
//! let transport = NetworkPrinter::from_interface("tcp://192.168.1.100:9100")?;
//! let mut printer = ThermalPrinter::new(DeviceFamily::Epson, 48, transport);
//! printer.set_align(Alignment::Center);
//! printer.set_bold(true);
//! printer.println("KITCHEN");
//! printer.set_bold(false);
//! printer.draw_line();
//! printer.cut();
//! printer.execute().await?;
//! ```

mod commands;
mod device;
mod encoding;
mod error;
mod ops;
mod printer;

// Re-exports
pub use commands::{CommandBuffer, DeviceFamily};
pub use device::{PrinterDevice, ThermalPrinter};
pub use encoding::{encode_text, pad_width, text_width, truncate_width};
pub use error::{PrintError, PrintResult};
pub use ops::{Alignment, PrintOp};
pub use printer::{DEFAULT_PORT, DEFAULT_TIMEOUT, NetworkPrinter, Printer};
