//! Printer capability interface
//!
//! Receipt rendering only ever talks to `PrinterDevice`; each device family
//! supplies the bytes behind it.

use crate::commands::{CommandBuffer, DeviceFamily};
use crate::error::PrintResult;
use crate::ops::{Alignment, PrintOp};
use crate::printer::{NetworkPrinter, Printer};
use async_trait::async_trait;
use tracing::instrument;

/// Buffered printer handle with a fixed method set
///
/// Style and content calls only touch the local buffer; nothing reaches the
/// device until `execute`.
#[async_trait]
pub trait PrinterDevice: Send + Sync {
    /// Discard anything buffered
    fn clear(&mut self);

    fn set_align(&mut self, align: Alignment);

    fn set_bold(&mut self, on: bool);

    fn set_double_height(&mut self, on: bool);

    fn println(&mut self, text: &str);

    /// Full-width horizontal rule
    fn draw_line(&mut self);

    fn feed(&mut self, lines: u8);

    fn cut(&mut self);

    /// Send the buffer to the device
    async fn execute(&mut self) -> PrintResult<()>;

    /// Non-destructive reachability check
    async fn is_connected(&self) -> bool;

    /// Replay a rendered receipt into the buffer
    fn write_ops(&mut self, ops: &[PrintOp]) {
        for op in ops {
            match op {
                PrintOp::Align(a) => self.set_align(*a),
                PrintOp::Bold(on) => self.set_bold(*on),
                PrintOp::DoubleHeight(on) => self.set_double_height(*on),
                PrintOp::Line(text) => self.println(text),
                PrintOp::Rule => self.draw_line(),
                PrintOp::Feed(n) => self.feed(*n),
                PrintOp::Cut => self.cut(),
            }
        }
    }
}

/// Thermal receipt printer on a raw TCP socket
pub struct ThermalPrinter {
    buffer: CommandBuffer,
    transport: NetworkPrinter,
}

impl ThermalPrinter {
    pub fn new(family: DeviceFamily, width: usize, transport: NetworkPrinter) -> Self {
        Self {
            buffer: CommandBuffer::new(family, width),
            transport,
        }
    }

    pub fn family(&self) -> DeviceFamily {
        self.buffer.family()
    }

    pub fn transport(&self) -> &NetworkPrinter {
        &self.transport
    }

    /// Bytes that `execute` would send
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_bytes()
    }
}

#[async_trait]
impl PrinterDevice for ThermalPrinter {
    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn set_align(&mut self, align: Alignment) {
        self.buffer.align(align);
    }

    fn set_bold(&mut self, on: bool) {
        self.buffer.bold(on);
    }

    fn set_double_height(&mut self, on: bool) {
        self.buffer.double_height(on);
    }

    fn println(&mut self, text: &str) {
        self.buffer.line(text);
    }

    fn draw_line(&mut self) {
        self.buffer.rule();
    }

    fn feed(&mut self, lines: u8) {
        self.buffer.feed(lines);
    }

    fn cut(&mut self) {
        self.buffer.cut();
    }

    #[instrument(skip(self), fields(addr = %self.transport.addr(), family = %self.buffer.family()))]
    async fn execute(&mut self) -> PrintResult<()> {
        self.transport.print(self.buffer.as_bytes()).await?;
        self.buffer.clear();
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.transport.is_online().await
    }
}
