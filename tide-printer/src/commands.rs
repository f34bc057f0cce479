//! Printer command builder
//!
//! Provides a fluent API for building print data in the command set of a
//! device family.

use crate::encoding::encode_text;
use crate::ops::Alignment;
use std::fmt;
use tracing::warn;

/// Printer command set family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceFamily {
    /// Generic ESC/POS (Epson and compatibles)
    #[default]
    Epson,
    /// Star line mode
    Star,
}

impl DeviceFamily {
    /// Parse a configured family name
    ///
    /// Unrecognized names fall back to the generic ESC/POS family.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "epson" | "escpos" | "esc/pos" | "generic" | "" => DeviceFamily::Epson,
            "star" => DeviceFamily::Star,
            other => {
                warn!(family = other, "Unknown device family, using generic ESC/POS");
                DeviceFamily::Epson
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceFamily::Epson => "epson",
            DeviceFamily::Star => "star",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Printer command builder
///
/// Builds device byte sequences for thermal printers.
/// All text is converted to Windows-1252 as it is written.
pub struct CommandBuffer {
    buf: Vec<u8>,
    width: usize,
    family: DeviceFamily,
}

impl CommandBuffer {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 42 or 48 characters
    pub fn new(family: DeviceFamily, width: usize) -> Self {
        let mut b = Self {
            buf: Vec::with_capacity(4096),
            width,
            family,
        };
        b.init();
        b
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Bytes written since the last init, excluding the init command
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= 2
    }

    /// Drop everything and start over with an init command
    pub fn clear(&mut self) -> &mut Self {
        self.buf.clear();
        self.init()
    }

    fn init(&mut self) -> &mut Self {
        // ESC @ - Initialize (same in both families)
        self.buf.extend_from_slice(&[0x1B, 0x40]);
        self
    }

    // === Text Output ===

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&encode_text(s));
        self.buf.push(b'\n');
        self
    }

    /// Feed n lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        match self.family {
            // ESC d n
            DeviceFamily::Epson => self.buf.extend_from_slice(&[0x1B, 0x64, lines]),
            // ESC a n
            DeviceFamily::Star => self.buf.extend_from_slice(&[0x1B, 0x61, lines]),
        }
        self
    }

    // === Alignment ===

    pub fn align(&mut self, align: Alignment) -> &mut Self {
        let n = match align {
            Alignment::Left => 0x00,
            Alignment::Center => 0x01,
            Alignment::Right => 0x02,
        };
        match self.family {
            // ESC a n
            DeviceFamily::Epson => self.buf.extend_from_slice(&[0x1B, 0x61, n]),
            // ESC GS a n
            DeviceFamily::Star => self.buf.extend_from_slice(&[0x1B, 0x1D, 0x61, n]),
        }
        self
    }

    // === Text Style ===

    pub fn bold(&mut self, on: bool) -> &mut Self {
        match (self.family, on) {
            // ESC E n
            (DeviceFamily::Epson, _) => self.buf.extend_from_slice(&[0x1B, 0x45, on as u8]),
            // ESC E / ESC F
            (DeviceFamily::Star, true) => self.buf.extend_from_slice(&[0x1B, 0x45]),
            (DeviceFamily::Star, false) => self.buf.extend_from_slice(&[0x1B, 0x46]),
        }
        self
    }

    pub fn double_height(&mut self, on: bool) -> &mut Self {
        match self.family {
            // GS ! n
            DeviceFamily::Epson => {
                self.buf
                    .extend_from_slice(&[0x1D, 0x21, if on { 0x01 } else { 0x00 }])
            }
            // ESC i height width
            DeviceFamily::Star => self.buf.extend_from_slice(&[0x1B, 0x69, on as u8, 0x00]),
        }
        self
    }

    // === Separators ===

    /// Print a line of '-' characters across the paper
    pub fn rule(&mut self) -> &mut Self {
        let sep = "-".repeat(self.width);
        self.line(&sep)
    }

    // === Paper Control ===

    /// Full cut
    pub fn cut(&mut self) -> &mut Self {
        match self.family {
            // GS V 0
            DeviceFamily::Epson => self.buf.extend_from_slice(&[0x1D, 0x56, 0x00]),
            // ESC d 0
            DeviceFamily::Star => self.buf.extend_from_slice(&[0x1B, 0x64, 0x00]),
        }
        self
    }

    // === Build ===

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parse() {
        assert_eq!(DeviceFamily::parse("EPSON"), DeviceFamily::Epson);
        assert_eq!(DeviceFamily::parse("star"), DeviceFamily::Star);
        assert_eq!(DeviceFamily::parse("zebra"), DeviceFamily::Epson);
    }

    #[test]
    fn test_builder_basic() {
        let mut b = CommandBuffer::new(DeviceFamily::Epson, 32);
        b.align(Alignment::Center)
            .bold(true)
            .line("TITLE")
            .bold(false)
            .align(Alignment::Left)
            .line("body");

        let s = String::from_utf8_lossy(b.as_bytes());
        assert!(s.contains("TITLE\n"));
        assert!(s.contains("body\n"));
        assert!(b.as_bytes().starts_with(&[0x1B, 0x40]));
    }

    #[test]
    fn test_rule_spans_width() {
        let mut b = CommandBuffer::new(DeviceFamily::Star, 10);
        b.rule();

        let s = String::from_utf8_lossy(b.as_bytes());
        assert!(s.contains("----------\n"));
        assert!(!s.contains("-----------"));
    }

    #[test]
    fn test_family_specific_cut() {
        let mut epson = CommandBuffer::new(DeviceFamily::Epson, 32);
        epson.cut();
        assert!(epson.as_bytes().ends_with(&[0x1D, 0x56, 0x00]));

        let mut star = CommandBuffer::new(DeviceFamily::Star, 32);
        star.cut();
        assert!(star.as_bytes().ends_with(&[0x1B, 0x64, 0x00]));
    }

    #[test]
    fn test_clear_resets_to_init() {
        let mut b = CommandBuffer::new(DeviceFamily::Epson, 32);
        b.line("stale");
        assert!(!b.is_empty());
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.as_bytes(), &[0x1B, 0x40]);
    }
}
