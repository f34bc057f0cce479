//! Print target configuration

use std::time::Duration;
use tide_printer::{DEFAULT_TIMEOUT, DeviceFamily};

/// Named logical destination mapped to one physical device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintTarget {
    pub name: String,
    /// Transport address, e.g. `tcp://10.0.0.5:9100`
    pub interface: String,
    /// Characters per line
    pub width: usize,
    pub family: DeviceFamily,
    pub timeout: Duration,
}

impl PrintTarget {
    pub fn new(name: impl Into<String>, interface: impl Into<String>, width: usize) -> Self {
        Self {
            name: normalize_target_name(&name.into()),
            interface: interface.into(),
            width,
            family: DeviceFamily::Epson,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_family(mut self, family: DeviceFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Canonical target name: trimmed, lowercase, spaces/dashes as `_`
///
/// "Main Bar", "main-bar" and "MAIN_BAR" all resolve to `main_bar`.
pub fn normalize_target_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
