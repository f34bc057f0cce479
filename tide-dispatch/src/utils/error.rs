//! Engine-level errors

use crate::printing::FormatError;
use crate::store::StoreError;
use thiserror::Error;
use tide_printer::PrintError;

/// Why a print job did not complete
///
/// Every variant leaves the order's flags untouched, so the job stays
/// eligible for the next matching notification.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Printer {0} is not reachable")]
    Unreachable(String),

    #[error("Print target not configured: {0}")]
    UnknownTarget(String),

    #[error("Print failed: {0}")]
    Print(#[from] PrintError),

    #[error("Receipt formatting failed: {0}")]
    Format(#[from] FormatError),

    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Unknown watcher: {0}")]
    UnknownWatcher(String),
}
