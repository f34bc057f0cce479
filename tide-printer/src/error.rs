//! Transport and configuration errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintError {
    /// TCP connect to the device failed
    #[error("Cannot connect to printer: {0}")]
    Connection(String),

    #[error("Printer I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connect, write or flush exceeded the transport deadline
    #[error("Printer timed out: {0}")]
    Timeout(String),

    /// Bad interface string or unknown target
    #[error("Invalid printer configuration: {0}")]
    InvalidConfig(String),
}

pub type PrintResult<T> = Result<T, PrintError>;
