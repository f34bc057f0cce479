//! Cross-cutting helpers

pub mod error;
pub mod logger;

pub use error::{ConfigError, JobError, JobResult};
