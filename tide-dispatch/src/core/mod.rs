//! Configuration, engine wiring, the operator inbox and task supervision

pub mod config;
pub mod inbox;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use inbox::{InboxCommand, InboxReport, OrderInbox};
pub use state::DispatchState;
pub use tasks::{BackgroundTasks, TaskKind};
