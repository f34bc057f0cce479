//! Tide Dispatch - receipt print-dispatch engine
//!
//! # Overview
//!
//! Watches the order store for orders that need a printed receipt, renders
//! each one for the routed thermal printer and records the print outcome
//! durably so that every receipt is printed once per intent, even with
//! several dispatch instances watching the same store.
//!
//! - **Store** (`store`): order documents, live queries, transactional updates
//! - **Printing** (`printing`): gate, registry, formatter, coordinator, watchers
//! - **Core** (`core`): configuration, engine wiring, operator inbox,
//!   background tasks
//!
//! Orders reach the store either from a host application sharing the store
//! or through the inbox: `*.jsonl` command files dropped into
//! `work_dir/inbox` are applied on every sweep (see [`core::inbox`]).
//!
//! # Module layout
//!
//! ```text
//! tide-dispatch/src/
//! ├── core/          # config, state, inbox, background tasks
//! ├── models/        # order, print state, watch definitions, targets
//! ├── printing/      # dispatch engine
//! ├── store/         # OrderStore trait, redb and in-memory stores
//! └── utils/         # errors, logging
//! ```

pub mod core;
pub mod models;
pub mod printing;
pub mod store;
pub mod utils;

pub use core::{BackgroundTasks, Config, DispatchState, OrderInbox, TaskKind};
pub use models::{Order, PrintTarget, WatchDefinition};
pub use printing::{
    ChangeFeedWatcher, ConcurrencyGate, JobOutcome, PrintJobCoordinator, PrinterRegistry,
    ReceiptFormatter, TransactionalStateUpdater,
};
pub use store::{
    MemoryOrderStore, OrderStore, OrderWriter, RedbOrderStore, StoreError, StoreResult,
};
pub use utils::{ConfigError, JobError, JobResult};

pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Load `.env`, create the work directory and start logging
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(&config.log_level, config.log_json, Some(&config.log_dir()))?;

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
 _______ _     _
|__   __(_)   | |
   | |   _  __| | ___
   | |  | |/ _` |/ _ \
   | |  | | (_| |  __/
   |_|  |_|\__,_|\___|
    "#
    );
}
