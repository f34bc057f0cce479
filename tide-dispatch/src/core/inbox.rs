//! Operator inbox
//!
//! Host applications and operators feed the order store by dropping
//! `*.jsonl` files into the inbox directory. Each line is one command:
//!
//! ```text
//! {"op":"upsert","order":{"id":"o-1","orderNumber":"A1","items":[...]}}
//! {"op":"reprint","orderId":"o-1"}
//! {"op":"remove","orderId":"o-1"}
//! ```
//!
//! Files are taken in name order. A file is parsed in full before any
//! command runs; a file with a bad line is moved to `failed/` untouched,
//! otherwise its commands are applied in order and it moves to `done/`.
//! Write under another extension and rename to `.jsonl` when complete.

use crate::models::Order;
use crate::store::OrderWriter;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const INBOX_EXTENSION: &str = "jsonl";
const DONE_DIR: &str = "done";
const FAILED_DIR: &str = "failed";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InboxCommand {
    Upsert {
        order: Box<Order>,
    },
    #[serde(rename_all = "camelCase")]
    Reprint { order_id: String },
    #[serde(rename_all = "camelCase")]
    Remove { order_id: String },
}

impl InboxCommand {
    pub fn order_id(&self) -> &str {
        match self {
            InboxCommand::Upsert { order } => &order.id,
            InboxCommand::Reprint { order_id } | InboxCommand::Remove { order_id } => order_id,
        }
    }
}

/// Result of one inbox sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InboxReport {
    /// Files moved to `done/`
    pub files: usize,
    /// Commands applied from those files
    pub commands: usize,
    /// Files moved to `failed/`
    pub rejected: usize,
}

/// Parse a command file; blank lines are skipped
pub fn parse_commands(content: &str) -> anyhow::Result<Vec<InboxCommand>> {
    let mut commands = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let command: InboxCommand =
            serde_json::from_str(line).with_context(|| format!("line {}", index + 1))?;
        if command.order_id().trim().is_empty() {
            anyhow::bail!("line {}: order id is empty", index + 1);
        }
        commands.push(command);
    }
    Ok(commands)
}

pub struct OrderInbox {
    dir: PathBuf,
    writer: Arc<dyn OrderWriter>,
}

impl OrderInbox {
    pub fn new(dir: impl Into<PathBuf>, writer: Arc<dyn OrderWriter>) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Process every pending file once
    pub fn scan(&self) -> anyhow::Result<InboxReport> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create inbox {}", self.dir.display()))?;

        let mut pending: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(INBOX_EXTENSION)
            })
            .collect();
        pending.sort();

        let mut report = InboxReport::default();
        for path in pending {
            match self.process(&path) {
                Ok(applied) => {
                    report.files += 1;
                    report.commands += applied;
                    self.archive(&path, DONE_DIR)?;
                }
                Err(e) => {
                    report.rejected += 1;
                    warn!(file = %path.display(), error = %format!("{:#}", e), "Rejected inbox file");
                    self.archive(&path, FAILED_DIR)?;
                }
            }
        }

        if report.files + report.rejected > 0 {
            info!(
                files = report.files,
                commands = report.commands,
                rejected = report.rejected,
                "Inbox processed"
            );
        }
        Ok(report)
    }

    fn process(&self, path: &Path) -> anyhow::Result<usize> {
        let content = fs::read_to_string(path)?;
        let commands = parse_commands(&content)?;
        for command in &commands {
            self.apply(command)?;
        }
        Ok(commands.len())
    }

    fn apply(&self, command: &InboxCommand) -> anyhow::Result<()> {
        match command {
            InboxCommand::Upsert { order } => {
                self.writer.put_order(order.as_ref().clone())?;
            }
            InboxCommand::Reprint { order_id } => {
                if !self.writer.flag_reprint(order_id)? {
                    warn!(order_id = %order_id, "Reprint requested for unknown order");
                }
            }
            InboxCommand::Remove { order_id } => {
                if !self.writer.delete_order(order_id)? {
                    warn!(order_id = %order_id, "Remove requested for unknown order");
                }
            }
        }
        Ok(())
    }

    fn archive(&self, path: &Path, bucket: &str) -> anyhow::Result<()> {
        let target_dir = self.dir.join(bucket);
        fs::create_dir_all(&target_dir)?;
        let Some(name) = path.file_name() else {
            return Ok(());
        };
        fs::rename(path, target_dir.join(name))
            .with_context(|| format!("Failed to move {} to {}", path.display(), bucket))
    }
}
