//! Watch definitions
//!
//! A watch pairs a store predicate with the change kinds it reacts to and
//! the durable transition a successful print performs.

use super::print_state::{AuditCounter, AuditField, OrderPatch, PrintFlag};
use std::fmt;

/// Kind of live-query change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Document entered the query (or matched when the listener attached)
    Added,
    /// Document still matches but its content changed
    Modified,
    /// Document left the query
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        })
    }
}

/// Event-type context of a print job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    New,
    Reprint,
    Kitchen,
}

impl JobKind {
    /// Prefix of the in-process lock key
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::New => "new",
            JobKind::Reprint => "reprint",
            JobKind::Kitchen => "kitchen",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality predicate on a print-state flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagFilter {
    pub flag: PrintFlag,
    pub value: bool,
}

impl FlagFilter {
    pub fn equals(flag: PrintFlag, value: bool) -> Self {
        Self { flag, value }
    }
}

/// Durable transition committed after a successful print
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTransition {
    pub set: Vec<PrintFlag>,
    pub clear: Vec<PrintFlag>,
    pub stamps: Vec<AuditField>,
    pub increments: Vec<AuditCounter>,
}

impl FlagTransition {
    pub fn to_patch(&self) -> OrderPatch {
        let flags = self
            .set
            .iter()
            .map(|f| (*f, true))
            .chain(self.clear.iter().map(|f| (*f, false)))
            .collect();
        OrderPatch {
            flags,
            stamps: self.stamps.clone(),
            increments: self.increments.clone(),
        }
    }
}

/// One listener's declarative configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchDefinition {
    pub name: String,
    pub collection: String,
    pub filter: FlagFilter,
    pub accepts: Vec<ChangeKind>,
    pub kind: JobKind,
    pub transition: FlagTransition,
    /// Bold centered line printed above the receipt
    pub label: Option<String>,
    /// Print here regardless of the order's routing attribute
    pub target_override: Option<String>,
}

impl WatchDefinition {
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        self.accepts.contains(&kind)
    }

    /// Orders that have never been printed
    pub fn new_orders(collection: &str) -> Self {
        Self {
            name: "new_orders".to_string(),
            collection: collection.to_string(),
            filter: FlagFilter::equals(PrintFlag::Printed, false),
            accepts: vec![ChangeKind::Added],
            kind: JobKind::New,
            transition: FlagTransition {
                set: vec![PrintFlag::Printed],
                stamps: vec![AuditField::PrintedAt],
                ..Default::default()
            },
            label: None,
            target_override: None,
        }
    }

    /// Orders with a pending reprint request
    ///
    /// A request flipped on an existing order arrives as `modified`; one
    /// already pending when the listener attaches arrives as `added`.
    pub fn reprints(collection: &str) -> Self {
        Self {
            name: "reprints".to_string(),
            collection: collection.to_string(),
            filter: FlagFilter::equals(PrintFlag::ReprintRequested, true),
            accepts: vec![ChangeKind::Added, ChangeKind::Modified],
            kind: JobKind::Reprint,
            transition: FlagTransition {
                clear: vec![PrintFlag::ReprintRequested],
                stamps: vec![AuditField::LastReprintAt],
                increments: vec![AuditCounter::ReprintCount],
                ..Default::default()
            },
            label: Some("REPRINT".to_string()),
            target_override: None,
        }
    }

    /// Kitchen copy of every order
    pub fn kitchen(collection: &str) -> Self {
        Self {
            name: "kitchen".to_string(),
            collection: collection.to_string(),
            filter: FlagFilter::equals(PrintFlag::KitchenPrinted, false),
            accepts: vec![ChangeKind::Added],
            kind: JobKind::Kitchen,
            transition: FlagTransition {
                set: vec![PrintFlag::KitchenPrinted],
                stamps: vec![AuditField::KitchenPrintedAt],
                ..Default::default()
            },
            label: Some("KITCHEN".to_string()),
            target_override: Some("kitchen".to_string()),
        }
    }

    /// Built-in definitions by name
    pub fn by_name(name: &str, collection: &str) -> Option<Self> {
        match name.trim() {
            "new_orders" => Some(Self::new_orders(collection)),
            "reprints" => Some(Self::reprints(collection)),
            "kitchen" => Some(Self::kitchen(collection)),
            _ => None,
        }
    }

    pub fn defaults(collection: &str) -> Vec<Self> {
        vec![
            Self::new_orders(collection),
            Self::reprints(collection),
            Self::kitchen(collection),
        ]
    }
}
