//! Print-state flags and the narrow writes that flip them

use super::order::Order;
use chrono::{DateTime, Utc};
use std::fmt;

/// Boolean print-state flag on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintFlag {
    Printed,
    ReprintRequested,
    KitchenPrinted,
}

impl PrintFlag {
    /// Document field name
    pub fn field(&self) -> &'static str {
        match self {
            PrintFlag::Printed => "printed",
            PrintFlag::ReprintRequested => "reprintRequested",
            PrintFlag::KitchenPrinted => "kitchenPrinted",
        }
    }
}

impl fmt::Display for PrintFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Audit timestamp stamped with server time on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditField {
    PrintedAt,
    LastReprintAt,
    KitchenPrintedAt,
}

/// Audit counter incremented on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditCounter {
    ReprintCount,
}

/// Flag-scoped write applied inside a store transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub flags: Vec<(PrintFlag, bool)>,
    pub stamps: Vec<AuditField>,
    pub increments: Vec<AuditCounter>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.stamps.is_empty() && self.increments.is_empty()
    }
}

impl Order {
    pub fn flag(&self, flag: PrintFlag) -> bool {
        match flag {
            PrintFlag::Printed => self.printed,
            PrintFlag::ReprintRequested => self.reprint_requested,
            PrintFlag::KitchenPrinted => self.kitchen_printed,
        }
    }

    pub fn set_flag(&mut self, flag: PrintFlag, value: bool) {
        match flag {
            PrintFlag::Printed => self.printed = value,
            PrintFlag::ReprintRequested => self.reprint_requested = value,
            PrintFlag::KitchenPrinted => self.kitchen_printed = value,
        }
    }

    /// Apply a patch; `now` is the store-assigned commit time
    pub fn apply_patch(&mut self, patch: &OrderPatch, now: DateTime<Utc>) {
        for (flag, value) in &patch.flags {
            self.set_flag(*flag, *value);
        }
        for stamp in &patch.stamps {
            match stamp {
                AuditField::PrintedAt => self.printed_at = Some(now),
                AuditField::LastReprintAt => self.last_reprint_at = Some(now),
                AuditField::KitchenPrintedAt => self.kitchen_printed_at = Some(now),
            }
        }
        for counter in &patch.increments {
            match counter {
                AuditCounter::ReprintCount => {
                    self.reprint_count = self.reprint_count.saturating_add(1)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_reprint_patch() {
        let mut order = Order {
            id: "o-1".to_string(),
            reprint_requested: true,
            reprint_count: 2,
            ..Default::default()
        };
        let now = Utc::now();
        let patch = OrderPatch {
            flags: vec![(PrintFlag::ReprintRequested, false)],
            stamps: vec![AuditField::LastReprintAt],
            increments: vec![AuditCounter::ReprintCount],
        };

        order.apply_patch(&patch, now);

        assert!(!order.flag(PrintFlag::ReprintRequested));
        assert_eq!(order.reprint_count, 3);
        assert_eq!(order.last_reprint_at, Some(now));
        assert!(order.printed_at.is_none());
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut order = Order {
            id: "o-2".to_string(),
            ..Default::default()
        };
        let before = order.clone();
        order.apply_patch(&OrderPatch::default(), Utc::now());
        assert_eq!(order, before);
        assert!(OrderPatch::default().is_empty());
    }
}
