//! Per-document, per-job-kind in-process exclusion
//!
//! Keys have the form `{kind}:{order_id}`. A held key means a job for that
//! pair is in flight in this process; a second notification for the same
//! pair is dropped rather than queued. Nothing here is shared across
//! processes, the order flags stay the source of truth.

use crate::models::JobKind;
use dashmap::DashSet;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ConcurrencyGate {
    held: DashSet<String>,
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(kind: JobKind, order_id: &str) -> String {
        format!("{}:{}", kind.as_str(), order_id)
    }

    /// Mark `key` held; false if it already was
    pub fn try_acquire(&self, key: &str) -> bool {
        self.held.insert(key.to_string())
    }

    pub fn release(&self, key: &str) {
        self.held.remove(key);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Acquire the key for `kind`/`order_id`, released when the permit drops
    pub fn try_lock(self: &Arc<Self>, kind: JobKind, order_id: &str) -> Option<GatePermit> {
        let key = Self::key(kind, order_id);
        if !self.try_acquire(&key) {
            return None;
        }
        Some(GatePermit {
            gate: Arc::clone(self),
            key,
        })
    }
}

/// Held gate key
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<ConcurrencyGate>,
    key: String,
}

impl GatePermit {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let gate = ConcurrencyGate::new();
        assert!(gate.try_acquire("new:o-1"));
        assert!(!gate.try_acquire("new:o-1"));
        gate.release("new:o-1");
        assert!(gate.try_acquire("new:o-1"));
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let gate = Arc::new(ConcurrencyGate::new());
        let permit = gate.try_lock(JobKind::New, "o-1").unwrap();
        assert_eq!(permit.key(), "new:o-1");
        assert!(gate.try_lock(JobKind::New, "o-1").is_none());
        drop(permit);
        assert!(!gate.is_held("new:o-1"));
        assert!(gate.try_lock(JobKind::New, "o-1").is_some());
    }

    #[test]
    fn test_kinds_are_independent() {
        let gate = Arc::new(ConcurrencyGate::new());
        let _reprint = gate.try_lock(JobKind::Reprint, "o-1").unwrap();
        let _kitchen = gate.try_lock(JobKind::Kitchen, "o-1").unwrap();
        assert_eq!(gate.held_count(), 2);
    }

    #[test]
    fn test_release_on_panic() {
        let gate = Arc::new(ConcurrencyGate::new());
        let g = Arc::clone(&gate);
        let result = std::panic::catch_unwind::<_, ()>(std::panic::AssertUnwindSafe(move || {
            let _permit = g.try_lock(JobKind::New, "o-1").unwrap();
            panic!("job crashed");
        }));
        assert!(result.is_err());
        assert!(!gate.is_held("new:o-1"));
    }
}
