//! Ownership bookkeeping: who was allocated, and whether every allocation was
//! released exactly once before the coordinator went away.

use crate::error::{PatternError, Result};
use crate::narration::Narrator;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Census: allocation ledger
// =============================================================================

#[derive(Debug, Default)]
struct Ledger {
    next_id: u64,
    allocated: usize,
    released: usize,
    live: BTreeMap<u64, String>,
}

/// Shared ledger of participant lifetimes. Clones see the same ledger.
#[derive(Debug, Clone, Default)]
pub struct Census {
    ledger: Rc<RefCell<Ledger>>,
}

impl Census {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allocation. The returned lifeline releases it on drop.
    pub fn enroll(&self, label: impl Into<String>) -> Lifeline {
        self.enroll_with(label, None)
    }

    /// Like [`Census::enroll`], but the release is also narrated.
    pub fn enroll_narrated(&self, label: impl Into<String>, out: &Narrator) -> Lifeline {
        self.enroll_with(label, Some(out.clone()))
    }

    fn enroll_with(&self, label: impl Into<String>, out: Option<Narrator>) -> Lifeline {
        let label = label.into();
        let mut ledger = self.ledger.borrow_mut();
        let id = ledger.next_id;
        ledger.next_id += 1;
        ledger.allocated += 1;
        ledger.live.insert(id, label.clone());
        tracing::trace!(id, %label, "participant allocated");

        Lifeline {
            id,
            label,
            census: self.clone(),
            out,
        }
    }

    pub fn allocated(&self) -> usize {
        self.ledger.borrow().allocated
    }

    pub fn released(&self) -> usize {
        self.ledger.borrow().released
    }

    pub fn live(&self) -> usize {
        self.ledger.borrow().live.len()
    }

    /// Labels of participants still alive, in allocation order.
    pub fn live_labels(&self) -> Vec<String> {
        self.ledger.borrow().live.values().cloned().collect()
    }

    pub fn ensure_all_released(&self) -> Result<()> {
        let leaked = self.live_labels();
        if leaked.is_empty() {
            Ok(())
        } else {
            Err(PatternError::fatal(format!(
                "{} participant(s) never released: {}",
                leaked.len(),
                leaked.join(", ")
            )))
        }
    }

    fn release(&self, id: u64) -> bool {
        let mut ledger = self.ledger.borrow_mut();
        match ledger.live.remove(&id) {
            Some(_) => {
                ledger.released += 1;
                true
            }
            None => false,
        }
    }
}

/// Proof of one allocation. Dropping it releases the allocation; cloning it
/// enrolls a new one, so a cloned participant is counted separately.
pub struct Lifeline {
    id: u64,
    label: String,
    census: Census,
    out: Option<Narrator>,
}

impl Lifeline {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifeline")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

impl Clone for Lifeline {
    fn clone(&self) -> Self {
        self.census.enroll_with(self.label.clone(), self.out.clone())
    }
}

impl Drop for Lifeline {
    fn drop(&mut self) {
        if !self.census.release(self.id) {
            tracing::error!(id = self.id, label = %self.label, "double release");
            return;
        }
        tracing::trace!(id = self.id, label = %self.label, "participant released");
        if let Some(out) = &self.out {
            out.say(format!("♻️ Released {}", self.label));
        }
    }
}

// =============================================================================
// ScopeGuard: deferred cleanup / rollback
// =============================================================================

/// Runs `cleanup` when dropped unless [`ScopeGuard::disarm`] was called.
pub struct ScopeGuard<F: FnOnce()> {
    cleanup: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    pub fn new(cleanup: F) -> Self {
        ScopeGuard {
            cleanup: Some(cleanup),
        }
    }

    pub fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_enroll_and_release() {
        let census = Census::new();
        let a = census.enroll("a");
        let b = census.enroll("b");
        assert_eq!(census.live(), 2);
        assert_eq!(census.live_labels(), vec!["a", "b"]);

        drop(a);
        assert_eq!(census.live(), 1);
        assert_eq!(census.released(), 1);
        assert!(census.ensure_all_released().is_err());

        drop(b);
        assert!(census.ensure_all_released().is_ok());
        assert_eq!(census.allocated(), 2);
        assert_eq!(census.released(), 2);
    }

    #[test]
    fn test_clone_is_a_new_allocation() {
        let census = Census::new();
        let original = census.enroll("goblin");
        let copy = original.clone();
        assert_eq!(census.allocated(), 2);
        assert_eq!(copy.label(), "goblin");
        drop(original);
        drop(copy);
        assert_eq!(census.released(), 2);
        assert_eq!(census.live(), 0);
    }

    #[test]
    fn test_narrated_release() {
        let out = Narrator::capture();
        let census = Census::new();
        {
            let _line = census.enroll_narrated("engine", &out);
        }
        assert_eq!(out.lines(), vec!["♻️ Released engine"]);
    }

    #[test]
    fn test_leak_report_names_participants() {
        let census = Census::new();
        let _kept = census.enroll("orphan");
        let err = census.ensure_all_released().unwrap_err();
        assert!(err.to_string().contains("orphan"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_scope_guard_runs_unless_disarmed() {
        let ran = Cell::new(0);
        {
            let _guard = ScopeGuard::new(|| ran.set(ran.get() + 1));
        }
        assert_eq!(ran.get(), 1);

        let guard = ScopeGuard::new(|| ran.set(ran.get() + 10));
        guard.disarm();
        assert_eq!(ran.get(), 1);
    }
}
