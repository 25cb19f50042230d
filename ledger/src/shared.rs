//! Thread-safe handle serializing access to one ledger

use crate::address::Address;
use crate::citizen::Citizen;
use crate::error::Result;
use crate::journal::JournalEntry;
use crate::ledger::{Ledger, LedgerStats};
use crate::operation::{Effect, Operation};
use crate::property::Property;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloning shares the same underlying ledger. Each call holds the lock for
/// exactly one operation, so concurrent callers observe a serial order.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn apply(&self, operation: Operation) -> Result<Effect> {
        self.inner.lock().apply(operation)
    }

    /// Apply operations in order, stopping at the first failure.
    /// The whole batch runs under one lock.
    pub fn apply_all(&self, operations: Vec<Operation>) -> Result<Vec<Effect>> {
        let mut ledger = self.inner.lock();
        operations
            .into_iter()
            .map(|op| ledger.apply(op))
            .collect()
    }

    pub fn citizen(&self, address: &Address) -> Citizen {
        self.inner.lock().citizen(address)
    }

    pub fn property(&self, id: &str) -> Property {
        self.inner.lock().property(id)
    }

    pub fn treasury(&self) -> u64 {
        self.inner.lock().treasury()
    }

    pub fn stats(&self) -> LedgerStats {
        self.inner.lock().stats()
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.inner.lock().check_invariants()
    }

    /// Take the retained journal entries. Long-running callers drain
    /// periodically so the journal and `snapshot` stay small.
    pub fn drain_journal(&self) -> Vec<JournalEntry> {
        self.inner.lock().drain_journal()
    }

    /// Consistent copy of the whole ledger, including undrained entries
    pub fn snapshot(&self) -> Ledger {
        self.inner.lock().clone()
    }
}
