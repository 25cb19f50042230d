//! Append-only audit trail of applied operations

use crate::error::{LedgerError, Result};
use crate::operation::{Effect, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position among all applied operations, starting at 1
    pub sequence: u64,
    pub operation: Operation,
    pub effect: Effect,
}

/// Only successful operations are recorded. Callers bound its size by
/// draining; sequence numbers keep counting across drains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "JournalState")]
pub struct Journal {
    entries: Vec<JournalEntry>,
    /// Operations recorded since creation, drained or not
    applied: u64,
}

#[derive(Debug, Deserialize)]
struct JournalState {
    entries: Vec<JournalEntry>,
    applied: u64,
}

impl TryFrom<JournalState> for Journal {
    type Error = LedgerError;

    /// Retained entries must be the consecutive tail ending at `applied`.
    fn try_from(state: JournalState) -> Result<Self> {
        let retained = state.entries.len() as u64;
        if retained > state.applied {
            return Err(LedgerError::InvariantViolation(format!(
                "journal holds {} entries but only {} operations were applied",
                retained, state.applied
            )));
        }
        let first = state.applied - retained + 1;
        for (offset, entry) in state.entries.iter().enumerate() {
            let expected = first + offset as u64;
            if entry.sequence != expected {
                return Err(LedgerError::InvariantViolation(format!(
                    "journal entry has sequence {}, expected {}",
                    entry.sequence, expected
                )));
            }
        }
        Ok(Journal {
            entries: state.entries,
            applied: state.applied,
        })
    }
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, operation: Operation, effect: Effect) -> u64 {
        self.applied += 1;
        let sequence = self.applied;
        self.entries.push(JournalEntry {
            sequence,
            operation,
            effect,
        });
        sequence
    }

    /// Retained entries, oldest first
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Remove and return every retained entry.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
