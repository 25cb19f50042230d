//! Replay of JSON operation scripts against a fresh ledger

use anyhow::{Context, Result};
use city_ledger::{Effect, Ledger, Operation, SharedLedger};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// An operation the ledger refused
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Zero-based position in the script
    pub index: usize,
    pub operation: Operation,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub effects: Vec<Effect>,
    pub rejected: Vec<Rejection>,
    /// Script entries never attempted because the replay stopped early
    pub skipped: usize,
    #[serde(skip)]
    pub ledger: Ledger,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.skipped == 0
    }
}

pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<Operation>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    parse_script(&contents).with_context(|| format!("parsing script {}", path.display()))
}

pub fn parse_script(contents: &str) -> Result<Vec<Operation>> {
    Ok(serde_json::from_str(contents)?)
}

pub fn replay(operations: Vec<Operation>, stop_on_error: bool) -> ReplayReport {
    let ledger = SharedLedger::default();
    let total = operations.len();
    let mut effects = Vec::new();
    let mut rejected = Vec::new();

    for (index, operation) in operations.into_iter().enumerate() {
        match ledger.apply(operation.clone()) {
            Ok(effect) => effects.push(effect),
            Err(e) => {
                rejected.push(Rejection {
                    index,
                    operation,
                    error: e.to_string(),
                });
                if stop_on_error {
                    break;
                }
            }
        }
    }

    let attempted = effects.len() + rejected.len();
    log::info!(
        "Replayed {} of {} operations ({} rejected)",
        attempted,
        total,
        rejected.len()
    );

    ReplayReport {
        effects,
        rejected,
        skipped: total - attempted,
        ledger: ledger.snapshot(),
    }
}

/// Sample script exercising every operation
pub fn example_script() -> Vec<Operation> {
    use city_ledger::{Address, WriteMode};

    let alice = Address::from_low_u64(0xa11ce);
    let bob = Address::from_low_u64(0xb0b);
    vec![
        Operation::AddCitizen {
            name: "Alice".to_string(),
            address: alice,
            mode: WriteMode::Insert,
        },
        Operation::AddCitizen {
            name: "Bob".to_string(),
            address: bob,
            mode: WriteMode::Insert,
        },
        Operation::AddProperty {
            id: "property1".to_string(),
            details: "A nice house".to_string(),
            owner: alice,
            tax_rate: 10,
            mode: WriteMode::Upsert,
        },
        Operation::Deposit {
            address: alice,
            amount: 10,
        },
        Operation::PayTaxes { address: alice },
        Operation::TransferProperty {
            id: "property1".to_string(),
            new_owner: bob,
        },
        Operation::Withdraw {
            address: alice,
            amount: 9,
        },
        Operation::RemoveCitizen { address: alice },
    ]
}
