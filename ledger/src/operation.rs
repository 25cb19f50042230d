//! Operations accepted by the ledger and the effects they produce
//!
//! `Operation` is the form in which a surrounding transport hands work to
//! the ledger. Scripts replayed by the CLI are JSON arrays of these.

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// How an add operation treats an existing record at the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Fail if the key is already registered
    Insert,
    /// Fail if the key is not registered. Citizen updates keep the balance.
    Update,
    /// Insert or overwrite
    #[default]
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddCitizen {
        name: String,
        address: Address,
        #[serde(default)]
        mode: WriteMode,
    },
    RemoveCitizen {
        address: Address,
    },
    AddProperty {
        id: String,
        details: String,
        owner: Address,
        tax_rate: u8,
        #[serde(default)]
        mode: WriteMode,
    },
    RemoveProperty {
        id: String,
    },
    TransferProperty {
        id: String,
        new_owner: Address,
    },
    Deposit {
        address: Address,
        amount: u64,
    },
    Withdraw {
        address: Address,
        amount: u64,
    },
    PayTaxes {
        address: Address,
    },
    /// Administrative drain of the treasury
    WithdrawTreasury {
        amount: u64,
    },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AddCitizen { .. } => "add_citizen",
            Operation::RemoveCitizen { .. } => "remove_citizen",
            Operation::AddProperty { .. } => "add_property",
            Operation::RemoveProperty { .. } => "remove_property",
            Operation::TransferProperty { .. } => "transfer_property",
            Operation::Deposit { .. } => "deposit",
            Operation::Withdraw { .. } => "withdraw",
            Operation::PayTaxes { .. } => "pay_taxes",
            Operation::WithdrawTreasury { .. } => "withdraw_treasury",
        }
    }
}

/// Outcome of a successfully applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    CitizenAdded {
        address: Address,
        replaced: bool,
    },
    CitizenRemoved {
        address: Address,
        existed: bool,
    },
    PropertyAdded {
        id: String,
        replaced: bool,
    },
    PropertyRemoved {
        id: String,
        existed: bool,
    },
    PropertyTransferred {
        id: String,
        from: Address,
        to: Address,
    },
    Deposited {
        address: Address,
        amount: u64,
        balance: u64,
    },
    Withdrawn {
        address: Address,
        amount: u64,
        balance: u64,
    },
    TaxCollected {
        address: Address,
        amount: u64,
        properties: usize,
        treasury: u64,
    },
    TreasuryWithdrawn {
        amount: u64,
        treasury: u64,
    },
}

impl Effect {
    /// Tax moved into the treasury by this effect, zero for other effects.
    pub fn tax_collected(&self) -> u64 {
        match self {
            Effect::TaxCollected { amount, .. } => *amount,
            _ => 0,
        }
    }
}
