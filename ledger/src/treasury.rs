//! Treasury accumulator
//!
//! Receives every tax payment. Funds only leave through an explicit
//! administrative withdrawal.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Only `balance` is bounded; lifetime totals are widened so they never
/// block a credit or debit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreasuryState")]
pub struct Treasury {
    balance: u64,
    total_collected: u128,
    total_disbursed: u128,
}

/// Serialized form of a treasury, checked before it becomes a `Treasury`
#[derive(Debug, Deserialize)]
pub(crate) struct TreasuryState {
    balance: u64,
    total_collected: u128,
    total_disbursed: u128,
}

impl TryFrom<TreasuryState> for Treasury {
    type Error = LedgerError;

    fn try_from(state: TreasuryState) -> Result<Self> {
        let net = state.total_collected.checked_sub(state.total_disbursed);
        if net != Some(state.balance as u128) {
            return Err(LedgerError::InvariantViolation(format!(
                "treasury balance {} does not match collected {} minus disbursed {}",
                state.balance, state.total_collected, state.total_disbursed
            )));
        }
        Ok(Treasury {
            balance: state.balance,
            total_collected: state.total_collected,
            total_disbursed: state.total_disbursed,
        })
    }
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn total_collected(&self) -> u128 {
        self.total_collected
    }

    pub fn total_disbursed(&self) -> u128 {
        self.total_disbursed
    }

    /// Validate a credit without applying it.
    pub(crate) fn check_credit(&self, amount: u64) -> Result<()> {
        self.balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow("treasury balance"))?;
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: u64) -> Result<()> {
        self.check_credit(amount)?;
        self.balance += amount;
        self.total_collected = self.total_collected.saturating_add(amount as u128);
        Ok(())
    }

    pub(crate) fn debit(&mut self, amount: u64) -> Result<()> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientTreasury {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.total_disbursed = self.total_disbursed.saturating_add(amount as u128);
        Ok(())
    }
}
