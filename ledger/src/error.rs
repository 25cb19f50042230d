//! Ledger error types

use crate::address::Address;
use thiserror::Error;

/// Errors returned by ledger operations.
///
/// Every error leaves the ledger exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Arithmetic overflow while updating {0}")]
    Overflow(&'static str),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("Insufficient treasury balance: requested {requested}, available {available}")]
    InsufficientTreasury { requested: u64, available: u64 },

    #[error("Citizen not found: {0}")]
    CitizenNotFound(Address),

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Citizen already registered: {0}")]
    CitizenExists(Address),

    #[error("Property already registered: {0}")]
    PropertyExists(String),

    #[error("Citizen {address} still owns {count} properties")]
    CitizenOwnsProperties { address: Address, count: usize },

    #[error("Citizen {address} still holds a balance of {balance}")]
    BalanceAtRisk { address: Address, balance: u64 },

    #[error("Invalid tax rate: {0} (must be 0..=100)")]
    InvalidTaxRate(u8),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
