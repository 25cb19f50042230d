//! Private City Ledger
//!
//! Closed-world registry of citizens and properties with a shared treasury:
//! - Citizens hold a single fungible balance
//! - Properties are owned by citizens and carry a tax rate
//! - Tax payments move funds from citizens into the treasury
//!
//! Every operation is all-or-nothing. Transport, authentication and
//! persistence belong to the surrounding system.

pub mod address;
pub mod citizen;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod operation;
pub mod property;
pub mod shared;
pub mod treasury;

pub use address::{Address, ADDRESS_LEN};
pub use citizen::{Citizen, CitizenRegistry};
pub use error::{LedgerError, Result};
pub use journal::{Journal, JournalEntry};
pub use ledger::{Ledger, LedgerStats};
pub use operation::{Effect, Operation, WriteMode};
pub use property::{Property, PropertyRegistry, MAX_TAX_RATE};
pub use shared::SharedLedger;
pub use treasury::Treasury;
