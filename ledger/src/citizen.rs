//! Citizen registry for tracking identities and balances

use crate::address::Address;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A citizen record. Reads of unregistered addresses return the default
/// record; registration itself is a property of the registry (`contains`),
/// since a citizen added with an empty name at the zero address also
/// equals the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
    pub name: String,
    pub address: Address,
    pub balance: u64,
}

impl Citizen {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Citizen {
            name: name.into(),
            address,
            balance: 0,
        }
    }
}

/// Serializes as a plain map from address to record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CitizenRegistry {
    citizens: HashMap<Address, Citizen>,
}

impl<'de> Deserialize<'de> for CitizenRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let citizens = HashMap::<Address, Citizen>::deserialize(deserializer)?;
        CitizenRegistry::from_records(citizens).map_err(serde::de::Error::custom)
    }
}

impl CitizenRegistry {
    pub fn new() -> Self {
        CitizenRegistry {
            citizens: HashMap::new(),
        }
    }

    /// Every record must be stored under its own address.
    pub(crate) fn from_records(citizens: HashMap<Address, Citizen>) -> Result<Self> {
        if let Some((key, citizen)) = citizens.iter().find(|(key, c)| **key != c.address) {
            return Err(LedgerError::InvariantViolation(format!(
                "citizen {} stored under address {}",
                citizen.address, key
            )));
        }
        Ok(CitizenRegistry { citizens })
    }

    /// Stored record, or the default one when `address` is not registered.
    pub fn get(&self, address: &Address) -> Citizen {
        self.citizens.get(address).cloned().unwrap_or_default()
    }

    pub fn get_ref(&self, address: &Address) -> Option<&Citizen> {
        self.citizens.get(address)
    }

    pub(crate) fn get_mut(&mut self, address: &Address) -> Option<&mut Citizen> {
        self.citizens.get_mut(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.citizens.contains_key(address)
    }

    /// Insert or overwrite, returning the replaced record.
    pub(crate) fn upsert(&mut self, citizen: Citizen) -> Option<Citizen> {
        self.citizens.insert(citizen.address, citizen)
    }

    pub(crate) fn remove(&mut self, address: &Address) -> Option<Citizen> {
        self.citizens.remove(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citizen> {
        self.citizens.values()
    }

    pub fn len(&self) -> usize {
        self.citizens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.citizens.is_empty()
    }

    /// Sum of all balances. Widened so the sum itself cannot overflow.
    pub fn total_balance(&self) -> u128 {
        self.citizens.values().map(|c| c.balance as u128).sum()
    }
}
