//! Property registry and per-property tax calculation

use crate::address::Address;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Highest accepted tax rate, in percent
pub const MAX_TAX_RATE: u8 = 100;

/// An owned asset. Reads of unregistered ids return the default record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub details: String,
    pub owner_address: Address,
    /// Percentage of the owner's balance collected per tax payment
    pub tax_rate: u8,
}

impl Property {
    pub fn new(
        id: impl Into<String>,
        details: impl Into<String>,
        owner_address: Address,
        tax_rate: u8,
    ) -> Result<Self> {
        validate_tax_rate(tax_rate)?;
        Ok(Property {
            id: id.into(),
            details: details.into(),
            owner_address,
            tax_rate,
        })
    }

    /// Tax owed on `balance`, rounded down.
    pub fn tax_due(&self, balance: u64) -> u64 {
        // rate <= 100 keeps the quotient <= balance
        (balance as u128 * self.tax_rate as u128 / 100) as u64
    }
}

pub fn validate_tax_rate(rate: u8) -> Result<()> {
    if rate > MAX_TAX_RATE {
        return Err(LedgerError::InvalidTaxRate(rate));
    }
    Ok(())
}

/// Serializes as a plain map from id to record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PropertyRegistry {
    properties: HashMap<String, Property>,
}

impl<'de> Deserialize<'de> for PropertyRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let properties = HashMap::<String, Property>::deserialize(deserializer)?;
        PropertyRegistry::from_records(properties).map_err(serde::de::Error::custom)
    }
}

impl PropertyRegistry {
    pub fn new() -> Self {
        PropertyRegistry {
            properties: HashMap::new(),
        }
    }

    /// Every record must be stored under its own id with a valid rate.
    pub(crate) fn from_records(properties: HashMap<String, Property>) -> Result<Self> {
        for (key, property) in &properties {
            if *key != property.id {
                return Err(LedgerError::InvariantViolation(format!(
                    "property {} stored under id {}",
                    property.id, key
                )));
            }
            validate_tax_rate(property.tax_rate)?;
        }
        Ok(PropertyRegistry { properties })
    }

    /// Stored record, or the default one when `id` is not registered.
    pub fn get(&self, id: &str) -> Property {
        self.properties.get(id).cloned().unwrap_or_default()
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Property> {
        self.properties.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.properties.contains_key(id)
    }

    pub(crate) fn upsert(&mut self, property: Property) -> Option<Property> {
        self.properties.insert(property.id.clone(), property)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Property> {
        self.properties.remove(id)
    }

    /// Properties owned by `owner`, sorted by id.
    pub fn owned_by(&self, owner: &Address) -> Vec<&Property> {
        let mut owned: Vec<&Property> = self
            .properties
            .values()
            .filter(|p| p.owner_address == *owner)
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        owned
    }

    pub fn count_owned_by(&self, owner: &Address) -> usize {
        self.properties
            .values()
            .filter(|p| p.owner_address == *owner)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
