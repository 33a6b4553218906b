use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::UnitCategory;

/// Remaining unit counts per offered category. The key set is the project's category list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitInventory {
    units: BTreeMap<UnitCategory, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("no {category} units remain to allocate")]
    Underflow { category: UnitCategory },
    #[error("{category} units are not offered by this project")]
    UnknownCategory { category: UnitCategory },
}

impl UnitInventory {
    pub fn new(units: BTreeMap<UnitCategory, u32>) -> Self {
        Self { units }
    }

    pub fn offers(&self, category: UnitCategory) -> bool {
        self.units.contains_key(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Offered categories in size order.
    pub fn categories(&self) -> impl Iterator<Item = UnitCategory> + '_ {
        self.units.keys().copied()
    }

    pub fn smallest_category(&self) -> Option<UnitCategory> {
        self.units.keys().next().copied()
    }

    pub fn remaining(&self, category: UnitCategory) -> Result<u32, InventoryError> {
        self.units
            .get(&category)
            .copied()
            .ok_or(InventoryError::UnknownCategory { category })
    }

    pub fn decrement(&mut self, category: UnitCategory) -> Result<u32, InventoryError> {
        let count = self
            .units
            .get_mut(&category)
            .ok_or(InventoryError::UnknownCategory { category })?;
        *count = count
            .checked_sub(1)
            .ok_or(InventoryError::Underflow { category })?;
        Ok(*count)
    }

    /// Returns a previously allocated unit to the pool.
    pub fn release(&mut self, category: UnitCategory) -> Result<u32, InventoryError> {
        let count = self
            .units
            .get_mut(&category)
            .ok_or(InventoryError::UnknownCategory { category })?;
        *count = count.saturating_add(1);
        Ok(*count)
    }

    /// Administrative override of a category's remaining count.
    pub fn set(&mut self, category: UnitCategory, count: u32) -> Result<(), InventoryError> {
        let slot = self
            .units
            .get_mut(&category)
            .ok_or(InventoryError::UnknownCategory { category })?;
        *slot = count;
        Ok(())
    }

    pub fn snapshot(&self) -> &BTreeMap<UnitCategory, u32> {
        &self.units
    }
}
