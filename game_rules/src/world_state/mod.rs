//! Game state - the single mutable record the rule pipeline operates on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Flag raised the first time hit points reach zero. Never cleared automatically.
pub const HP_ZERO_FLAG: &str = "hp_zero";

/// Ways a state loaded from outside the engine can break its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("inventory holds {count} items but the limit is {limit}")]
    InventoryOverLimit { count: usize, limit: usize },

    #[error("inventory lists '{0}' more than once")]
    DuplicateItem(String),

    #[error("hp {hp} exceeds max_hp {max_hp}")]
    HpAboveMax { hp: u32, max_hp: u32 },
}

/// The complete mechanical state of one adventure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub location: String,

    /// Carried items in pickup order, never duplicated.
    #[serde(default)]
    pub inventory: Vec<String>,

    pub hp: u32,

    /// Optional ceiling for `hp`. `None` means healing is unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<u32>,

    #[serde(default)]
    pub flags: BTreeMap<String, bool>,

    #[serde(default)]
    pub turns: u32,
}

impl GameState {
    /// Create a fresh state at the given location.
    pub fn new(location: impl Into<String>, hp: u32) -> Self {
        Self {
            location: location.into(),
            inventory: Vec::new(),
            hp,
            max_hp: None,
            flags: BTreeMap::new(),
            turns: 0,
        }
    }

    /// Whether a flag is set to true. Absent flags read as false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Names of all flags currently true, in sorted order.
    pub fn active_flags(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|(_, value)| **value)
            .map(|(name, _)| name.as_str())
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    /// Check the invariants a state must hold before the engine accepts it.
    pub fn check_invariants(&self, inventory_limit: usize) -> Result<(), StateViolation> {
        if self.inventory.len() > inventory_limit {
            return Err(StateViolation::InventoryOverLimit {
                count: self.inventory.len(),
                limit: inventory_limit,
            });
        }

        for (index, item) in self.inventory.iter().enumerate() {
            if self.inventory[..index].contains(item) {
                return Err(StateViolation::DuplicateItem(item.clone()));
            }
        }

        if let Some(max_hp) = self.max_hp {
            if self.hp > max_hp {
                return Err(StateViolation::HpAboveMax {
                    hp: self.hp,
                    max_hp,
                });
            }
        }

        Ok(())
    }
}
