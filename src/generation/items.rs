//! # Items and Loot
//!
//! Item metadata, weighted loot tables rolled when something dies, and the
//! stacking inventory that pickups are collected into.

use crate::{DelveError, DelveResult};
use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How an item is used once collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Equip,
    Consumable,
}

/// Static description of an item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub stackable: bool,
    pub usage: UsageKind,
    pub icon: String,
}

impl Default for ItemMetadata {
    fn default() -> Self {
        Self {
            stackable: false,
            usage: UsageKind::Consumable,
            icon: "no_img".to_string(),
        }
    }
}

/// A quantity of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub quantity: u32,
}

impl ItemStack {
    /// Creates a stack.
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }
}

/// Item metadata keyed by item id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: HashMap<String, ItemMetadata>,
}

impl ItemCatalog {
    /// Parses item metadata from JSON.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        serde_json::from_str(json).map_err(DelveError::from)
    }

    /// Metadata for an item; unknown ids get a non-stacking default.
    pub fn metadata(&self, item: &str) -> ItemMetadata {
        match self.items.get(item) {
            Some(metadata) => metadata.clone(),
            None => {
                warn!("unknown item '{}', using default metadata", item);
                ItemMetadata::default()
            }
        }
    }

    /// Icon name used by the render collaborator for a stack.
    pub fn icon_for(&self, stack: &ItemStack) -> String {
        let icon = self.metadata(&stack.item).icon;
        if stack.quantity > 1 {
            format!("{}_pile", icon)
        } else {
            icon
        }
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        let mut items = HashMap::new();
        items.insert(
            "moni".to_string(),
            ItemMetadata {
                stackable: true,
                usage: UsageKind::Consumable,
                icon: "moni".to_string(),
            },
        );
        items.insert(
            "potion".to_string(),
            ItemMetadata {
                stackable: true,
                usage: UsageKind::Consumable,
                icon: "potion".to_string(),
            },
        );
        items.insert(
            "sword".to_string(),
            ItemMetadata {
                stackable: false,
                usage: UsageKind::Equip,
                icon: "sword".to_string(),
            },
        );
        Self { items }
    }
}

/// One weighted outcome of a loot roll. `item: None` means nothing drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub weight: u32,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default = "one")]
    pub min_quantity: u32,
    #[serde(default = "one")]
    pub max_quantity: u32,
}

fn one() -> u32 {
    1
}

impl LootEntry {
    fn stack(weight: u32, item: &str, min_quantity: u32, max_quantity: u32) -> Self {
        Self {
            weight,
            item: Some(item.to_string()),
            min_quantity,
            max_quantity,
        }
    }

    fn nothing(weight: u32) -> Self {
        Self {
            weight,
            item: None,
            min_quantity: 0,
            max_quantity: 0,
        }
    }
}

/// A weighted set of outcomes, rolled once per listed roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootTable {
    pub entries: Vec<LootEntry>,
    #[serde(default = "one")]
    pub rolls: u32,
}

impl LootTable {
    /// Creates a single-roll table.
    pub fn new(entries: Vec<LootEntry>) -> Self {
        Self { entries, rolls: 1 }
    }

    /// Rolls the table, returning every stack that dropped.
    pub fn roll(&self, rng: &mut StdRng) -> Vec<ItemStack> {
        let weights: Vec<u32> = self.entries.iter().map(|entry| entry.weight).collect();
        let Ok(distribution) = WeightedIndex::new(&weights) else {
            return Vec::new();
        };

        let mut drops = Vec::new();
        for _ in 0..self.rolls {
            let entry = &self.entries[distribution.sample(rng)];
            if let Some(item) = &entry.item {
                let low = entry.min_quantity.max(1);
                let high = entry.max_quantity.max(low);
                drops.push(ItemStack::new(item.clone(), rng.gen_range(low..=high)));
            }
        }
        drops
    }
}

/// Loot tables keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootBook {
    pub tables: HashMap<String, LootTable>,
}

impl LootBook {
    /// Parses loot tables from JSON.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        serde_json::from_str(json).map_err(DelveError::from)
    }

    /// Rolls a named table. Unknown tables drop nothing.
    pub fn roll(&self, table: &str, rng: &mut StdRng) -> Vec<ItemStack> {
        match self.tables.get(table) {
            Some(loot) => loot.roll(rng),
            None => {
                warn!("unknown loot table '{}', dropping nothing", table);
                Vec::new()
            }
        }
    }
}

impl Default for LootBook {
    fn default() -> Self {
        let mut tables = HashMap::new();
        tables.insert(
            "goon".to_string(),
            LootTable::new(vec![LootEntry::stack(1, "moni", 1, 1)]),
        );
        tables.insert(
            "big_cubeo".to_string(),
            LootTable::new(vec![LootEntry::stack(1, "moni", 2, 3)]),
        );
        tables.insert(
            "eyepod".to_string(),
            LootTable::new(vec![LootEntry::stack(1, "moni", 5, 5)]),
        );
        tables.insert(
            "pot".to_string(),
            LootTable::new(vec![
                LootEntry::stack(3, "moni", 1, 1),
                LootEntry::stack(1, "potion", 1, 1),
                LootEntry::nothing(2),
            ]),
        );
        tables.insert(
            "chest".to_string(),
            LootTable {
                entries: vec![
                    LootEntry::stack(3, "moni", 3, 6),
                    LootEntry::stack(1, "sword", 1, 1),
                ],
                rolls: 2,
            },
        );
        Self { tables }
    }
}

/// The player's collected items.
///
/// Stackable items merge into a single slot per id; anything else takes a slot
/// of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<ItemStack>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stack, merging with an existing slot if the item stacks.
    pub fn add(&mut self, stack: ItemStack, catalog: &ItemCatalog) {
        if stack.quantity == 0 {
            return;
        }
        if catalog.metadata(&stack.item).stackable {
            if let Some(slot) = self.slots.iter_mut().find(|slot| slot.item == stack.item) {
                slot.quantity += stack.quantity;
                return;
            }
            self.slots.push(stack);
        } else {
            for _ in 0..stack.quantity {
                self.slots.push(ItemStack::new(stack.item.clone(), 1));
            }
        }
    }

    /// Total quantity held of an item.
    pub fn quantity_of(&self, item: &str) -> u32 {
        self.slots
            .iter()
            .filter(|slot| slot.item == item)
            .map(|slot| slot.quantity)
            .sum()
    }

    /// All occupied slots in pickup order.
    pub fn slots(&self) -> &[ItemStack] {
        &self.slots
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
