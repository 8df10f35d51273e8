//! # Creature and Bustable Templates
//!
//! Typed stat records keyed by subtype. Entities copy the fields they need out of
//! a template when they are constructed; nothing is attached to an entity at
//! runtime by name.

use crate::{DelveError, DelveResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subtype used when a creature subtype is missing from the table.
pub const FALLBACK_CREATURE: &str = "goon";

/// Subtype used when a bustable subtype is missing from the table.
pub const FALLBACK_BUSTABLE: &str = "pot";

/// Subtype of the player character.
pub const PLAYER_SUBTYPE: &str = "dude";

/// How a creature picks its next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    /// Follow an A* path toward the player
    Chase,
    /// Greedy step that shrinks the larger axis gap to the player
    Naive,
    /// Uniform choice among open neighbouring cells
    Random,
}

/// Stats and behaviour for one creature subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub hp: i32,
    pub attack: i32,
    pub movement: MovementPattern,
    /// Whether the creature may step diagonally
    #[serde(default)]
    pub diagonal: bool,
    /// Time advances skipped between moves
    #[serde(default)]
    pub cooldown: u32,
    /// Whether the creature may attack other creatures
    #[serde(default)]
    pub friendly_fire: bool,
    /// Pathfinding strength used by chase queries
    #[serde(default)]
    pub path_strength: u8,
    /// Loot table rolled on death
    #[serde(default)]
    pub loot: Option<String>,
}

impl CreatureTemplate {
    fn new(hp: i32, attack: i32, movement: MovementPattern) -> Self {
        Self {
            hp,
            attack,
            movement,
            diagonal: false,
            cooldown: 0,
            friendly_fire: false,
            path_strength: 0,
            loot: None,
        }
    }

    fn diagonal(mut self) -> Self {
        self.diagonal = true;
        self
    }

    fn cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    fn strength(mut self, strength: u8) -> Self {
        self.path_strength = strength;
        self
    }

    fn loot(mut self, table: &str) -> Self {
        self.loot = Some(table.to_string());
        self
    }
}

/// Stats for one breakable object subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BustableTemplate {
    pub hp: i32,
    #[serde(default)]
    pub loot: Option<String>,
}

/// Lookup table of every creature and bustable template.
///
/// # Examples
///
/// ```
/// use delve::{MovementPattern, TemplateBook};
///
/// let book = TemplateBook::default();
/// let (subtype, goon) = book.creature("goon");
/// assert_eq!(subtype, "goon");
/// assert_eq!(goon.movement, MovementPattern::Naive);
///
/// // Unknown subtypes fall back to a goon instead of failing.
/// let (subtype, _) = book.creature("dragon");
/// assert_eq!(subtype, "goon");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateBook {
    pub creatures: HashMap<String, CreatureTemplate>,
    pub bustables: HashMap<String, BustableTemplate>,
}

impl TemplateBook {
    /// Parses a template book from JSON.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        let book: Self = serde_json::from_str(json)?;
        book.validate()?;
        Ok(book)
    }

    /// Checks that the fallback subtypes exist.
    pub fn validate(&self) -> DelveResult<()> {
        if !self.creatures.contains_key(FALLBACK_CREATURE) {
            return Err(DelveError::InvalidState(format!(
                "template book has no '{}' creature to fall back on",
                FALLBACK_CREATURE
            )));
        }
        if !self.bustables.contains_key(FALLBACK_BUSTABLE) {
            return Err(DelveError::InvalidState(format!(
                "template book has no '{}' bustable to fall back on",
                FALLBACK_BUSTABLE
            )));
        }
        Ok(())
    }

    /// Resolves a creature subtype, falling back to the default creature.
    ///
    /// Returns the subtype that was actually used alongside its template.
    pub fn creature<'a>(&'a self, subtype: &'a str) -> (&'a str, &'a CreatureTemplate) {
        if let Some(template) = self.creatures.get(subtype) {
            return (subtype, template);
        }
        warn!(
            "unknown creature subtype '{}', using '{}'",
            subtype, FALLBACK_CREATURE
        );
        match self.creatures.get(FALLBACK_CREATURE) {
            Some(template) => (FALLBACK_CREATURE, template),
            None => (FALLBACK_CREATURE, &BUILTIN_GOON),
        }
    }

    /// Resolves a bustable subtype, falling back to the default bustable.
    pub fn bustable<'a>(&'a self, subtype: &'a str) -> (&'a str, &'a BustableTemplate) {
        if let Some(template) = self.bustables.get(subtype) {
            return (subtype, template);
        }
        warn!(
            "unknown bustable subtype '{}', using '{}'",
            subtype, FALLBACK_BUSTABLE
        );
        match self.bustables.get(FALLBACK_BUSTABLE) {
            Some(template) => (FALLBACK_BUSTABLE, template),
            None => (FALLBACK_BUSTABLE, &BUILTIN_POT),
        }
    }
}

// Used only if a caller mutates the public maps and drops a fallback entry.
static BUILTIN_GOON: CreatureTemplate = CreatureTemplate {
    hp: 1,
    attack: 1,
    movement: MovementPattern::Naive,
    diagonal: false,
    cooldown: 1,
    friendly_fire: false,
    path_strength: 0,
    loot: None,
};

static BUILTIN_POT: BustableTemplate = BustableTemplate { hp: 1, loot: None };

impl Default for TemplateBook {
    fn default() -> Self {
        let mut creatures = HashMap::new();
        creatures.insert(
            PLAYER_SUBTYPE.to_string(),
            CreatureTemplate::new(8, 1, MovementPattern::Naive),
        );
        creatures.insert(
            "goon".to_string(),
            CreatureTemplate::new(1, 1, MovementPattern::Naive)
                .cooldown(1)
                .loot("goon"),
        );
        creatures.insert(
            "cubeo".to_string(),
            CreatureTemplate::new(2, 1, MovementPattern::Random).diagonal(),
        );
        creatures.insert(
            "big_cubeo".to_string(),
            CreatureTemplate::new(4, 2, MovementPattern::Chase)
                .cooldown(1)
                .strength(3)
                .loot("big_cubeo"),
        );
        creatures.insert(
            "eyepod".to_string(),
            CreatureTemplate::new(4, 7, MovementPattern::Chase)
                .diagonal()
                .cooldown(2)
                .loot("eyepod"),
        );

        let mut bustables = HashMap::new();
        bustables.insert(
            "pot".to_string(),
            BustableTemplate {
                hp: 1,
                loot: Some("pot".to_string()),
            },
        );
        bustables.insert(
            "chest".to_string(),
            BustableTemplate {
                hp: 3,
                loot: Some("chest".to_string()),
            },
        );

        Self {
            creatures,
            bustables,
        }
    }
}
