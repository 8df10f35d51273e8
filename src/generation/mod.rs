//! # Generation Module
//!
//! Procedural content generation: floor plans, chunk room layouts, room
//! furnishing and the loot and item tables they draw from.
//!
//! A floor is planned in one step ([`FloorGenerator`]) and materialized one
//! chunk at a time ([`generate_chunk`]) as the reveal engine reaches it.

pub mod dungeon;
pub mod encounters;
pub mod floor;
pub mod furnishing;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use floor::*;
pub use furnishing::*;
pub use items::*;

use crate::{DelveResult, Position};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Relative weights of the three chunk shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeWeights {
    pub classic: u32,
    pub huge_rooms: u32,
    pub outer_loop: u32,
}

impl Default for ShapeWeights {
    fn default() -> Self {
        Self {
            classic: 60,
            huge_rooms: 20,
            outer_loop: 20,
        }
    }
}

/// Relative weights of the chunk colour palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteWeights {
    pub slate: u32,
    pub moss: u32,
    pub ember: u32,
}

impl Default for PaletteWeights {
    fn default() -> Self {
        Self {
            slate: 6,
            moss: 3,
            ember: 1,
        }
    }
}

/// Configuration for procedural generation.
///
/// # Examples
///
/// ```
/// use delve::GenerationConfig;
///
/// let config = GenerationConfig::default();
/// assert_eq!(config.worms, 2);
/// assert_eq!(config.chunks_per_worm, 4);
/// assert_eq!(config.split_depth_cap, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of random walks used to plan a floor
    pub worms: u32,
    /// Distinct chunks each walk must add
    pub chunks_per_worm: u32,
    pub shape_weights: ShapeWeights,
    pub palette_weights: PaletteWeights,
    /// Probability that a room-split door is generated closed
    pub closed_door_chance: f64,
    /// Probability that an outer-loop chunk loses its four outer corners
    pub outer_corner_clear_chance: f64,
    /// Probability that a room's first pot becomes a chest
    pub chest_chance: f64,
    /// Probability that a single-enemy room gets the special solo enemy
    pub solo_special_chance: f64,
    /// Split depth cap for huge-room chunks
    pub huge_room_depth_cap: u32,
    /// Split depth cap for every other chunk
    pub split_depth_cap: u32,
}

impl GenerationConfig {
    /// Creates the default generation configuration with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            worms: 2,
            chunks_per_worm: 4,
            shape_weights: ShapeWeights::default(),
            palette_weights: PaletteWeights::default(),
            closed_door_chance: 5.0 / 6.0,
            outer_corner_clear_chance: 0.6,
            chest_chance: 0.1,
            solo_special_chance: 1.0 / 9.0,
            huge_room_depth_cap: 3,
            split_depth_cap: 25,
        }
    }

    /// A single-chunk configuration, handy for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            worms: 1,
            chunks_per_worm: 1,
            ..Self::new(seed)
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// An axis-aligned rectangle of world tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Number of tiles covered.
    pub fn area(&self) -> i32 {
        self.w * self.h
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x && pos.x < self.x + self.w && pos.y >= self.y && pos.y < self.y + self.h
    }

    /// Every tile position, column by column.
    pub fn positions(&self) -> Vec<Position> {
        let mut positions = Vec::with_capacity(self.area().max(0) as usize);
        for x in self.x..self.x + self.w {
            for y in self.y..self.y + self.h {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }
}

/// Trait for procedural generators.
///
/// Generators take the configuration and an explicit random source so that a
/// seed always reproduces the same content.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.huge_room_depth_cap, 3);
        assert!((config.closed_door_chance - 5.0 / 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_generation_config_partial_json() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{ "seed": 3, "worms": 5 }"#).unwrap();
        assert_eq!(config.seed, 3);
        assert_eq!(config.worms, 5);
        assert_eq!(config.chunks_per_worm, 4);
        assert_eq!(config.shape_weights, ShapeWeights::default());
    }

    #[test]
    fn test_rect_geometry() {
        let rect = Rect::new(2, 3, 4, 5);
        assert_eq!(rect.area(), 20);
        assert_eq!(rect.positions().len(), 20);
        assert!(rect.contains(Position::new(5, 7)));
        assert!(!rect.contains(Position::new(6, 7)));
        assert!(!rect.contains(Position::new(2, 8)));
    }

    #[test]
    fn test_utils_rng_creation() {
        let config = GenerationConfig::new(12345);
        let mut rng1 = utils::create_rng(&config);
        let mut rng2 = utils::create_rng(&config);
        let a: u32 = rng1.gen();
        let b: u32 = rng2.gen();
        assert_eq!(a, b);
    }
}
