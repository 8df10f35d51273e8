//! # Delve
//!
//! Simulation core of a grid-based, turn-driven dungeon explorer.
//!
//! ## Architecture Overview
//!
//! The crate is split into a handful of cooperating systems, all driven from a
//! single-threaded tick loop:
//!
//! - **Grid & Chunk Store**: integer tile coordinates mapped onto lazily generated chunks
//! - **Entity Registry**: creatures, bustables, doors and pickups with a position index
//! - **Generation System**: floor plans (chunk graph + doors) and per-chunk room layouts
//! - **Pathfinding Grid**: a player-centred cost window serving A* queries
//! - **Reveal Engine**: flood fill that exposes rooms and streams in new chunks
//! - **Turn Controller**: move queue, instant logic and a fixed-length animation clock
//!
//! Rendering, audio and window management live outside this crate. The render
//! collaborator reads a [`RenderSnapshot`] and applies the camera-shake offset.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

use serde::{Deserialize, Serialize};

/// Core error type for the Delve simulation core.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Simulation state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// No entity with this id is registered
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation constants.
pub mod config {
    /// Side length of a chunk, including the reserved door row/column
    pub const CHUNK_SIZE: i32 = 26;

    /// Usable side length of a chunk (the last row/column holds inter-chunk doors)
    pub const CHUNK_USABLE: i32 = CHUNK_SIZE - 1;

    /// Pixels per tile, used for visual interpolation
    pub const GRID_WIDTH: i32 = 14;

    /// Width of the pathfinding window in tiles
    pub const PATHFINDING_WIDTH: usize = 70;

    /// Height of the pathfinding window in tiles
    pub const PATHFINDING_HEIGHT: usize = 70;

    /// Player drift from the window centre tolerated before a rebuild
    pub const PATHFINDING_CENTER_DEADZONE: i32 = 20;

    /// Length of one move animation in milliseconds
    pub const ANIMATION_LENGTH_MS: u32 = 112;

    /// Maximum number of buffered player moves
    pub const MAX_QUEUED_MOVES: usize = 2;

    /// Hard cap on flood-fill passes in a single reveal
    pub const REVEAL_PASS_LIMIT: u32 = 200;

    /// Chebyshev distance beyond which creatures fall asleep
    pub const SLEEP_DISTANCE: i32 = 12;

    /// Pixel offset of a bump animation
    pub const BUMP_OFFSET: i32 = 5;

    /// Starting hit points of the player
    pub const DEFAULT_PLAYER_HEALTH: i32 = 8;
}

/// Debug switches owned by the turn controller.
///
/// These replace ambient global flags; they are only changed through
/// [`GameState::toggle_reveal_generated`] and [`GameState::toggle_show_fps`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugToggles {
    /// Newly generated tiles start visible
    pub reveal_generated: bool,
    /// Report frame timing to the render collaborator
    pub show_fps: bool,
}

/// Explicit configuration for one simulation instance.
///
/// # Examples
///
/// ```
/// use delve::SimulationConfig;
///
/// let config = SimulationConfig::new(7);
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.max_queued_moves, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for generation and AI
    pub seed: u64,
    /// Length of one move animation in milliseconds
    pub animation_length_ms: u32,
    /// Maximum number of buffered player moves
    pub max_queued_moves: usize,
    /// Pathfinding window width
    pub pathfinding_width: usize,
    /// Pathfinding window height
    pub pathfinding_height: usize,
    /// Chebyshev drift tolerated before the pathfinding window is rebuilt
    pub pathfinding_deadzone: i32,
    /// Creatures farther than this from the player sleep
    pub sleep_distance: i32,
    /// Flood-fill pass cap for reveals
    pub reveal_pass_limit: u32,
    /// Starting hit points of the player
    pub player_health: i32,
    /// Procedural generation settings
    pub generation: GenerationConfig,
    /// Initial debug switches
    pub debug: DebugToggles,
}

impl SimulationConfig {
    /// Creates the default configuration with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            animation_length_ms: config::ANIMATION_LENGTH_MS,
            max_queued_moves: config::MAX_QUEUED_MOVES,
            pathfinding_width: config::PATHFINDING_WIDTH,
            pathfinding_height: config::PATHFINDING_HEIGHT,
            pathfinding_deadzone: config::PATHFINDING_CENTER_DEADZONE,
            sleep_distance: config::SLEEP_DISTANCE,
            reveal_pass_limit: config::REVEAL_PASS_LIMIT,
            player_health: config::DEFAULT_PLAYER_HEALTH,
            generation: GenerationConfig::new(seed),
            debug: DebugToggles::default(),
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        serde_json::from_str(json).map_err(DelveError::from)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> DelveResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> DelveResult<String> {
        serde_json::to_string_pretty(self).map_err(DelveError::from)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}
