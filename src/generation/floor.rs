//! # Floor Planning
//!
//! A floor plan fixes the chunk graph, per-chunk properties, every inter-chunk
//! door and the spawn point before any tile exists. Chunks are materialized
//! from it later, in whatever order the player reaches them.

use super::{GenerationConfig, Generator};
use crate::config::{CHUNK_SIZE, CHUNK_USABLE};
use crate::{translate_chunk_coords, ChunkCoord, DelveError, DelveResult, Position};
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Structural style of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkShape {
    /// Plain recursive splitting
    Classic,
    /// Splitting capped at a shallow depth, leaving large rooms
    HugeRooms,
    /// A walkway ring around a walled interior
    OuterLoop,
}

/// Colour and material variant of a chunk. Cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Palette {
    Slate,
    Moss,
    Ember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkProperties {
    pub shape: ChunkShape,
    pub palette: Palette,
}

/// The shared edge a door sits on, seen from the chunk that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    Right,
    Down,
}

impl Edge {
    /// World position of a door on this edge of `chunk` at `offset` along it.
    ///
    /// Doors sit in the owning chunk's reserved last column or row.
    pub fn door_position(self, chunk: ChunkCoord, offset: i32) -> Position {
        match self {
            Edge::Right => chunk.to_world(CHUNK_USABLE, offset),
            Edge::Down => chunk.to_world(offset, CHUNK_USABLE),
        }
    }
}

/// Immutable plan for one dungeon floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorPlan {
    chunks: BTreeSet<ChunkCoord>,
    properties: BTreeMap<ChunkCoord, ChunkProperties>,
    doors: BTreeMap<(ChunkCoord, Edge), i32>,
    start_chunk: ChunkCoord,
    spawn_offset: Position,
}

impl FloorPlan {
    /// A one-chunk plan with no doors. Useful for tests and demos.
    pub fn single(properties: ChunkProperties, spawn_offset: Position) -> Self {
        let start = ChunkCoord::new(0, 0);
        Self {
            chunks: BTreeSet::from([start]),
            properties: BTreeMap::from([(start, properties)]),
            doors: BTreeMap::new(),
            start_chunk: start,
            spawn_offset,
        }
    }

    /// Whether the chunk belongs to this floor.
    pub fn is_planned(&self, chunk: ChunkCoord) -> bool {
        self.chunks.contains(&chunk)
    }

    /// All planned chunks, sorted.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.iter().copied()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn properties(&self, chunk: ChunkCoord) -> Option<ChunkProperties> {
        self.properties.get(&chunk).copied()
    }

    /// Door offset along the given edge of a chunk, if one is planned.
    pub fn door_offset(&self, chunk: ChunkCoord, edge: Edge) -> Option<i32> {
        self.doors.get(&(chunk, edge)).copied()
    }

    /// Every planned door as `(owner, edge, offset)`.
    pub fn doors(&self) -> impl Iterator<Item = (ChunkCoord, Edge, i32)> + '_ {
        self.doors
            .iter()
            .map(|((chunk, edge), offset)| (*chunk, *edge, *offset))
    }

    /// World positions of every planned inter-chunk door.
    pub fn door_positions(&self) -> Vec<Position> {
        self.doors()
            .map(|(chunk, edge, offset)| edge.door_position(chunk, offset))
            .collect()
    }

    /// Whether a planned inter-chunk door sits on this world tile.
    pub fn door_at(&self, pos: Position) -> bool {
        let (local_x, local_y, chunk) = translate_chunk_coords(pos);
        if local_x == CHUNK_USABLE && local_y < CHUNK_USABLE {
            return self.door_offset(chunk, Edge::Right) == Some(local_y);
        }
        if local_y == CHUNK_USABLE && local_x < CHUNK_USABLE {
            return self.door_offset(chunk, Edge::Down) == Some(local_x);
        }
        false
    }

    pub fn start_chunk(&self) -> ChunkCoord {
        self.start_chunk
    }

    /// In-chunk offset of the planned spawn tile.
    pub fn spawn_offset(&self) -> Position {
        self.spawn_offset
    }

    /// World position of the planned spawn tile.
    pub fn spawn_position(&self) -> Position {
        self.start_chunk
            .to_world(self.spawn_offset.x, self.spawn_offset.y)
    }
}

/// Plans floors with random walks over the chunk grid.
///
/// # Examples
///
/// ```
/// use delve::generation::utils::create_rng;
/// use delve::{FloorGenerator, GenerationConfig, Generator};
///
/// let config = GenerationConfig::new(3);
/// let mut rng = create_rng(&config);
/// let plan = FloorGenerator.generate(&config, &mut rng).unwrap();
/// assert_eq!(plan.chunk_count(), 8);
/// assert!(plan.is_planned(plan.start_chunk()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FloorGenerator;

const WALK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl FloorGenerator {
    fn walk(config: &GenerationConfig, rng: &mut StdRng) -> BTreeSet<ChunkCoord> {
        let mut chunks = BTreeSet::new();
        for _ in 0..config.worms {
            let mut current = ChunkCoord::new(0, 0);
            let mut added = 0;
            while added < config.chunks_per_worm {
                if chunks.insert(current) {
                    added += 1;
                }
                let (dx, dy) = WALK_DIRECTIONS[rng.gen_range(0..WALK_DIRECTIONS.len())];
                current = current.offset(dx, dy);
            }
        }
        chunks
    }

    fn pick_properties(
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<ChunkProperties> {
        let shapes = [
            (ChunkShape::Classic, config.shape_weights.classic),
            (ChunkShape::HugeRooms, config.shape_weights.huge_rooms),
            (ChunkShape::OuterLoop, config.shape_weights.outer_loop),
        ];
        let palettes = [
            (Palette::Slate, config.palette_weights.slate),
            (Palette::Moss, config.palette_weights.moss),
            (Palette::Ember, config.palette_weights.ember),
        ];
        let shape_index = WeightedIndex::new(shapes.iter().map(|(_, weight)| *weight))
            .map_err(|e| DelveError::GenerationFailed(format!("bad shape weights: {}", e)))?;
        let palette_index = WeightedIndex::new(palettes.iter().map(|(_, weight)| *weight))
            .map_err(|e| DelveError::GenerationFailed(format!("bad palette weights: {}", e)))?;
        Ok(ChunkProperties {
            shape: shapes[shape_index.sample(rng)].0,
            palette: palettes[palette_index.sample(rng)].0,
        })
    }
}

impl Generator<FloorPlan> for FloorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<FloorPlan> {
        let chunks = Self::walk(config, rng);

        let mut properties = BTreeMap::new();
        for chunk in &chunks {
            properties.insert(*chunk, Self::pick_properties(config, rng)?);
        }

        let mut doors = BTreeMap::new();
        for chunk in &chunks {
            if chunks.contains(&chunk.offset(1, 0)) {
                doors.insert((*chunk, Edge::Right), rng.gen_range(1..=CHUNK_SIZE - 3));
            }
            if chunks.contains(&chunk.offset(0, 1)) {
                doors.insert((*chunk, Edge::Down), rng.gen_range(1..=CHUNK_SIZE - 3));
            }
        }

        let ordered: Vec<ChunkCoord> = chunks.iter().copied().collect();
        let start_chunk = *ordered
            .choose(rng)
            .ok_or_else(|| DelveError::GenerationFailed("floor plan has no chunks".to_string()))?;

        let spawn_offset = match properties.get(&start_chunk).map(|p| p.shape) {
            // The ring walkway always covers column 1.
            Some(ChunkShape::OuterLoop) => Position::new(1, rng.gen_range(1..=CHUNK_USABLE - 2)),
            _ => Position::new(
                rng.gen_range(0..CHUNK_USABLE),
                rng.gen_range(0..CHUNK_USABLE),
            ),
        };

        let plan = FloorPlan {
            chunks,
            properties,
            doors,
            start_chunk,
            spawn_offset,
        };
        self.validate(&plan, config)?;

        debug!(
            "planned floor: {} chunks, {} doors, start ({}, {})",
            plan.chunk_count(),
            plan.doors.len(),
            start_chunk.x,
            start_chunk.y
        );
        Ok(plan)
    }

    fn validate(&self, plan: &FloorPlan, _config: &GenerationConfig) -> DelveResult<()> {
        if plan.chunks.is_empty() {
            return Err(DelveError::GenerationFailed(
                "floor plan has no chunks".to_string(),
            ));
        }
        if !plan.is_planned(plan.start_chunk) {
            return Err(DelveError::GenerationFailed(format!(
                "start chunk ({}, {}) is not part of the floor",
                plan.start_chunk.x, plan.start_chunk.y
            )));
        }
        for (chunk, edge, offset) in plan.doors() {
            if !(1..=CHUNK_SIZE - 3).contains(&offset) {
                return Err(DelveError::GenerationFailed(format!(
                    "door offset {} out of range on chunk ({}, {})",
                    offset, chunk.x, chunk.y
                )));
            }
            let neighbour = match edge {
                Edge::Right => chunk.offset(1, 0),
                Edge::Down => chunk.offset(0, 1),
            };
            if !plan.is_planned(chunk) || !plan.is_planned(neighbour) {
                return Err(DelveError::GenerationFailed(format!(
                    "door on chunk ({}, {}) leads outside the floor",
                    chunk.x, chunk.y
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "floor"
    }
}

/// Plans a floor and checks the plan before handing it out.
pub fn generate_floor(config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<FloorPlan> {
    let generator = FloorGenerator;
    let plan = generator.generate(config, rng)?;
    generator.validate(&plan, config)?;
    Ok(plan)
}
