//! # World Module
//!
//! The Grid & Chunk Store. Integer world coordinates are split into a chunk
//! coordinate and an in-chunk offset; each chunk holds a fixed square of optional
//! tiles. A missing tile is a wall or void, which is a different state from a tile
//! that simply has not been revealed yet.

use crate::config::CHUNK_SIZE;
use crate::{DelveError, DelveResult, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Integer address of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World position of the chunk's in-chunk (0, 0) tile.
    pub fn origin(self) -> Position {
        Position::new(self.x * CHUNK_SIZE, self.y * CHUNK_SIZE)
    }

    /// Translates an in-chunk offset into a world position.
    pub fn to_world(self, local_x: i32, local_y: i32) -> Position {
        let origin = self.origin();
        Position::new(origin.x + local_x, origin.y + local_y)
    }

    /// The chunk that lies one step away in the given cardinal offset.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Cosmetic image of a tile. Only the cracked variants matter to game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileImage {
    /// Plain floor, numbered variant
    Floor(u8),
    /// Cracked floor, numbered variant
    Cracked(u8),
}

impl TileImage {
    /// Whether this is one of the cracked-floor variants.
    pub fn is_cracked(self) -> bool {
        matches!(self, TileImage::Cracked(_))
    }
}

/// A single walkable tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub image: TileImage,
    pub visible: bool,
}

impl Tile {
    /// Creates a tile with the given image and visibility.
    pub fn new(image: TileImage, visible: bool) -> Self {
        Self { image, visible }
    }

    /// Plain hidden floor tile.
    pub fn floor() -> Self {
        Self::new(TileImage::Floor(1), false)
    }
}

/// Fixed-size square block of tiles.
///
/// In-chunk coordinates `0..CHUNK_USABLE` are ordinary room space; the last row
/// and column are reserved for doors leading into the right and lower neighbours.
#[derive(Debug, Clone)]
pub struct Chunk {
    coord: ChunkCoord,
    tiles: Vec<Option<Tile>>,
}

impl Chunk {
    /// Creates an empty chunk: every tile is absent.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            tiles: vec![None; (CHUNK_SIZE * CHUNK_SIZE) as usize],
        }
    }

    /// The chunk's address.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    fn index(local_x: i32, local_y: i32) -> Option<usize> {
        if (0..CHUNK_SIZE).contains(&local_x) && (0..CHUNK_SIZE).contains(&local_y) {
            Some((local_y * CHUNK_SIZE + local_x) as usize)
        } else {
            None
        }
    }

    /// Tile at an in-chunk offset.
    pub fn get(&self, local_x: i32, local_y: i32) -> Option<&Tile> {
        let i = Self::index(local_x, local_y)?;
        self.tiles[i].as_ref()
    }

    /// Mutable tile at an in-chunk offset.
    pub fn get_mut(&mut self, local_x: i32, local_y: i32) -> Option<&mut Tile> {
        let i = Self::index(local_x, local_y)?;
        self.tiles[i].as_mut()
    }

    /// Places (or replaces) a tile. Offsets outside the chunk are ignored.
    pub fn place(&mut self, local_x: i32, local_y: i32, tile: Tile) {
        if let Some(i) = Self::index(local_x, local_y) {
            self.tiles[i] = Some(tile);
        }
    }

    /// Removes a tile, turning the cell into wall.
    pub fn clear(&mut self, local_x: i32, local_y: i32) {
        if let Some(i) = Self::index(local_x, local_y) {
            self.tiles[i] = None;
        }
    }

    /// Number of tiles present.
    pub fn tile_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_some()).count()
    }

    /// Iterates over present tiles as `(world position, tile)`.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.tiles.iter().enumerate().filter_map(move |(i, tile)| {
            let i = i as i32;
            tile.as_ref()
                .map(|tile| (self.coord.to_world(i % CHUNK_SIZE, i / CHUNK_SIZE), tile))
        })
    }
}

/// Splits a world coordinate into `(in_chunk_x, in_chunk_y, chunk)`.
///
/// Uses Euclidean division so negative coordinates land in negative chunks.
///
/// # Examples
///
/// ```
/// use delve::{translate_chunk_coords, ChunkCoord, Position};
///
/// assert_eq!(translate_chunk_coords(Position::new(27, 3)), (1, 3, ChunkCoord::new(1, 0)));
/// assert_eq!(translate_chunk_coords(Position::new(-1, 0)), (25, 0, ChunkCoord::new(-1, 0)));
/// ```
pub fn translate_chunk_coords(pos: Position) -> (i32, i32, ChunkCoord) {
    (
        pos.x.rem_euclid(CHUNK_SIZE),
        pos.y.rem_euclid(CHUNK_SIZE),
        ChunkCoord::new(pos.x.div_euclid(CHUNK_SIZE), pos.y.div_euclid(CHUNK_SIZE)),
    )
}

/// World coordinate of a chunk's top-left tile.
pub fn chunk_origin(chunk: ChunkCoord) -> Position {
    chunk.origin()
}

/// The chunk store. Owns every materialized chunk of the current floor.
#[derive(Debug, Clone, Default)]
pub struct World {
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl World {
    /// Creates an empty world with no chunks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the chunk has been materialized.
    pub fn chunk_exists(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Materializes an empty chunk. Chunks are created once and never replaced.
    pub fn insert_chunk(&mut self, coord: ChunkCoord) -> DelveResult<&mut Chunk> {
        if self.chunks.contains_key(&coord) {
            return Err(DelveError::GenerationFailed(format!(
                "chunk ({}, {}) already exists",
                coord.x, coord.y
            )));
        }
        Ok(self.chunks.entry(coord).or_insert_with(|| Chunk::new(coord)))
    }

    /// Looks up a chunk.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Number of materialized chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Coordinates of all materialized chunks, sorted.
    pub fn chunk_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort();
        coords
    }

    /// Tile at a world position, if its chunk exists and the tile is present.
    pub fn tile_at(&self, pos: Position) -> Option<&Tile> {
        let (local_x, local_y, coord) = translate_chunk_coords(pos);
        self.chunks.get(&coord)?.get(local_x, local_y)
    }

    /// Mutable tile at a world position.
    pub fn tile_at_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        let (local_x, local_y, coord) = translate_chunk_coords(pos);
        self.chunks.get_mut(&coord)?.get_mut(local_x, local_y)
    }

    /// Whether a tile exists at a world position.
    pub fn has_tile(&self, pos: Position) -> bool {
        self.tile_at(pos).is_some()
    }

    /// Whether a tile exists and is visible.
    pub fn is_visible(&self, pos: Position) -> bool {
        self.tile_at(pos).map(|tile| tile.visible).unwrap_or(false)
    }

    /// Places a tile at a world position. Fails if the chunk is not materialized.
    pub fn place_tile(&mut self, pos: Position, tile: Tile) -> DelveResult<()> {
        let (local_x, local_y, coord) = translate_chunk_coords(pos);
        let chunk = self.chunks.get_mut(&coord).ok_or_else(|| {
            DelveError::InvalidState(format!(
                "cannot place tile at ({}, {}): chunk ({}, {}) not generated",
                pos.x, pos.y, coord.x, coord.y
            ))
        })?;
        chunk.place(local_x, local_y, tile);
        Ok(())
    }

    /// Removes the tile at a world position. Missing chunks are ignored.
    pub fn clear_tile(&mut self, pos: Position) {
        let (local_x, local_y, coord) = translate_chunk_coords(pos);
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.clear(local_x, local_y);
        }
    }

    /// Marks a tile visible. Returns true if it was hidden before.
    pub fn reveal_tile(&mut self, pos: Position) -> bool {
        match self.tile_at_mut(pos) {
            Some(tile) if !tile.visible => {
                tile.visible = true;
                true
            }
            _ => false,
        }
    }

    /// Total number of tiles across all chunks.
    pub fn tile_count(&self) -> usize {
        self.chunks.values().map(Chunk::tile_count).sum()
    }

    /// Number of visible tiles across all chunks.
    pub fn visible_tile_count(&self) -> usize {
        self.chunks
            .values()
            .flat_map(|chunk| chunk.iter_tiles())
            .filter(|(_, tile)| tile.visible)
            .count()
    }

    /// Iterates over all tiles in the world in no particular order.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.chunks.values().flat_map(|chunk| chunk.iter_tiles())
    }
}
