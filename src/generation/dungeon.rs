//! # Chunk Generation
//!
//! Materializes one planned chunk: lays down floor, places the chunk's own
//! inter-chunk doors, carves its shape and recursively chops the remaining
//! space into rooms before furnishing them.
//!
//! Cuts are validated against world state, not chunk-local arrays, so a cut
//! near a chunk edge sees doors that belong to neighbouring chunks. Doors in
//! neighbours that are planned but not yet generated are answered by the
//! [`FloorPlan`].

use super::furnishing::{furnish_rect, furnish_room};
use super::{ChunkShape, Edge, FloorPlan, GenerationConfig, Rect};
use crate::config::CHUNK_USABLE;
use crate::{
    chunk_origin, ChunkCoord, DelveError, DelveResult, EntityRegistry, Position, TemplateBook,
    Tile, TileImage, World,
};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of plain floor image variants.
pub const FLOOR_VARIANTS: u8 = 2;

/// Extra attempts at a valid cut before a rectangle becomes a leaf room.
pub const CUT_RETRIES: u32 = 4;

/// Rectangles narrower than this on both axes are never cut.
pub const MIN_CUT_SIDE: i32 = 7;

/// Everything chunk generation reads and writes, bundled for the recursive passes.
pub struct ChunkBuilder<'a> {
    pub world: &'a mut World,
    pub entities: &'a mut EntityRegistry,
    pub floor: &'a FloorPlan,
    pub templates: &'a TemplateBook,
    pub config: &'a GenerationConfig,
    pub rng: &'a mut StdRng,
    /// Whether generated tiles and entities start revealed
    pub visible: bool,
}

impl<'a> ChunkBuilder<'a> {
    /// Whether a tile exists here now or a planned inter-chunk door will put one here.
    fn wall_is_open(&self, pos: Position) -> bool {
        self.world.has_tile(pos) || self.floor.door_at(pos)
    }

    fn place_floor(&mut self, pos: Position) -> DelveResult<()> {
        let variant = self.rng.gen_range(1..=FLOOR_VARIANTS);
        self.world
            .place_tile(pos, Tile::new(TileImage::Floor(variant), self.visible))
    }

    /// Places a door on an existing tile; closed with the configured chance,
    /// otherwise the tile is simply left open.
    fn place_cut_door(&mut self, pos: Position) {
        if self.rng.gen_bool(self.config.closed_door_chance.clamp(0.0, 1.0)) {
            self.entities.spawn_door(pos, true, self.visible);
        }
    }
}

/// Materializes a planned chunk into the world and entity registry.
///
/// Fails if the chunk is not part of the floor or has already been generated.
pub fn generate_chunk(builder: &mut ChunkBuilder<'_>, chunk: ChunkCoord) -> DelveResult<()> {
    let properties = builder.floor.properties(chunk).ok_or_else(|| {
        DelveError::GenerationFailed(format!(
            "chunk ({}, {}) is not part of the floor plan",
            chunk.x, chunk.y
        ))
    })?;
    builder.world.insert_chunk(chunk)?;

    for local_x in 0..CHUNK_USABLE {
        for local_y in 0..CHUNK_USABLE {
            builder.place_floor(chunk.to_world(local_x, local_y))?;
        }
    }

    // This chunk owns the doors on its right and bottom edges.
    for edge in [Edge::Right, Edge::Down] {
        if let Some(offset) = builder.floor.door_offset(chunk, edge) {
            let pos = edge.door_position(chunk, offset);
            builder.place_floor(pos)?;
            builder.entities.spawn_door(pos, true, builder.visible);
        }
    }

    let origin = chunk_origin(chunk);
    let full = Rect::new(origin.x, origin.y, CHUNK_USABLE, CHUNK_USABLE);
    let split_cap = builder.config.split_depth_cap;
    let huge_cap = builder.config.huge_room_depth_cap;
    match properties.shape {
        ChunkShape::Classic => recursive_room_chopper(builder, full, 1, split_cap),
        ChunkShape::HugeRooms => recursive_room_chopper(builder, full, 1, huge_cap),
        ChunkShape::OuterLoop => carve_outer_loop(builder, full)?,
    }

    debug!(
        "generated chunk ({}, {}) as {:?}/{:?}",
        chunk.x, chunk.y, properties.shape, properties.palette
    );
    Ok(())
}

/// Probability (percent) that a rectangle of this area is cut again.
pub fn cut_chance(area: i32) -> u32 {
    match area {
        a if a <= 35 => 30,
        a if a <= 50 => 70,
        a if a <= 100 => 92,
        _ => 100,
    }
}

/// A cut through a rectangle: `slice` tiles from the top or left, with one door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cut {
    vertical: bool,
    slice: i32,
    door: i32,
}

impl Cut {
    /// The two tiles just beyond the ends of the cut's wall line.
    fn ends(&self, rect: Rect) -> [Position; 2] {
        if self.vertical {
            let x = rect.x + self.slice;
            [Position::new(x, rect.y - 1), Position::new(x, rect.y + rect.h)]
        } else {
            let y = rect.y + self.slice;
            [Position::new(rect.x - 1, y), Position::new(rect.x + rect.w, y)]
        }
    }

    /// Tile `i` along the cut line.
    fn tile(&self, rect: Rect, i: i32) -> Position {
        if self.vertical {
            Position::new(rect.x + self.slice, rect.y + i)
        } else {
            Position::new(rect.x + i, rect.y + self.slice)
        }
    }

    fn length(&self, rect: Rect) -> i32 {
        if self.vertical {
            rect.h
        } else {
            rect.w
        }
    }

    fn halves(&self, rect: Rect) -> (Rect, Rect) {
        if self.vertical {
            (
                Rect::new(rect.x, rect.y, self.slice, rect.h),
                Rect::new(rect.x + self.slice + 1, rect.y, rect.w - 1 - self.slice, rect.h),
            )
        } else {
            (
                Rect::new(rect.x, rect.y, rect.w, self.slice),
                Rect::new(rect.x, rect.y + self.slice + 1, rect.w, rect.h - 1 - self.slice),
            )
        }
    }
}

fn pick_cut(rect: Rect, rng: &mut StdRng) -> Cut {
    let vertical = match rect.w.cmp(&rect.h) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => rng.gen_bool(0.5),
    };
    let (long, short) = if vertical {
        (rect.w, rect.h)
    } else {
        (rect.h, rect.w)
    };
    Cut {
        vertical,
        slice: 3 + rng.gen_range(0..=long - MIN_CUT_SIDE),
        door: rng.gen_range(0..short),
    }
}

/// Binary space partition of a rectangle into rooms.
///
/// Stops and furnishes the rectangle when `depth` exceeds `depth_cap`, when both
/// sides are shorter than 7, or when the area-banded continue roll fails. A cut
/// whose wall line would end against an existing tile or a planned door is
/// retried; after [`CUT_RETRIES`] further failures the rectangle becomes a leaf.
pub fn recursive_room_chopper(
    builder: &mut ChunkBuilder<'_>,
    rect: Rect,
    depth: u32,
    depth_cap: u32,
) {
    let too_small = rect.w < MIN_CUT_SIDE && rect.h < MIN_CUT_SIDE;
    if depth > depth_cap || too_small {
        furnish_rect(builder, rect);
        return;
    }
    if builder.rng.gen_range(1..=100) > cut_chance(rect.area()) {
        furnish_rect(builder, rect);
        return;
    }

    let mut chosen = None;
    for _ in 0..=CUT_RETRIES {
        let cut = pick_cut(rect, builder.rng);
        if cut.ends(rect).iter().all(|end| !builder.wall_is_open(*end)) {
            chosen = Some(cut);
            break;
        }
        debug!(
            "rejected cut at ({}, {}) {}x{} depth {}",
            rect.x, rect.y, rect.w, rect.h, depth
        );
    }
    let Some(cut) = chosen else {
        furnish_rect(builder, rect);
        return;
    };

    for i in 0..cut.length(rect) {
        let pos = cut.tile(rect, i);
        if i == cut.door {
            builder.place_cut_door(pos);
        } else {
            builder.world.clear_tile(pos);
        }
    }

    let (first, second) = cut.halves(rect);
    recursive_room_chopper(builder, first, depth + 1, depth_cap);
    recursive_room_chopper(builder, second, depth + 1, depth_cap);
}

/// Thickness range of the outer-loop walkway.
pub const RING_THICKNESS: std::ops::RangeInclusive<i32> = 2..=4;

/// Carves the outer-loop shape: a walkway ring, a wall loop with two doors, and
/// an interior that is split like any other rectangle.
fn carve_outer_loop(builder: &mut ChunkBuilder<'_>, full: Rect) -> DelveResult<()> {
    let thickness = builder.rng.gen_range(RING_THICKNESS);
    let last = full.w - 1;
    let inner = Rect::new(
        full.x + thickness + 1,
        full.y + thickness + 1,
        full.w - 2 * (thickness + 1),
        full.h - 2 * (thickness + 1),
    );
    if inner.w < 1 || inner.h < 1 {
        return Err(DelveError::GenerationFailed(format!(
            "outer loop of thickness {} leaves no interior",
            thickness
        )));
    }

    // Wall loop one tile inside the walkway.
    let wall_min = thickness;
    let wall_max = last - thickness;
    let mut wall = Vec::new();
    for i in wall_min..=wall_max {
        wall.push(Position::new(full.x + i, full.y + wall_min));
        wall.push(Position::new(full.x + i, full.y + wall_max));
        if i != wall_min && i != wall_max {
            wall.push(Position::new(full.x + wall_min, full.y + i));
            wall.push(Position::new(full.x + wall_max, full.y + i));
        }
    }

    // Two doors on distinct sides, away from the loop corners.
    let mut sides = [0, 1, 2, 3];
    sides.shuffle(builder.rng);
    let mut doors = Vec::with_capacity(2);
    for side in &sides[..2] {
        let along = builder.rng.gen_range(wall_min + 1..wall_max);
        let door = match side {
            0 => Position::new(full.x + along, full.y + wall_min),
            1 => Position::new(full.x + along, full.y + wall_max),
            2 => Position::new(full.x + wall_min, full.y + along),
            _ => Position::new(full.x + wall_max, full.y + along),
        };
        doors.push(door);
    }

    for pos in &wall {
        if !doors.contains(pos) {
            builder.world.clear_tile(*pos);
        }
    }
    for door in &doors {
        builder.place_cut_door(*door);
    }

    if builder
        .rng
        .gen_bool(builder.config.outer_corner_clear_chance.clamp(0.0, 1.0))
    {
        for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
            builder.world.clear_tile(Position::new(full.x + x, full.y + y));
        }
    }

    let walkway: Vec<Position> = full
        .positions()
        .into_iter()
        .filter(|pos| {
            let dx = (pos.x - full.x).min(full.x + last - pos.x);
            let dy = (pos.y - full.y).min(full.y + last - pos.y);
            dx.min(dy) < thickness && builder.world.has_tile(*pos)
        })
        .collect();
    let area = walkway.len() as i32;
    furnish_room(builder, area, walkway);

    let split_cap = builder.config.split_depth_cap;
    recursive_room_chopper(builder, inner, 1, split_cap);
    Ok(())
}
