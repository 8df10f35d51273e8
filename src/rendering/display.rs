//! # Display Snapshot
//!
//! Read-only views of the simulation for whatever draws it: a list of visible
//! tiles and entities with grid and pixel positions, and a plain-text map used
//! by the headless driver.

use crate::{grid_to_pixels, EntityId, EntityKind, GameState, Position, TileImage};
use serde::{Deserialize, Serialize};

/// A visible floor tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub grid: Position,
    pub pixels: Position,
    pub image: TileImage,
}

/// A visible entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub grid: Position,
    /// Interpolated draw position
    pub pixels: Position,
    pub glyph: char,
    pub living: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Visible tiles, row-major
    pub tiles: Vec<TileView>,
    /// Visible entities, in spawn order
    pub entities: Vec<EntityView>,
    /// Pixel position the camera centres on, shake included
    pub camera: Position,
    pub animating: bool,
    pub show_fps: bool,
}

impl RenderSnapshot {
    /// Captures the visible state of a simulation.
    pub fn capture(state: &GameState) -> Self {
        let mut tiles: Vec<TileView> = state
            .world
            .iter_tiles()
            .filter(|(_, tile)| tile.visible)
            .map(|(grid, tile)| TileView {
                grid,
                pixels: grid_to_pixels(grid),
                image: tile.image,
            })
            .collect();
        tiles.sort_by_key(|tile| (tile.grid.y, tile.grid.x));

        let entities = state
            .entities
            .iter()
            .filter(|entity| entity.visible)
            .map(|entity| EntityView {
                id: entity.id,
                grid: entity.position,
                pixels: entity.visual.current,
                glyph: entity_glyph(state, entity.id),
                living: entity.living,
            })
            .collect();

        let focus = state
            .player_id()
            .and_then(|id| state.entities.get(id))
            .map(|player| player.visual.current)
            .unwrap_or_else(|| grid_to_pixels(state.floor().spawn_position()));

        Self {
            tiles,
            entities,
            camera: focus + state.camera_shake().offset(),
            animating: state.clock().is_animating(),
            show_fps: state.debug().show_fps,
        }
    }
}

/// Character used for an entity in text views.
pub fn entity_glyph(state: &GameState, id: EntityId) -> char {
    let Some(entity) = state.entities.get(id) else {
        return '?';
    };
    if state.player_id() == Some(id) {
        return if entity.living { '@' } else { '%' };
    }
    match &entity.kind {
        EntityKind::Creature(creature) => match creature.subtype.as_str() {
            "big_cubeo" => 'C',
            other => other.chars().next().unwrap_or('c'),
        },
        EntityKind::Bustable(bustable) if bustable.subtype == "chest" => '=',
        EntityKind::Bustable(_) => 'o',
        EntityKind::Door(door) if door.closed => '+',
        EntityKind::Door(_) => '\'',
        EntityKind::Pickup(_) => '$',
    }
}

/// Draw priority of an entity's glyph when several share a tile.
fn glyph_priority(state: &GameState, id: EntityId) -> u8 {
    let Some(entity) = state.entities.get(id) else {
        return 0;
    };
    match &entity.kind {
        _ if state.player_id() == Some(id) => 5,
        EntityKind::Creature(_) => 4,
        EntityKind::Bustable(_) => 3,
        EntityKind::Door(_) => 2,
        EntityKind::Pickup(_) => 1,
    }
}

/// Text map of the `(2 * radius + 1)` square around the player.
///
/// `.` and `,` are floor and cracked floor, `#` marks void next to a revealed
/// tile, and hidden space is blank.
pub fn ascii_view(state: &GameState, radius: i32) -> String {
    let centre = state
        .player_position()
        .unwrap_or_else(|| state.floor().spawn_position());

    let mut out = String::new();
    for y in (centre.y - radius)..=(centre.y + radius) {
        let mut row = String::new();
        for x in (centre.x - radius)..=(centre.x + radius) {
            row.push(cell_glyph(state, Position::new(x, y)));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

fn cell_glyph(state: &GameState, pos: Position) -> char {
    let top = state
        .entities
        .ids_at(pos)
        .into_iter()
        .filter(|id| state.entities.get(*id).map_or(false, |e| e.visible))
        .max_by_key(|id| glyph_priority(state, *id));
    if let Some(id) = top {
        return entity_glyph(state, id);
    }

    match state.world.tile_at(pos) {
        Some(tile) if tile.visible => {
            if tile.image.is_cracked() {
                ','
            } else {
                '.'
            }
        }
        Some(_) => ' ',
        None => {
            let borders_revealed = pos
                .adjacent_positions()
                .into_iter()
                .any(|next| state.world.is_visible(next));
            if borders_revealed {
                '#'
            } else {
                ' '
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkCoord, SimulationConfig, Tile};

    fn lit_room() -> GameState {
        let mut state = GameState::blank(SimulationConfig::new(3));
        state.world.insert_chunk(ChunkCoord::new(0, 0)).unwrap();
        for x in 1..4 {
            for y in 1..4 {
                state
                    .world
                    .place_tile(Position::new(x, y), Tile::floor())
                    .unwrap();
            }
        }
        state.spawn_player(Position::new(2, 2)).unwrap();
        state.reveal(Position::new(2, 2));
        state
    }

    #[test]
    fn test_ascii_view_draws_room_and_walls() {
        let state = lit_room();
        let view = ascii_view(&state, 2);
        let rows: Vec<&str> = view.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], "#####");
        assert_eq!(rows[2], "#.@.#");
        assert_eq!(rows[4], "#####");
    }

    #[test]
    fn test_snapshot_lists_only_visible() {
        let mut state = lit_room();
        state
            .entities
            .spawn_door(Position::new(3, 3), true, false);
        let snapshot = RenderSnapshot::capture(&state);
        assert_eq!(snapshot.tiles.len(), 9);
        assert_eq!(snapshot.entities.len(), 1);
        assert_eq!(snapshot.entities[0].glyph, '@');
        assert_eq!(snapshot.camera, grid_to_pixels(Position::new(2, 2)));
        assert_eq!(snapshot.tiles[0].grid, Position::new(1, 1));
    }
}
