//! # Reveal Engine
//!
//! Flood fill that exposes a room and everything in it. Closed doors are
//! revealed but stop the fill; open doors let it through. Planned chunks that
//! the frontier touches are generated on the spot, which is how the dungeon
//! streams in as the player explores.

use crate::{translate_chunk_coords, ChunkCoord, EntityKind, GameState, Position};
use log::{error, warn};
use std::collections::{BTreeSet, HashSet};

/// What a single reveal did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealReport {
    /// Tiles that went from hidden to visible
    pub tiles_revealed: usize,
    /// Entities that went from hidden to visible
    pub entities_revealed: usize,
    /// Flood-fill passes performed
    pub passes: u32,
    /// Chunks materialized while the fill ran
    pub chunks_generated: Vec<ChunkCoord>,
    /// True if the pass cap was hit and the fill stopped early
    pub aborted: bool,
}

impl RevealReport {
    /// Whether the reveal changed anything at all.
    pub fn changed_anything(&self) -> bool {
        self.tiles_revealed > 0 || self.entities_revealed > 0 || !self.chunks_generated.is_empty()
    }
}

const NEIGHBOURS: [Position; 4] = [
    Position { x: -1, y: 0 },
    Position { x: 0, y: -1 },
    Position { x: 1, y: 0 },
    Position { x: 0, y: 1 },
];

impl GameState {
    /// Reveals the tile at `origin` and every hidden tile connected to it.
    ///
    /// Ends with a full pathfinding rebuild around the player.
    pub fn reveal(&mut self, origin: Position) -> RevealReport {
        let mut report = RevealReport::default();
        let limit = self.config().reveal_pass_limit;

        let mut to_check: BTreeSet<Position> = BTreeSet::from([origin]);
        let mut checked: HashSet<Position> = HashSet::new();

        while !to_check.is_empty() {
            if report.passes >= limit {
                error!(
                    "reveal from ({}, {}) exceeded {} passes, stopping early",
                    origin.x, origin.y, limit
                );
                report.aborted = true;
                break;
            }
            report.passes += 1;

            let frontier: Vec<Position> = to_check.iter().copied().collect();
            for pos in frontier {
                if self.world.reveal_tile(pos) {
                    report.tiles_revealed += 1;
                }

                let mut stop_here = false;
                for id in self.entities.ids_at(pos) {
                    let Some(entity) = self.entities.get_mut(id) else {
                        continue;
                    };
                    match entity.kind {
                        EntityKind::Door(door) if door.closed => {
                            if !entity.visible {
                                report.entities_revealed += 1;
                            }
                            entity.visible = true;
                            stop_here = true;
                        }
                        // Open doors are drawn as plain floor.
                        EntityKind::Door(_) => entity.visible = false,
                        _ => {
                            if !entity.visible {
                                report.entities_revealed += 1;
                            }
                            entity.visible = true;
                        }
                    }
                }

                checked.insert(pos);

                if !stop_here {
                    for step in NEIGHBOURS {
                        let next = pos + step;
                        if checked.contains(&next) || to_check.contains(&next) {
                            continue;
                        }
                        self.materialize_for(next, &mut report);
                        match self.world.tile_at(next) {
                            Some(tile) if !tile.visible => {
                                to_check.insert(next);
                            }
                            _ => {}
                        }
                    }
                }

                to_check.remove(&pos);
            }
        }

        let center = self.player_position().unwrap_or(origin);
        self.pathfinding
            .rebuild(&self.world, &self.entities, center);
        report
    }

    /// Generates the chunk holding `pos` if it is planned but not yet materialized.
    fn materialize_for(&mut self, pos: Position, report: &mut RevealReport) {
        let (_, _, chunk) = translate_chunk_coords(pos);
        if self.world.chunk_exists(chunk) || !self.floor().is_planned(chunk) {
            return;
        }
        match self.materialize_chunk(chunk) {
            Ok(()) => report.chunks_generated.push(chunk),
            Err(e) => warn!("could not generate chunk ({}, {}): {}", chunk.x, chunk.y, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimulationConfig, Tile};

    fn room_state() -> GameState {
        let mut state = GameState::blank(SimulationConfig::new(1));
        state.world.insert_chunk(ChunkCoord::new(0, 0)).unwrap();
        // Two 4x4 rooms joined by a door at (4, 1).
        for x in 0..9 {
            for y in 0..4 {
                if x == 4 && y != 1 {
                    continue;
                }
                state.world.place_tile(Position::new(x, y), Tile::floor()).unwrap();
            }
        }
        state
    }

    #[test]
    fn test_closed_door_stops_fill() {
        let mut state = room_state();
        state.entities.spawn_door(Position::new(4, 1), true, false);

        let report = state.reveal(Position::new(0, 0));
        assert_eq!(report.tiles_revealed, 17);
        assert!(!report.aborted);
        assert!(state.world.is_visible(Position::new(4, 1)));
        assert!(!state.world.is_visible(Position::new(5, 1)));
        let door = state.entities.entities_at(Position::new(4, 1))[0];
        assert!(door.visible);
    }

    #[test]
    fn test_open_door_passes_fill() {
        let mut state = room_state();
        state.entities.spawn_door(Position::new(4, 1), false, false);

        let report = state.reveal(Position::new(0, 0));
        assert_eq!(report.tiles_revealed, 33);
        assert!(state.world.is_visible(Position::new(8, 3)));
        let door = state.entities.entities_at(Position::new(4, 1))[0];
        assert!(!door.visible);
    }

    #[test]
    fn test_reveal_shows_entities() {
        let mut state = room_state();
        let templates = crate::TemplateBook::default();
        let pot = state
            .entities
            .spawn_bustable(&templates, "pot", Position::new(2, 2), false);
        let report = state.reveal(Position::new(0, 0));
        assert_eq!(report.entities_revealed, 1);
        assert!(state.entities.get(pot).unwrap().visible);
    }

    #[test]
    fn test_second_reveal_changes_nothing() {
        let mut state = room_state();
        state.entities.spawn_door(Position::new(4, 1), true, false);
        state.reveal(Position::new(1, 1));
        let second = state.reveal(Position::new(1, 1));
        assert!(!second.changed_anything());
        assert_eq!(second.passes, 1);
    }

    #[test]
    fn test_pass_limit_aborts() {
        let mut config = SimulationConfig::new(1);
        config.reveal_pass_limit = 3;
        let mut state = GameState::blank(config);
        state.world.insert_chunk(ChunkCoord::new(0, 0)).unwrap();
        for x in 0..20 {
            state.world.place_tile(Position::new(x, 0), Tile::floor()).unwrap();
        }
        let report = state.reveal(Position::new(0, 0));
        assert!(report.aborted);
        assert_eq!(report.passes, 3);
        assert!(!state.world.is_visible(Position::new(19, 0)));
    }

    #[test]
    fn test_missing_origin_is_noop() {
        let mut state = room_state();
        let report = state.reveal(Position::new(40, 40));
        assert_eq!(report.tiles_revealed, 0);
    }
}
