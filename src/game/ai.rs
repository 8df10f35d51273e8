//! # Creature AI
//!
//! One decision per creature per time advance: sleep or wake by distance to
//! the player, count down the wait timer, then pick a step by movement pattern.

use crate::{
    Direction, DelveError, DelveResult, EntityId, EntityKind, GameState, MoveOutcome,
    MovementPattern, Position, COST_OPEN,
};
use log::debug;
use rand::seq::SliceRandom;

/// Which of a creature's horizontal-preference flags a flattening step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preference {
    Naive,
    Chase,
}

impl GameState {
    /// Lets one creature act. Returns the outcome if it attempted a move.
    pub fn do_a_thing(&mut self, id: EntityId) -> DelveResult<Option<MoveOutcome>> {
        let Some(player) = self.player_position() else {
            return Ok(None);
        };
        let player_id = self.player_id();
        let sleep_distance = self.config().sleep_distance;

        let entity = self
            .entities
            .get_mut(id)
            .ok_or(DelveError::UnknownEntity(id))?;
        if !entity.living || !entity.visible {
            return Ok(None);
        }
        let position = entity.position;
        let Some(creature) = entity.creature_mut() else {
            return Ok(None);
        };

        if position.chebyshev_distance(player) > sleep_distance {
            if !creature.asleep {
                creature.asleep = true;
                debug!("{} at ({}, {}) fell asleep", creature.subtype, position.x, position.y);
            }
            return Ok(None);
        }
        creature.asleep = false;

        if creature.wait > 0 {
            creature.wait -= 1;
            return Ok(None);
        }

        let movement = creature.movement;
        let diagonal = creature.diagonal;
        let strength = creature.path_strength;
        let friendly_fire = creature.friendly_fire;

        let delta = match movement {
            MovementPattern::Chase => self.chase_step(id, position, player, strength, diagonal),
            MovementPattern::Naive => self.naive_step(id, position, player, diagonal),
            MovementPattern::Random => self.random_step(position, diagonal),
        };
        let Some(delta) = delta else {
            return Ok(None);
        };

        if let Some(creature) = self.entities.get_mut(id).and_then(|e| e.creature_mut()) {
            creature.wait = creature.cooldown;
        }

        if !friendly_fire {
            let target = position + delta;
            let blocked_by_ally = self.entities.entities_at(target).iter().any(|other| {
                other.id != id
                    && Some(other.id) != player_id
                    && other.living
                    && matches!(other.kind, EntityKind::Creature(_))
            });
            if blocked_by_ally {
                return Ok(None);
            }
        }

        self.attempt_move(id, delta).map(Some)
    }

    /// First step of an A* route to the player.
    fn chase_step(
        &mut self,
        id: EntityId,
        from: Position,
        player: Position,
        strength: u8,
        diagonal: bool,
    ) -> Option<Position> {
        let delta = self
            .pathfinding
            .find_path(from, player, strength)?
            .first_delta()?;
        if delta.is_diagonal() && !diagonal {
            return Some(self.flatten_diagonal(id, delta, Preference::Chase));
        }
        Some(delta)
    }

    /// Greedy step that closes the larger axis gap first.
    fn naive_step(
        &mut self,
        id: EntityId,
        from: Position,
        player: Position,
        diagonal: bool,
    ) -> Option<Position> {
        let gap = player - from;
        if gap == Position::origin() {
            return None;
        }
        let step = gap.signum();
        if diagonal || !step.is_diagonal() {
            return Some(step);
        }
        match gap.x.abs().cmp(&gap.y.abs()) {
            std::cmp::Ordering::Greater => Some(Position::new(step.x, 0)),
            std::cmp::Ordering::Less => Some(Position::new(0, step.y)),
            std::cmp::Ordering::Equal => Some(self.flatten_diagonal(id, step, Preference::Naive)),
        }
    }

    /// Uniform pick among adjacent cells that exist and hold nothing solid.
    fn random_step(&mut self, from: Position, diagonal: bool) -> Option<Position> {
        let directions: Vec<Direction> = if diagonal {
            Direction::all().to_vec()
        } else {
            Direction::cardinal().to_vec()
        };
        let open: Vec<Position> = directions
            .into_iter()
            .map(Direction::to_delta)
            .filter(|delta| {
                let cell = from + *delta;
                self.world.has_tile(cell) && self.entities.cost_class_at(cell) == COST_OPEN
            })
            .collect();
        open.choose(self.rng_mut()).copied()
    }

    /// Turns a diagonal into one orthogonal step, alternating axes per creature.
    fn flatten_diagonal(&mut self, id: EntityId, delta: Position, preference: Preference) -> Position {
        let Some(creature) = self.entities.get_mut(id).and_then(|e| e.creature_mut()) else {
            return Position::new(delta.x, 0);
        };
        let flag = match preference {
            Preference::Naive => &mut creature.naive_prefers_horizontal,
            Preference::Chase => &mut creature.chase_prefers_horizontal,
        };
        let horizontal = *flag;
        *flag = !horizontal;
        if horizontal {
            Position::new(delta.x, 0)
        } else {
            Position::new(0, delta.y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkCoord, SimulationConfig, TemplateBook, Tile, TileImage};

    fn arena(size: i32) -> GameState {
        let mut state = GameState::blank(SimulationConfig::new(9));
        state.world.insert_chunk(ChunkCoord::new(0, 0)).unwrap();
        for x in 0..size {
            for y in 0..size {
                state
                    .world
                    .place_tile(Position::new(x, y), Tile::new(TileImage::Floor(1), true))
                    .unwrap();
            }
        }
        state.spawn_player(Position::new(0, 0)).unwrap();
        state
    }

    fn spawn(state: &mut GameState, subtype: &str, at: Position) -> EntityId {
        let templates = TemplateBook::default();
        let id = state.entities.spawn_creature(&templates, subtype, at, true);
        let player = state.player_position().unwrap();
        state
            .pathfinding
            .rebuild(&state.world, &state.entities, player);
        id
    }

    fn creature(state: &GameState, id: EntityId) -> &crate::CreatureState {
        state.entities.get(id).unwrap().creature().unwrap()
    }

    #[test]
    fn test_far_creature_sleeps_then_wakes() {
        let mut state = arena(20);
        let goon = spawn(&mut state, "goon", Position::new(15, 0));
        assert_eq!(state.do_a_thing(goon).unwrap(), None);
        assert!(creature(&state, goon).asleep);
        assert!(!state.entities.get(goon).unwrap().is_active());

        let player = state.player_id().unwrap();
        state.entities.move_to(player, Position::new(4, 0)).unwrap();
        let outcome = state.do_a_thing(goon).unwrap();
        assert!(!creature(&state, goon).asleep);
        assert_eq!(outcome, Some(MoveOutcome::Moved(Position::new(14, 0))));
    }

    #[test]
    fn test_wait_counter_paces_creature() {
        let mut state = arena(10);
        let goon = spawn(&mut state, "goon", Position::new(6, 0));
        // Cooldown 1: act, rest, act.
        assert!(state.do_a_thing(goon).unwrap().is_some());
        assert_eq!(creature(&state, goon).wait, 1);
        assert_eq!(state.do_a_thing(goon).unwrap(), None);
        assert_eq!(creature(&state, goon).wait, 0);
        assert!(state.do_a_thing(goon).unwrap().is_some());
    }

    #[test]
    fn test_naive_alternates_on_ties() {
        let mut state = arena(10);
        let goon = spawn(&mut state, "goon", Position::new(4, 4));
        let first = state.naive_step(goon, Position::new(4, 4), Position::new(0, 0), false);
        let second = state.naive_step(goon, Position::new(4, 4), Position::new(0, 0), false);
        let mut steps = vec![first.unwrap(), second.unwrap()];
        steps.sort();
        assert_eq!(steps, vec![Position::new(-1, 0), Position::new(0, -1)]);
        // The chase flag is untouched by naive steps.
        assert!(creature(&state, goon).chase_prefers_horizontal);
    }

    #[test]
    fn test_naive_closes_larger_gap() {
        let mut state = arena(10);
        let goon = spawn(&mut state, "goon", Position::new(5, 2));
        let step = state.naive_step(goon, Position::new(5, 2), Position::new(0, 0), false);
        assert_eq!(step, Some(Position::new(-1, 0)));
    }

    #[test]
    fn test_chase_flattens_diagonals() {
        let mut state = arena(10);
        let big = spawn(&mut state, "big_cubeo", Position::new(5, 5));
        let step = state
            .chase_step(big, Position::new(5, 5), Position::new(0, 0), 3, false)
            .unwrap();
        assert!(!step.is_diagonal());
        assert_eq!(step.x + step.y, -1);
    }

    #[test]
    fn test_diagonal_chaser_keeps_diagonal() {
        let mut state = arena(10);
        let eyepod = spawn(&mut state, "eyepod", Position::new(5, 5));
        let step = state
            .chase_step(eyepod, Position::new(5, 5), Position::new(0, 0), 0, true)
            .unwrap();
        assert_eq!(step, Position::new(-1, -1));
    }

    #[test]
    fn test_random_step_only_into_open_cells() {
        let mut state = arena(3);
        spawn(&mut state, "cubeo", Position::new(2, 2));
        let templates = TemplateBook::default();
        state
            .entities
            .spawn_bustable(&templates, "pot", Position::new(1, 2), true);
        state.entities.spawn_door(Position::new(2, 1), true, true);
        // Only (1, 1) is left; the player sits on (0, 0) out of reach.
        for _ in 0..20 {
            assert_eq!(
                state.random_step(Position::new(2, 2), true),
                Some(Position::new(-1, -1))
            );
        }
        assert_eq!(state.random_step(Position::new(2, 2), false), None);
    }

    #[test]
    fn test_friendly_fire_off_aborts_but_resets_wait() {
        let mut state = arena(10);
        spawn(&mut state, "goon", Position::new(1, 0));
        let back = spawn(&mut state, "goon", Position::new(2, 0));
        assert_eq!(state.do_a_thing(back).unwrap(), None);
        assert_eq!(creature(&state, back).wait, 1);
        assert_eq!(state.entities.get(back).unwrap().position, Position::new(2, 0));
    }

    #[test]
    fn test_creature_attacks_player() {
        let mut state = arena(10);
        let goon = spawn(&mut state, "goon", Position::new(1, 0));
        let player = state.player_id().unwrap();
        let outcome = state.do_a_thing(goon).unwrap();
        assert_eq!(
            outcome,
            Some(MoveOutcome::Attacked {
                target: player,
                killed: false
            })
        );
        assert_eq!(state.player().unwrap().hp, 7);
        assert_eq!(state.statistics().damage_taken, 1);
    }
}
