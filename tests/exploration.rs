//! Exploration: door symmetry across chunk borders, lazy chunk generation and
//! reveal idempotence.

use delve::{
    ChunkCoord, DelveResult, DoorState, Edge, EntityKind, GameState, Position, SimulationConfig,
};

fn materialize_everything(state: &mut GameState) -> DelveResult<()> {
    let planned: Vec<ChunkCoord> = state.floor().chunks().collect();
    for chunk in planned {
        if !state.world.chunk_exists(chunk) {
            state.materialize_chunk(chunk)?;
        }
    }
    Ok(())
}

#[test]
fn test_door_symmetry_after_both_sides_generated() -> DelveResult<()> {
    for seed in 0..12 {
        let mut state = GameState::new(SimulationConfig::new(seed))?;
        materialize_everything(&mut state)?;

        for (chunk, edge, offset) in state.floor().doors() {
            let neighbour = match edge {
                Edge::Right => chunk.offset(1, 0),
                Edge::Down => chunk.offset(0, 1),
            };
            assert!(state.world.chunk_exists(chunk));
            assert!(state.world.chunk_exists(neighbour));

            let pos = edge.door_position(chunk, offset);
            assert!(state.world.has_tile(pos), "seed {} door {:?} lost its tile", seed, pos);
            let doors = state
                .what_is_at(pos)
                .into_iter()
                .filter(|entity| matches!(entity.kind, EntityKind::Door(_)))
                .count();
            assert_eq!(doors, 1, "seed {} door {:?}", seed, pos);
        }
    }
    Ok(())
}

#[test]
fn test_doors_only_between_planned_neighbours() -> DelveResult<()> {
    let state = GameState::new(SimulationConfig::new(3))?;
    let floor = state.floor();
    for (chunk, edge, offset) in floor.doors() {
        assert!((1..=23).contains(&offset));
        let neighbour = match edge {
            Edge::Right => chunk.offset(1, 0),
            Edge::Down => chunk.offset(0, 1),
        };
        assert!(floor.is_planned(chunk) && floor.is_planned(neighbour));
        assert!(floor.door_at(edge.door_position(chunk, offset)));
    }
    Ok(())
}

#[test]
fn test_generated_content_sits_on_tiles() -> DelveResult<()> {
    for seed in 100..110 {
        let mut state = GameState::new(SimulationConfig::new(seed))?;
        materialize_everything(&mut state)?;
        for entity in state.entities.iter() {
            assert!(
                state.world.has_tile(entity.position),
                "seed {}: {:?} in the void",
                seed,
                entity.kind
            );
        }
    }
    Ok(())
}

#[test]
fn test_chunks_are_generated_lazily() -> DelveResult<()> {
    for seed in 0..20 {
        let state = GameState::new(SimulationConfig::new(seed))?;
        // The start chunk, plus at most the left and upper neighbours touched
        // by the starting room's flood fill.
        assert!(state.world.chunk_count() >= 1);
        assert!(state.world.chunk_count() <= 3, "seed {}", seed);
        for chunk in state.world.chunk_coords() {
            assert!(state.floor().is_planned(chunk));
        }
        assert_eq!(
            state.statistics().chunks_generated as usize,
            state.world.chunk_count()
        );
    }
    Ok(())
}

#[test]
fn test_opening_border_door_streams_in_neighbour() -> DelveResult<()> {
    let mut found = false;
    for seed in 0..60 {
        let mut state = GameState::new(SimulationConfig::new(seed))?;
        let start = state.floor().start_chunk();
        let Some(offset) = state.floor().door_offset(start, Edge::Right) else {
            continue;
        };
        let neighbour = start.offset(1, 0);
        assert!(!state.world.chunk_exists(neighbour));

        let door_pos = Edge::Right.door_position(start, offset);
        for id in state.entities.ids_at(door_pos) {
            if let Some(entity) = state.entities.get_mut(id) {
                if let EntityKind::Door(_) = entity.kind {
                    entity.kind = EntityKind::Door(DoorState { closed: false });
                }
            }
        }

        let report = state.reveal(door_pos);
        assert!(report.chunks_generated.contains(&neighbour), "seed {}", seed);
        assert!(state.world.chunk_exists(neighbour));
        assert!(state.world.is_visible(door_pos + Position::new(1, 0)));
        found = true;
        break;
    }
    assert!(found, "no seed produced a start chunk with a right-hand door");
    Ok(())
}

#[test]
fn test_reveal_is_idempotent() -> DelveResult<()> {
    for seed in 0..10 {
        let mut state = GameState::new(SimulationConfig::new(seed))?;
        let player = state.player_position().expect("player spawned");
        let visible = state.world.visible_tile_count();
        let chunks = state.world.chunk_count();

        let report = state.reveal(player);
        assert!(!report.changed_anything(), "seed {}: {:?}", seed, report);
        assert!(!report.aborted);
        assert_eq!(state.world.visible_tile_count(), visible);
        assert_eq!(state.world.chunk_count(), chunks);
    }
    Ok(())
}

#[test]
fn test_visible_entities_stand_on_visible_tiles() -> DelveResult<()> {
    for seed in 40..50 {
        let state = GameState::new(SimulationConfig::new(seed))?;
        for entity in state.entities.iter().filter(|entity| entity.visible) {
            assert!(state.world.is_visible(entity.position), "seed {}", seed);
        }
    }
    Ok(())
}
