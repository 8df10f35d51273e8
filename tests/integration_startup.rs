//! Integration test to ensure a simulation can start up without errors.

use delve::{
    ascii_view, DelveResult, EntityKind, GameState, ItemCatalog, LootBook, RenderSnapshot,
    SimulationConfig, TemplateBook, PLAYER_SUBTYPE,
};
use std::io::Write;

#[test]
fn test_basic_startup() -> DelveResult<()> {
    let state = GameState::new(SimulationConfig::new(12345))?;

    let player_id = state.player_id().expect("player spawned");
    let player = state.entities.get(player_id).expect("player registered");
    assert!(player.living);
    assert!(player.visible);
    assert_eq!(player.hp, 8);
    assert_eq!(player.attack(), 1);
    match &player.kind {
        EntityKind::Creature(creature) => assert_eq!(creature.subtype, PLAYER_SUBTYPE),
        other => panic!("player is not a creature: {:?}", other),
    }

    // The player stands on a revealed tile inside the starting chunk.
    assert!(state.world.is_visible(player.position));
    assert!(state.world.chunk_exists(state.floor().start_chunk()));
    assert!(!state.clock().is_animating());
    assert!(state.move_queue().is_empty());
    assert!(state.inventory().is_empty());
    Ok(())
}

#[test]
fn test_player_is_alone_on_spawn_tile() -> DelveResult<()> {
    for seed in 0..20 {
        let state = GameState::new(SimulationConfig::new(seed))?;
        let spawn = state.player_position().expect("player spawned");
        assert_eq!(state.what_is_at(spawn).len(), 1, "seed {}", seed);
    }
    Ok(())
}

#[test]
fn test_start_chunk_is_planned_and_generated() -> DelveResult<()> {
    let state = GameState::new(SimulationConfig::new(77))?;
    let floor = state.floor();
    assert!(floor.chunk_count() >= 1);
    assert!(floor.is_planned(floor.start_chunk()));
    assert!(state.world.chunk_count() <= floor.chunk_count());
    Ok(())
}

#[test]
fn test_same_seed_same_world() -> DelveResult<()> {
    let a = GameState::new(SimulationConfig::new(2024))?;
    let b = GameState::new(SimulationConfig::new(2024))?;
    assert_eq!(a.player_position(), b.player_position());
    assert_eq!(a.world.tile_count(), b.world.tile_count());
    assert_eq!(a.entities.len(), b.entities.len());
    assert_eq!(ascii_view(&a, 20), ascii_view(&b, 20));
    Ok(())
}

#[test]
fn test_snapshot_after_startup() -> DelveResult<()> {
    let state = GameState::new(SimulationConfig::new(8))?;
    let snapshot = RenderSnapshot::capture(&state);
    assert_eq!(snapshot.tiles.len(), state.world.visible_tile_count());
    assert!(snapshot.entities.iter().any(|entity| entity.glyph == '@'));
    assert!(!snapshot.animating);
    Ok(())
}

#[test]
fn test_reveal_generated_toggle_from_config() -> DelveResult<()> {
    let mut config = SimulationConfig::new(31);
    config.debug.reveal_generated = true;
    let state = GameState::new(config)?;
    // Every generated tile starts visible.
    assert_eq!(state.world.tile_count(), state.world.visible_tile_count());
    Ok(())
}

#[test]
fn test_startup_with_tables_loaded_from_files() -> DelveResult<()> {
    let mut loot_file = tempfile::NamedTempFile::new()?;
    loot_file.write_all(
        br#"{ "tables": { "goon": { "entries": [ { "weight": 1, "item": "gem" } ] } } }"#,
    )?;
    let mut items_file = tempfile::NamedTempFile::new()?;
    items_file.write_all(
        br#"{ "items": { "gem": { "stackable": true, "usage": "consumable", "icon": "gem" } } }"#,
    )?;

    let loot = LootBook::from_json_str(&std::fs::read_to_string(loot_file.path())?)?;
    let catalog = ItemCatalog::from_json_str(&std::fs::read_to_string(items_file.path())?)?;
    let state = GameState::with_tables(
        SimulationConfig::new(6),
        TemplateBook::default(),
        loot,
        catalog,
    )?;

    assert!(state.catalog().metadata("gem").stackable);
    assert!(!state.catalog().metadata("moni").stackable);
    assert!(state.player_position().is_some());
    Ok(())
}
