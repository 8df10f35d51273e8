//! Property tests for the room splitter and the pathfinding window.

use delve::{
    recursive_room_chopper, ChunkBuilder, ChunkCoord, ChunkProperties, ChunkShape,
    EntityRegistry, FloorPlan, GenerationConfig, Palette, Path, PathfindingGrid, Position, Rect,
    TemplateBook, Tile, World, COST_BUSTABLE, COST_CREATURE, COST_OPEN, COST_WALL,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const GRID: usize = 20;

fn grid_from(costs: &[u8]) -> PathfindingGrid {
    let mut grid = PathfindingGrid::new(GRID, GRID, 4);
    grid.recenter(Position::new(GRID as i32 / 2, GRID as i32 / 2));
    for (i, cost) in costs.iter().enumerate() {
        grid.set_cost(Position::new((i % GRID) as i32, (i / GRID) as i32), *cost);
    }
    grid
}

fn cost_class() -> impl Strategy<Value = u8> {
    prop_oneof![
        4 => Just(COST_OPEN),
        1 => Just(COST_BUSTABLE),
        1 => Just(COST_CREATURE),
        2 => Just(COST_WALL),
    ]
}

fn cell() -> impl Strategy<Value = Position> {
    (0..GRID as i32, 0..GRID as i32).prop_map(|(x, y)| Position::new(x, y))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn small_rects_are_never_cut(
        seed in any::<u64>(),
        x in 0_i32..10,
        y in 0_i32..10,
        w in 1_i32..7,
        h in 1_i32..7,
    ) {
        let rect = Rect::new(x, y, w, h);
        let mut world = World::new();
        world.insert_chunk(ChunkCoord::new(0, 0)).unwrap();
        for pos in rect.positions() {
            world.place_tile(pos, Tile::floor()).unwrap();
        }
        let mut entities = EntityRegistry::new();
        let floor = FloorPlan::single(
            ChunkProperties { shape: ChunkShape::Classic, palette: Palette::Slate },
            Position::origin(),
        );
        let templates = TemplateBook::default();
        let config = GenerationConfig::new(seed);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut builder = ChunkBuilder {
            world: &mut world,
            entities: &mut entities,
            floor: &floor,
            templates: &templates,
            config: &config,
            rng: &mut rng,
            visible: false,
        };
        recursive_room_chopper(&mut builder, rect, 1, config.split_depth_cap);

        prop_assert_eq!(world.tile_count(), rect.area() as usize);
        prop_assert!(entities.len() as i32 <= rect.area() / 3);
        for entity in entities.iter() {
            prop_assert!(rect.contains(entity.position));
        }
    }

    #[test]
    fn paths_are_deterministic_unit_walks(
        costs in prop::collection::vec(cost_class(), GRID * GRID),
        start in cell(),
        goal in cell(),
        strength in 0_u8..=COST_WALL,
    ) {
        let grid = grid_from(&costs);
        let first: Option<Path> = grid.find_path(start, goal, strength);
        let second = grid.find_path(start, goal, strength);
        prop_assert_eq!(&first, &second);

        if let Some(path) = first {
            let deltas = path.deltas();
            let mut sum = Position::origin();
            for delta in &deltas {
                prop_assert!(delta.x.abs() <= 1 && delta.y.abs() <= 1);
                prop_assert_ne!(*delta, Position::origin());
                sum = sum + *delta;
            }
            prop_assert_eq!(sum, goal - start);
            prop_assert_eq!(path.first_delta(), deltas.first().copied());
        }
    }

    #[test]
    fn stronger_searchers_never_pay_more(
        costs in prop::collection::vec(cost_class(), GRID * GRID),
        start in cell(),
        goal in cell(),
        weak in 0_u8..COST_WALL,
        extra in 1_u8..=COST_WALL,
    ) {
        let grid = grid_from(&costs);
        let strong = weak.saturating_add(extra);
        if let Some(weak_path) = grid.find_path(start, goal, weak) {
            let strong_path = grid.find_path(start, goal, strong);
            prop_assert!(strong_path.is_some());
            let strong_path = strong_path.unwrap();
            prop_assert!(strong_path.cost() <= weak_path.cost());
        }
    }
}
