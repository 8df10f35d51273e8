//! # Room Furnishing
//!
//! Fills leaf rooms with pots, chests and enemies, roughens the floor with
//! cracked tiles, and cuts pillars out of large rectangular halls.

use super::dungeon::ChunkBuilder;
use super::{EncounterGenerator, Generator, Rect};
use crate::{Position, TileImage};
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of cracked floor image variants.
pub const CRACK_VARIANTS: u8 = 2;

/// Bustable placed for ordinary pots.
pub const POT: &str = "pot";

/// Bustable that may replace a room's first pot.
pub const CHEST: &str = "chest";

/// Cluster of tiles removed around each pillar centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillarShape {
    /// Three tiles along the room's long axis
    Dash,
    Plus,
    /// 2x2 block
    Square,
    /// Two bars across the long axis joined in the middle
    H,
}

impl PillarShape {
    pub const ALL: [PillarShape; 4] = [
        PillarShape::Dash,
        PillarShape::Plus,
        PillarShape::Square,
        PillarShape::H,
    ];

    /// Offsets as `(along, across)` relative to the centre.
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            PillarShape::Dash => &[(-1, 0), (0, 0), (1, 0)],
            PillarShape::Plus => &[(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
            PillarShape::Square => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            PillarShape::H => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, 0),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

/// Probability that a room of this size gets pillars, or `None` if it is too small.
pub fn pillar_chance(rect: Rect) -> Option<f64> {
    let area = rect.area();
    if rect.w <= 6 || rect.h <= 6 || area <= 84 {
        return None;
    }
    Some(if area > 250 {
        0.95
    } else if area > 150 {
        0.9
    } else {
        0.8
    })
}

/// Pillar centres as `(along, across)` offsets from the room's top-left corner.
///
/// Centres are evenly spaced along the long axis, at least four apart and at
/// least two tiles from either end, on the middle line of the short axis.
pub fn pillar_centres(long: i32, short: i32) -> Vec<(i32, i32)> {
    let span = long - 5;
    let count = (span / 4 - 1).max(1);
    let step = span / (count + 1);
    (0..count)
        .map(|i| (2 + (i + 1) * step, short / 2))
        .collect()
}

/// Randomly cuts pillars out of a large room. Returns the removed positions.
pub fn carve_pillars(builder: &mut ChunkBuilder<'_>, rect: Rect) -> Vec<Position> {
    let Some(chance) = pillar_chance(rect) else {
        return Vec::new();
    };
    if !builder.rng.gen_bool(chance) {
        return Vec::new();
    }
    let Some(shape) = PillarShape::ALL.choose(builder.rng).copied() else {
        return Vec::new();
    };

    let horizontal = rect.w >= rect.h;
    let (long, short) = if horizontal {
        (rect.w, rect.h)
    } else {
        (rect.h, rect.w)
    };

    let mut removed = Vec::new();
    for (centre_along, centre_across) in pillar_centres(long, short) {
        for (along, across) in shape.offsets() {
            let (a, c) = (centre_along + along, centre_across + across);
            let pos = if horizontal {
                Position::new(rect.x + a, rect.y + c)
            } else {
                Position::new(rect.x + c, rect.y + a)
            };
            if builder.world.has_tile(pos) && !builder.entities.is_occupied(pos) {
                builder.world.clear_tile(pos);
                removed.push(pos);
            }
        }
    }
    removed
}

/// Furnishes a leaf rectangle, cutting pillars first when it is large enough.
pub fn furnish_rect(builder: &mut ChunkBuilder<'_>, rect: Rect) {
    let removed = carve_pillars(builder, rect);
    let pool: Vec<Position> = rect
        .positions()
        .into_iter()
        .filter(|pos| !removed.contains(pos))
        .collect();
    furnish_room(builder, rect.area(), pool);
}

/// Places pots, enemies and cracked floor on tiles drawn from `pool`.
///
/// Tiles that do not exist or are already occupied are dropped from the pool
/// first. At most `area / 3` objects are placed.
pub fn furnish_room(builder: &mut ChunkBuilder<'_>, area: i32, pool: Vec<Position>) {
    let mut unused: Vec<Position> = pool
        .into_iter()
        .filter(|pos| builder.world.has_tile(*pos) && !builder.entities.is_occupied(*pos))
        .collect();

    let plan = match EncounterGenerator::new(area).generate(builder.config, builder.rng) {
        Ok(plan) => plan,
        Err(e) => {
            warn!("skipping room furnishing: {}", e);
            return;
        }
    };

    let max_things = (area / 3).max(0) as usize;
    let mut placed = 0;

    for i in 0..plan.pots {
        if placed >= max_things {
            return;
        }
        let Some(pos) = take_random(&mut unused, builder) else {
            return;
        };
        let subtype = if i == 0 && plan.first_pot_is_chest {
            CHEST
        } else {
            POT
        };
        builder
            .entities
            .spawn_bustable(builder.templates, subtype, pos, builder.visible);
        placed += 1;
    }

    for enemy in &plan.enemies {
        if placed >= max_things {
            return;
        }
        let Some(pos) = take_random(&mut unused, builder) else {
            return;
        };
        builder
            .entities
            .spawn_creature(builder.templates, enemy, pos, builder.visible);
        placed += 1;
    }

    let cracks = if builder.rng.gen_range(1..=2) == 2 {
        area / 10
    } else if builder.rng.gen_range(1..=2) == 2 {
        area / 5
    } else {
        0
    };
    for _ in 0..cracks {
        let Some(pos) = take_random(&mut unused, builder) else {
            break;
        };
        let variant = builder.rng.gen_range(1..=CRACK_VARIANTS);
        if let Some(tile) = builder.world.tile_at_mut(pos) {
            tile.image = TileImage::Cracked(variant);
        }
    }
}

fn take_random(unused: &mut Vec<Position>, builder: &mut ChunkBuilder<'_>) -> Option<Position> {
    if unused.is_empty() {
        return None;
    }
    let index = builder.rng.gen_range(0..unused.len());
    Some(unused.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ChunkCoord, ChunkProperties, ChunkShape, EntityKind, EntityRegistry, FloorPlan,
        GenerationConfig, Palette, TemplateBook, Tile, World,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filled_world(rect: Rect) -> World {
        let mut world = World::new();
        world.insert_chunk(ChunkCoord::new(0, 0)).unwrap();
        for pos in rect.positions() {
            world.place_tile(pos, Tile::floor()).unwrap();
        }
        world
    }

    fn floor() -> FloorPlan {
        FloorPlan::single(
            ChunkProperties {
                shape: ChunkShape::Classic,
                palette: Palette::Moss,
            },
            Position::new(0, 0),
        )
    }

    #[test]
    fn test_pillar_chance_thresholds() {
        assert_eq!(pillar_chance(Rect::new(0, 0, 6, 20)), None);
        assert_eq!(pillar_chance(Rect::new(0, 0, 12, 7)), None);
        assert_eq!(pillar_chance(Rect::new(0, 0, 13, 7)), Some(0.8));
        assert_eq!(pillar_chance(Rect::new(0, 0, 16, 10)), Some(0.9));
        assert_eq!(pillar_chance(Rect::new(0, 0, 25, 25)), Some(0.95));
    }

    #[test]
    fn test_pillar_centres_stay_off_the_walls() {
        for long in 7..=25 {
            let centres = pillar_centres(long, 7);
            assert!(!centres.is_empty());
            for (along, across) in &centres {
                assert!(*along >= 2 && *along <= long - 3, "long {}: {:?}", long, centres);
                assert_eq!(*across, 3);
            }
            for pair in centres.windows(2) {
                assert!(pair[1].0 - pair[0].0 >= 4);
            }
        }
    }

    #[test]
    fn test_furnishing_respects_cap_and_existing_tiles() {
        let rect = Rect::new(0, 0, 9, 9);
        let templates = TemplateBook::default();
        let floor = floor();
        for seed in 0..30 {
            let mut world = filled_world(rect);
            // A hole in the middle of the room must never receive anything.
            world.clear_tile(Position::new(4, 4));
            let mut entities = EntityRegistry::new();
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
            furnish_room(&mut builder, rect.area(), rect.positions());

            assert!(entities.len() <= 27);
            assert!(!entities.is_occupied(Position::new(4, 4)));
            for entity in entities.iter() {
                assert!(world.has_tile(entity.position));
                assert!(!entity.visible);
                assert!(matches!(
                    entity.kind,
                    EntityKind::Creature(_) | EntityKind::Bustable(_)
                ));
            }
        }
    }

    #[test]
    fn test_pillars_removed_from_pool() {
        let rect = Rect::new(0, 0, 20, 12);
        let templates = TemplateBook::default();
        let floor = floor();
        let mut carved_any = false;
        for seed in 0..20 {
            let mut world = filled_world(rect);
            let mut entities = EntityRegistry::new();
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
            furnish_rect(&mut builder, rect);
            let missing = rect.positions().iter().filter(|p| !world.has_tile(**p)).count();
            carved_any |= missing > 0;
            // The outer ring of the room is never touched by pillars.
            for pos in rect.positions() {
                let border = pos.x == 0 || pos.y == 0 || pos.x == 19 || pos.y == 11;
                if border {
                    assert!(world.has_tile(pos));
                }
            }
        }
        assert!(carved_any);
    }
}
