//! # Encounter Generation
//!
//! Decides what a room contains: how many pots, whether the first pot is a
//! chest, and which enemies spawn. Counts come from area-banded tables so that
//! small rooms stay sparse and large halls get crowded.

use crate::{DelveError, DelveResult, GenerationConfig, Generator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Enemy-count and pot-count tables for one room-size band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaBand {
    /// Largest area that falls in this band
    pub max_area: Option<i32>,
    pub enemy_counts: &'static [usize],
    pub pot_counts: &'static [usize],
}

/// The four area bands, smallest first. The last band is open ended.
pub const AREA_BANDS: [AreaBand; 4] = [
    AreaBand {
        max_area: Some(12),
        enemy_counts: &[0, 0, 0, 0, 0, 1, 1],
        pot_counts: &[0, 0, 1, 1, 2],
    },
    AreaBand {
        max_area: Some(35),
        enemy_counts: &[0, 0, 0, 0, 1, 1, 2],
        pot_counts: &[0, 0, 0, 1, 2],
    },
    AreaBand {
        max_area: Some(55),
        enemy_counts: &[0, 0, 0, 1, 1, 2, 3],
        pot_counts: &[0, 1, 1, 3, 6],
    },
    AreaBand {
        max_area: None,
        enemy_counts: &[0, 0, 1, 2, 4, 5, 6],
        pot_counts: &[0, 2, 5, 7, 8],
    },
];

/// Named enemy mixes. Each spawned enemy is drawn uniformly from one preset.
pub const ENEMY_GROUPS: [&[&str]; 3] = [
    &["goon"],
    &["goon", "goon", "goon", "cubeo"],
    &["cubeo", "cubeo", "big_cubeo"],
];

/// Enemy that may replace the group when a room rolls exactly one enemy.
pub const SOLO_SPECIAL: &str = "eyepod";

/// Band that a room of the given area falls in.
pub fn area_band(area: i32) -> &'static AreaBand {
    AREA_BANDS
        .iter()
        .find(|band| band.max_area.map_or(true, |max| area <= max))
        .unwrap_or(&AREA_BANDS[AREA_BANDS.len() - 1])
}

/// What one room should contain, before placement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncounterPlan {
    pub pots: usize,
    pub first_pot_is_chest: bool,
    /// Creature subtypes in spawn order
    pub enemies: Vec<String>,
}

/// Rolls an [`EncounterPlan`] for a room of a given area.
///
/// # Examples
///
/// ```
/// use delve::generation::utils::create_rng;
/// use delve::{EncounterGenerator, GenerationConfig, Generator};
///
/// let config = GenerationConfig::new(1);
/// let mut rng = create_rng(&config);
/// let plan = EncounterGenerator::new(9).generate(&config, &mut rng).unwrap();
/// assert!(plan.enemies.len() <= 1);
/// assert!(plan.pots <= 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EncounterGenerator {
    area: i32,
}

impl EncounterGenerator {
    pub fn new(area: i32) -> Self {
        Self { area }
    }
}

impl Generator<EncounterPlan> for EncounterGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<EncounterPlan> {
        let band = area_band(self.area);
        let enemy_count = band.enemy_counts.choose(rng).copied().unwrap_or(0);
        let pots = band.pot_counts.choose(rng).copied().unwrap_or(0);
        let first_pot_is_chest = rng.gen_bool(config.chest_chance.clamp(0.0, 1.0));

        let solo = [SOLO_SPECIAL];
        let group: &[&str] =
            if enemy_count == 1 && rng.gen_bool(config.solo_special_chance.clamp(0.0, 1.0)) {
                &solo[..]
            } else {
                ENEMY_GROUPS.choose(rng).copied().unwrap_or(&["goon"])
            };

        let enemies = (0..enemy_count)
            .filter_map(|_| group.choose(rng).map(|subtype| subtype.to_string()))
            .collect();

        let plan = EncounterPlan {
            pots,
            first_pot_is_chest,
            enemies,
        };
        self.validate(&plan, config)?;
        Ok(plan)
    }

    fn validate(&self, plan: &EncounterPlan, _config: &GenerationConfig) -> DelveResult<()> {
        let band = area_band(self.area);
        let max_enemies = band.enemy_counts.iter().copied().max().unwrap_or(0);
        let max_pots = band.pot_counts.iter().copied().max().unwrap_or(0);
        if plan.enemies.len() > max_enemies || plan.pots > max_pots {
            return Err(DelveError::GenerationFailed(format!(
                "encounter for area {} exceeds its band ({} enemies, {} pots)",
                self.area,
                plan.enemies.len(),
                plan.pots
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "encounter"
    }
}
