//! Procedural corridor generation.
//!
//! The generator is the only writer of the [`TrackState`] ledger. It lays straight runs
//! capped by a turn, flushes everything behind the turn the avatar just took, and
//! sprinkles obstacles and collectibles along the way. All randomness comes from the
//! injected `rng`, so a fixed seed reproduces a corridor exactly.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shared::{Heading, LedgerId, Vec3};

use crate::catalog::{SegmentCatalog, SegmentClass, SegmentTemplate};
use crate::config::GeneratorConfig;
use crate::error::{CatalogError, RunnerError};
use crate::track::{LiveCollectible, TrackState};

/// Why an obstacle candidate was not placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementRejection {
    /// The ledger is empty.
    NoSegment,
    /// The most recent segment is a turn; turns never carry obstacles.
    TurnSegment,
    /// Another live obstacle is closer than the configured clearance.
    Clearance { distance: f32 },
}

/// Outcome of one obstacle placement attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    Accepted(LedgerId),
    Rejected(PlacementRejection),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    pub segments_spawned: u64,
    pub segments_retired: u64,
    pub obstacles_placed: u64,
    pub obstacles_rejected: u64,
    pub collectibles_placed: u64,
    /// Times the periodic obstacle wave ran.
    pub wave_attempts: u64,
    pub turns_handled: u64,
}

pub struct CorridorGenerator<R: Rng = ChaCha8Rng> {
    config: GeneratorConfig,
    catalog: SegmentCatalog,
    rng: R,
    track: TrackState,
    stats: GeneratorStats,
}

impl CorridorGenerator<ChaCha8Rng> {
    pub fn seeded(
        config: GeneratorConfig,
        catalog: SegmentCatalog,
        seed: u64,
    ) -> Result<Self, RunnerError> {
        Self::new(config, catalog, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> CorridorGenerator<R> {
    /// Validate `config` and lay the opening stretch: `tile_start_count` straights (the first
    /// one obstacle-free) closed off by a random turn.
    pub fn new(config: GeneratorConfig, catalog: SegmentCatalog, rng: R) -> Result<Self, RunnerError> {
        config.validate()?;

        let mut generator = Self {
            config,
            catalog,
            rng,
            track: TrackState::new(),
            stats: GeneratorStats::default(),
        };

        for i in 0..generator.config.tile_start_count {
            let base = generator.catalog.base_tile().clone();
            generator.spawn(base, i > 0)?;
        }
        let turn = generator.catalog.random_turn(&mut generator.rng)?.clone();
        generator.spawn(turn, false)?;
        generator.track.commit();

        log::info!(
            "corridor initialized: {} segments, {} obstacles",
            generator.track.segment_count(),
            generator.track.obstacles().len()
        );
        Ok(generator)
    }

    pub fn track(&self) -> &TrackState {
        &self.track
    }

    #[cfg(test)]
    pub(crate) fn track_mut(&mut self) -> &mut TrackState {
        &mut self.track
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    /// Place `template` at the cursor and commit the ledger.
    pub fn spawn_segment(
        &mut self,
        template: Arc<SegmentTemplate>,
        place_obstacle: bool,
    ) -> Result<LedgerId, CatalogError> {
        let id = self.spawn(template, place_obstacle)?;
        self.track.commit();
        Ok(id)
    }

    fn spawn(&mut self, template: Arc<SegmentTemplate>, place_obstacle: bool) -> Result<LedgerId, CatalogError> {
        let cursor = self.track.cursor();
        let class = template.class;
        let id = self.track.push_segment(template, cursor.position, cursor.direction);
        self.stats.segments_spawned += 1;

        if place_obstacle && self.config.per_segment_obstacles && !class.is_turn() {
            self.place_obstacles()?;
        }

        if self.rng.gen_bool(f64::from(self.config.collectible_chance)) {
            self.place_collectible(id)?;
        }

        // Turns are left through `add_new_direction`, never by a plain advance.
        if class == SegmentClass::Straight {
            if let Some(segment) = self.track.newest_segment() {
                let advance = segment.world_extent().component_mul(&cursor.direction.vector());
                self.track.cursor_mut().position += advance;
            }
        }
        Ok(id)
    }

    /// Scan the live ledger, attempting one obstacle per segment at the newest segment's
    /// position. The scan ends at the first failed spawn roll.
    fn place_obstacles(&mut self) -> Result<Vec<Placement>, CatalogError> {
        let Some(newest) = self.track.newest_segment() else {
            return Ok(vec![Placement::Rejected(PlacementRejection::NoSegment)]);
        };
        if newest.class().is_turn() {
            return Ok(vec![Placement::Rejected(PlacementRejection::TurnSegment)]);
        }

        let position = newest.position;
        let rotation = newest.heading().unwrap_or(self.track.cursor().direction).rotation();
        let candidates = self.track.segment_count();
        let chance = f64::from(self.config.obstacle_spawn_chance);

        let mut placements = Vec::new();
        for _ in 0..candidates {
            if !self.rng.gen_bool(chance) {
                break;
            }
            let template = self.catalog.random_obstacle(&mut self.rng)?.clone();

            let nearest = self
                .track
                .obstacles()
                .iter()
                .map(|o| (o.position - position).norm())
                .fold(f32::INFINITY, f32::min);

            let placement = if nearest < self.config.obstacle_clearance {
                self.stats.obstacles_rejected += 1;
                Placement::Rejected(PlacementRejection::Clearance { distance: nearest })
            } else {
                let id = self.track.push_obstacle(template, position, rotation);
                self.stats.obstacles_placed += 1;
                log::debug!("obstacle {id} placed at ({:.1}, {:.1})", position.x, position.z);
                Placement::Accepted(id)
            };
            placements.push(placement);
        }
        Ok(placements)
    }

    fn place_collectible(&mut self, segment: LedgerId) -> Result<(), CatalogError> {
        let template = self.catalog.random_collectible(&mut self.rng)?.clone();
        let Some(segment) = self.track.segment(segment) else {
            return Ok(());
        };
        let (base, heading) = (segment.position, segment.heading().unwrap_or_default());

        let range = self.config.collectible_lateral_range;
        let lateral = self.rng.gen_range(-range..=range);
        let height = self
            .rng
            .gen_range(self.config.collectible_height_min..=self.config.collectible_height_max);
        let position = base + heading.right() * lateral + Vec3::new(0.0, height, 0.0);

        self.track.push_collectible(template, position);
        self.stats.collectibles_placed += 1;
        Ok(())
    }

    /// One run of the periodic obstacle wave.
    pub fn obstacle_wave_attempt(&mut self) -> Result<Vec<Placement>, CatalogError> {
        self.stats.wave_attempts += 1;
        let placements = self.place_obstacles()?;
        self.track.commit();
        Ok(placements)
    }

    /// React to a committed turn: keep only the turn segment as anchor, then lay a fresh
    /// run heading `direction` and cap it with a new turn. Returns the run length.
    pub fn add_new_direction(&mut self, direction: Heading) -> Result<u32, CatalogError> {
        self.track.cursor_mut().direction = direction;

        let retired = self.track.retire_all_but_newest();
        self.track.clear_obstacles();
        self.track.clear_collectibles();
        self.stats.segments_retired += retired as u64;

        if let Some(anchor) = self.track.newest_segment() {
            let half_depth = self.catalog.base_tile_depth() * 0.5;
            let extent = anchor.world_extent();
            let reach = if anchor.class() == SegmentClass::LateralShift {
                extent.add_scalar(half_depth)
            } else {
                extent.add_scalar(half_depth - self.config.turn_margin)
            };
            self.track.cursor_mut().position += reach.component_mul(&direction.vector());
        }

        let run_length = self
            .rng
            .gen_range(self.config.min_straight..self.config.max_straight);
        for i in 0..run_length {
            let base = self.catalog.base_tile().clone();
            self.spawn(base, i > 0)?;
        }
        let turn = self.catalog.random_turn(&mut self.rng)?.clone();
        self.spawn(turn, false)?;
        self.track.commit();
        self.stats.turns_handled += 1;

        log::debug!("new run heading {direction:?}: {run_length} straights, {retired} retired");
        Ok(run_length)
    }

    /// Remove a collectible picked up by the avatar.
    pub fn collect(&mut self, id: LedgerId) -> Option<LiveCollectible> {
        let collectible = self.track.remove_collectible(id)?;
        self.track.commit();
        Some(collectible)
    }
}
