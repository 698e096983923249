//! Run configuration.
//!
//! Defaults reproduce the shipped tuning. Two knobs exist because two tunings are in use
//! and neither is canonical:
//! - `obstacle_spawn_chance`: `0.5` (default) or `0.2` for a sparser variant.
//! - `obstacle_wave` + `per_segment_obstacles`: whether the delayed periodic wave runs
//!   alongside per-segment placement, instead of it, or not at all.
//!
//! `enforce_lateral_limit` is off by default: the limit is measured but only clamps when enabled.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RunnerError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Seed for the run's random source. `None` picks one from the wall clock.
    pub seed: Option<u64>,
    pub generator: GeneratorConfig,
    pub locomotion: LocomotionConfig,
}

impl RunnerConfig {
    pub fn from_json(text: &str) -> Result<Self, RunnerError> {
        let config: RunnerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        self.locomotion.validate()
    }
}

/// Delayed, periodic obstacle placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleWave {
    /// Seconds after run start before the first attempt.
    pub delay_secs: f32,
    /// Seconds between attempts.
    pub period_secs: f32,
}

impl Default for ObstacleWave {
    fn default() -> Self {
        Self {
            delay_secs: 10.0,
            period_secs: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Straight segments laid before the first turn.
    pub tile_start_count: u32,
    /// Inclusive lower bound of a post-turn straight run.
    pub min_straight: u32,
    /// Exclusive upper bound of a post-turn straight run.
    pub max_straight: u32,
    pub collectible_chance: f32,
    /// Collectibles are offset sideways by up to this many meters either way.
    pub collectible_lateral_range: f32,
    /// Collectibles float between these heights above the segment surface.
    pub collectible_height_min: f32,
    pub collectible_height_max: f32,
    pub obstacle_spawn_chance: f32,
    /// Minimum distance between any two live obstacles.
    pub obstacle_clearance: f32,
    /// Attempt obstacle placement when straight segments are spawned.
    pub per_segment_obstacles: bool,
    pub obstacle_wave: Option<ObstacleWave>,
    /// Pulled off a turn segment's extent when placing the run that leaves it.
    pub turn_margin: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tile_start_count: 10,
            min_straight: 3,
            max_straight: 15,
            collectible_chance: 0.5,
            collectible_lateral_range: 1.5,
            collectible_height_min: 1.0,
            collectible_height_max: 3.0,
            obstacle_spawn_chance: 0.5,
            obstacle_clearance: 1.0,
            per_segment_obstacles: true,
            obstacle_wave: Some(ObstacleWave::default()),
            turn_margin: 2.0,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_straight >= self.max_straight || self.min_straight == 0 {
            return Err(ConfigError::EmptyRunRange {
                min: self.min_straight,
                max: self.max_straight,
            });
        }
        probability("collectible_chance", self.collectible_chance)?;
        probability("obstacle_spawn_chance", self.obstacle_spawn_chance)?;
        positive("obstacle_clearance", self.obstacle_clearance)?;
        non_negative("collectible_lateral_range", self.collectible_lateral_range)?;
        if self.collectible_height_max < self.collectible_height_min {
            return Err(ConfigError::EmptyRange {
                name: "collectible_height",
                min: self.collectible_height_min,
                max: self.collectible_height_max,
            });
        }
        if let Some(wave) = self.obstacle_wave {
            positive("obstacle_wave.delay_secs", wave.delay_secs)?;
            positive("obstacle_wave.period_secs", wave.period_secs)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub initial_speed: f32,
    pub max_speed: f32,
    /// Forward speed gained per second until `max_speed`.
    pub speed_ramp_rate: f32,
    pub jump_height: f32,
    /// Gravity at `initial_speed` (m/s², negative).
    pub initial_gravity: f32,
    /// Extra downward gravity per m/s above `initial_speed`. `0` keeps gravity constant.
    pub gravity_per_speed: f32,
    pub slide_duration: f32,
    pub jump_duration: f32,
    /// Length of the per-tick grounded probe.
    pub ground_probe_length: f32,
    /// Length of the probe that decides the avatar has fallen off the track.
    pub fall_probe_length: f32,
    /// Fore/aft offset of the two ground probes from the avatar's base.
    pub probe_offset: f32,
    /// Probes start this far above the base.
    pub probe_lift: f32,
    pub turn_query_radius: f32,
    /// Standing height of the collision envelope. Halved while sliding.
    pub height: f32,
    pub envelope_width: f32,
    /// Sideways speed at full strafe input (m/s).
    pub lateral_speed: f32,
    pub lateral_limit: f32,
    pub enforce_lateral_limit: bool,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            initial_speed: 4.0,
            max_speed: 30.0,
            speed_ramp_rate: 0.1,
            jump_height: 1.0,
            initial_gravity: -9.81,
            gravity_per_speed: 0.0,
            slide_duration: 1.0,
            jump_duration: 1.9,
            ground_probe_length: 0.2,
            fall_probe_length: 20.0,
            probe_offset: 0.2,
            probe_lift: 0.1,
            turn_query_radius: 0.5,
            height: 2.0,
            envelope_width: 0.8,
            lateral_speed: 3.0,
            lateral_limit: 1.5,
            enforce_lateral_limit: false,
        }
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("initial_speed", self.initial_speed)?;
        if self.max_speed < self.initial_speed {
            return Err(ConfigError::SpeedCapBelowStart {
                initial: self.initial_speed,
                max: self.max_speed,
            });
        }
        if self.initial_gravity >= 0.0 {
            return Err(ConfigError::GravityNotDownward(self.initial_gravity));
        }
        // Speed only ramps up, and gravity only grows stronger with it.
        non_negative("speed_ramp_rate", self.speed_ramp_rate)?;
        non_negative("gravity_per_speed", self.gravity_per_speed)?;
        non_negative("lateral_limit", self.lateral_limit)?;
        positive("jump_height", self.jump_height)?;
        positive("slide_duration", self.slide_duration)?;
        positive("jump_duration", self.jump_duration)?;
        positive("ground_probe_length", self.ground_probe_length)?;
        positive("fall_probe_length", self.fall_probe_length)?;
        positive("turn_query_radius", self.turn_query_radius)?;
        positive("height", self.height)?;
        positive("envelope_width", self.envelope_width)?;
        Ok(())
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAProbability { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
