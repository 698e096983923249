//! Per-tick driver for one endless run.
//!
//! The coordinator owns every mutable piece of a run (generator and thereby the track,
//! avatar, timers, score) and is the only place they meet. Avatar notifications are
//! pumped after each phase of a tick, so a committed turn regenerates the corridor
//! before anything else looks at the track.

use std::time::{SystemTime, UNIX_EPOCH};

use shared::{LedgerId, SurfaceClass, Vec3};

use crate::catalog::SegmentCatalog;
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::events::{InputFrame, RunEvent, TimerKind};
use crate::generator::CorridorGenerator;
use crate::locomotion::{AvatarEvent, AvatarLocomotion, Mode};
use crate::timer::TimerQueue;
use crate::track::TrackState;

pub struct RunCoordinator {
    config: RunnerConfig,
    catalog: SegmentCatalog,
    seed: u64,
    generator: CorridorGenerator,
    avatar: AvatarLocomotion,
    timers: TimerQueue<TimerKind>,
    score: u32,
    elapsed: f32,
    distance: f32,
    game_over: bool,
    /// Events raised between ticks, e.g. by a pickup.
    pending: Vec<RunEvent>,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

impl RunCoordinator {
    pub fn new(config: RunnerConfig, catalog: SegmentCatalog) -> Result<Self, RunnerError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        let (generator, avatar, timers) = Self::start(&config, &catalog, seed)?;
        Ok(Self {
            config,
            catalog,
            seed,
            generator,
            avatar,
            timers,
            score: 0,
            elapsed: 0.0,
            distance: 0.0,
            game_over: false,
            pending: Vec::new(),
        })
    }

    fn start(
        config: &RunnerConfig,
        catalog: &SegmentCatalog,
        seed: u64,
    ) -> Result<(CorridorGenerator, AvatarLocomotion, TimerQueue<TimerKind>), RunnerError> {
        log::info!("starting run with seed {seed}");
        let generator = CorridorGenerator::seeded(config.generator.clone(), catalog.clone(), seed)?;
        let avatar = AvatarLocomotion::new(
            config.locomotion.clone(),
            Vec3::zeros(),
            generator.track().cursor().direction,
        );

        let mut timers = TimerQueue::new();
        if let Some(wave) = config.generator.obstacle_wave {
            timers.schedule_repeating(wave.delay_secs, wave.period_secs, TimerKind::ObstacleWave);
        }
        Ok((generator, avatar, timers))
    }

    /// Tear the run down and start a fresh one on the next seed.
    pub fn restart(&mut self) -> Result<(), RunnerError> {
        let seed = self.seed.wrapping_add(1);
        let (generator, avatar, timers) = Self::start(&self.config, &self.catalog, seed)?;
        self.seed = seed;
        self.generator = generator;
        self.avatar = avatar;
        self.timers = timers;
        self.score = 0;
        self.elapsed = 0.0;
        self.distance = 0.0;
        self.game_over = false;
        self.pending = vec![
            RunEvent::ScoreChanged { score: 0 },
            RunEvent::ModeEntered(Mode::Running),
        ];
        Ok(())
    }

    /// Advance the run by `dt` seconds.
    ///
    /// Order: commands (turn, jump, slide), then due timers, then the avatar step.
    pub fn tick(&mut self, dt: f32, input: &InputFrame) -> Vec<RunEvent> {
        let dt = dt.max(0.0);
        let mut events = std::mem::take(&mut self.pending);

        if !self.game_over {
            self.elapsed += dt;
        }

        if let Some(direction) = input.turn {
            self.avatar.request_turn(direction, self.generator.track());
            self.pump(&mut events);
        }
        if input.jump {
            self.avatar.jump();
            self.pump(&mut events);
        }
        if input.slide {
            self.avatar.slide();
            self.pump(&mut events);
        }

        for kind in self.timers.advance(dt) {
            match kind {
                TimerKind::SlideEnd => self.avatar.end_slide(),
                TimerKind::JumpEnd => self.avatar.end_jump(),
                TimerKind::ObstacleWave => {
                    if let Err(err) = self.generator.obstacle_wave_attempt() {
                        log::error!("obstacle wave failed: {err}");
                    }
                }
            }
            self.pump(&mut events);
        }

        let before = self.avatar.state().position;
        self.avatar.step(dt, input.strafe, self.generator.track());
        let after = self.avatar.state().position;
        self.distance += shared::planar_distance_sq(&before, &after).sqrt();
        self.pump(&mut events);

        events
    }

    /// React to everything the avatar raised since the last pump.
    fn pump(&mut self, events: &mut Vec<RunEvent>) {
        for event in self.avatar.drain_events() {
            match event {
                AvatarEvent::TurnCommitted { heading, .. } => {
                    events.push(RunEvent::TurnCommitted { heading });
                    if let Err(err) = self.generator.add_new_direction(heading) {
                        log::error!("corridor regeneration failed: {err}");
                    }
                }
                AvatarEvent::ModeEntered(mode) => {
                    match mode {
                        Mode::Sliding => {
                            let secs = self.config.locomotion.slide_duration;
                            self.timers.schedule_once(secs, TimerKind::SlideEnd);
                        }
                        Mode::Jumping => {
                            self.timers.cancel_where(|k| k.is_move_hold());
                            let secs = self.config.locomotion.jump_duration;
                            self.timers.schedule_once(secs, TimerKind::JumpEnd);
                        }
                        _ => {}
                    }
                    events.push(RunEvent::ModeEntered(mode));
                }
                AvatarEvent::Crashed(cause) => {
                    self.timers.cancel_where(|k| k.is_move_hold());
                    events.push(RunEvent::ModeEntered(Mode::Crashed));
                    if !self.game_over {
                        self.game_over = true;
                        log::info!("game over ({cause:?}): score {}", self.score);
                        events.push(RunEvent::GameOver {
                            final_score: self.score,
                            cause,
                        });
                    }
                }
            }
        }
    }

    /// Pick up a collectible. Returns the points awarded.
    pub fn collect(&mut self, id: LedgerId) -> Option<u32> {
        if self.game_over {
            return None;
        }
        let collectible = self.generator.collect(id)?;
        let value = collectible.template.value;
        self.score = self.score.saturating_add(value);
        log::debug!("collected {id} for {value}, score {}", self.score);
        self.pending.push(RunEvent::ScoreChanged { score: self.score });
        Some(value)
    }

    /// Collectibles currently overlapping the avatar's envelope.
    pub fn collectibles_touching_avatar(&self) -> Vec<LedgerId> {
        self.generator.track().touching(
            self.avatar.state().position,
            self.avatar.envelope_half_extents(),
            SurfaceClass::Collectible,
        )
    }

    pub fn track(&self) -> &TrackState {
        self.generator.track()
    }

    pub fn generator(&self) -> &CorridorGenerator {
        &self.generator
    }

    pub fn avatar(&self) -> &AvatarLocomotion {
        &self.avatar
    }

    pub fn timers(&self) -> &TimerQueue<TimerKind> {
        &self.timers
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Seconds of play in this run. Stops at game over.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Planar distance covered by the avatar in this run.
    pub fn distance(&self) -> f32 {
        self.distance
    }
}
