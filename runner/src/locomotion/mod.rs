/*!
Avatar locomotion: the runner's state machine and per-tick physics.

The avatar only reads the track. Everything it wants to tell the outside world (mode
changes, committed turns, the crash) goes into an outbox drained by the driver with
[`AvatarLocomotion::drain_events`].

Per-tick order
1. Fall check with the long probe; no ground means the run is over.
2. Speed ramp toward the cap, gravity from the new speed.
3. Forward displacement.
4. Vertical: hold on the ground when descending onto it, otherwise integrate gravity.
5. Strafe from the held axis.
6. Optional lateral boundary clamp.
7. Obstacle overlap against the current envelope.
8. Ground/air mode bookkeeping.
*/

pub mod probe;
pub mod state;

pub use state::{AvatarEvent, AvatarState, CrashCause, Mode};

use shared::{Heading, SurfaceClass, TurnDirection, Vec3};

use crate::config::LocomotionConfig;
use crate::track::{TrackState, TurnQuery};

/// What a turn command did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnOutcome {
    Committed(Heading),
    /// No matching turn in reach; the avatar crashed.
    Missed,
    /// The avatar is no longer accepting commands.
    Ignored,
}

pub struct AvatarLocomotion {
    config: LocomotionConfig,
    state: AvatarState,
    outbox: Vec<AvatarEvent>,
}

impl AvatarLocomotion {
    pub fn new(config: LocomotionConfig, position: Vec3, heading: Heading) -> Self {
        let state = AvatarState::new(
            position,
            heading,
            config.initial_speed,
            config.initial_gravity,
        );
        Self {
            config,
            state,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &AvatarState {
        &self.state
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn drain_events(&mut self) -> Vec<AvatarEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn envelope_half_extents(&self) -> Vec3 {
        probe::envelope_half_extents(&self.config, self.state.mode == Mode::Sliding)
    }

    /// Centre of the current envelope.
    pub fn envelope_center(&self) -> Vec3 {
        self.state.position + Vec3::new(0.0, self.envelope_half_extents().y, 0.0)
    }

    fn enter(&mut self, mode: Mode) {
        if self.state.mode != mode {
            self.state.mode = mode;
            self.outbox.push(AvatarEvent::ModeEntered(mode));
        }
    }

    pub(crate) fn crash(&mut self, cause: CrashCause) {
        if self.state.mode.is_terminal() {
            return;
        }
        log::info!(
            "avatar crashed ({cause:?}) at ({:.2}, {:.2}, {:.2})",
            self.state.position.x,
            self.state.position.y,
            self.state.position.z
        );
        self.state.mode = Mode::Crashed;
        self.outbox.push(AvatarEvent::Crashed(cause));
    }

    /// Commit a turn on the segment under the avatar, or crash trying.
    pub fn request_turn(&mut self, direction: TurnDirection, track: &TrackState) -> TurnOutcome {
        if self.state.mode.is_terminal() {
            log::warn!("turn {direction:?} ignored: avatar has crashed");
            return TurnOutcome::Ignored;
        }

        match track.query_turn(self.envelope_center(), self.config.turn_query_radius, direction) {
            TurnQuery::Found { pivot, segment, .. } => {
                let heading = self.state.heading.rotated(direction);
                self.state.position.x = pivot.x;
                self.state.position.z = pivot.z;
                self.state.heading = heading;
                self.state.lateral_offset = 0.0;
                log::info!("turn {direction:?} on segment {segment}, now heading {heading:?}");
                self.outbox.push(AvatarEvent::TurnCommitted { heading, pivot });
                TurnOutcome::Committed(heading)
            }
            TurnQuery::NotFound => {
                self.crash(CrashCause::MissedTurn);
                TurnOutcome::Missed
            }
        }
    }

    /// Jump if grounded. Cancels a slide in progress.
    pub fn jump(&mut self) -> bool {
        if !matches!(self.state.mode, Mode::Running | Mode::Sliding) || !self.state.grounded {
            log::debug!("jump ignored in {:?}", self.state.mode);
            return false;
        }
        self.state.vertical_velocity = (self.config.jump_height * self.state.gravity * -3.0).sqrt();
        self.state.grounded = false;
        self.enter(Mode::Jumping);
        true
    }

    pub fn slide(&mut self) -> bool {
        if self.state.mode != Mode::Running || !self.state.grounded {
            log::debug!("slide ignored in {:?}", self.state.mode);
            return false;
        }
        self.enter(Mode::Sliding);
        true
    }

    /// Slide duration elapsed.
    pub fn end_slide(&mut self) {
        if self.state.mode == Mode::Sliding {
            self.enter(Mode::Running);
        }
    }

    /// Jump duration elapsed.
    pub fn end_jump(&mut self) {
        if self.state.mode == Mode::Jumping {
            let next = if self.state.grounded {
                Mode::Running
            } else {
                Mode::Airborne
            };
            self.enter(next);
        }
    }

    fn ground_gap(&self, track: &TrackState, length: f32) -> Option<f32> {
        probe::ground_gap(
            track,
            &self.config,
            self.state.position,
            self.state.heading,
            length,
        )
    }

    /// Advance one tick. `strafe` is the held lateral axis in `[-1, 1]`, positive right.
    pub fn step(&mut self, dt: f32, strafe: f32, track: &TrackState) {
        if self.state.mode.is_terminal() {
            return;
        }
        let dt = dt.max(0.0);
        let cfg = self.config.clone();

        // 1) Fall check.
        if self.ground_gap(track, cfg.fall_probe_length).is_none() {
            self.crash(CrashCause::Fell);
            return;
        }

        // 2) Speed ramp, then gravity from the new speed.
        let speed = (self.state.forward_speed + cfg.speed_ramp_rate * dt).min(cfg.max_speed);
        self.state.forward_speed = speed;
        self.state.gravity = cfg.initial_gravity - cfg.gravity_per_speed * (speed - cfg.initial_speed);

        // 3) Forward.
        self.state.position += self.state.heading.vector() * (speed * dt);

        // 4) Vertical.
        match self.ground_gap(track, cfg.ground_probe_length) {
            Some(gap) if self.state.vertical_velocity <= 0.0 => {
                self.state.vertical_velocity = 0.0;
                self.state.position.y -= gap;
            }
            _ => {
                self.state.vertical_velocity += self.state.gravity * dt;
                let mut dy = self.state.vertical_velocity * dt;
                if dy < 0.0 {
                    // Never sink through ground that is closer than this tick's drop.
                    let below = self.ground_gap(track, cfg.fall_probe_length);
                    if let Some(gap) = below.filter(|gap| -dy > *gap) {
                        dy = -gap;
                        self.state.vertical_velocity = 0.0;
                    }
                }
                self.state.position.y += dy;
            }
        }

        // 5) Strafe.
        let right = self.state.heading.right();
        let lateral = strafe.clamp(-1.0, 1.0) * cfg.lateral_speed * dt;
        self.state.position += right * lateral;
        self.state.lateral_offset += lateral;

        // 6) Boundary.
        let offset = self.state.lateral_offset;
        if cfg.enforce_lateral_limit && offset.abs() > cfg.lateral_limit {
            let clamped = offset.clamp(-cfg.lateral_limit, cfg.lateral_limit);
            self.state.position -= right * (offset - clamped);
            self.state.lateral_offset = clamped;
        }

        // 7) Obstacles.
        let touching = track.touching(
            self.state.position,
            self.envelope_half_extents(),
            SurfaceClass::Obstacle,
        );
        if let Some(obstacle) = touching.first() {
            log::debug!("hit obstacle {obstacle}");
            self.crash(CrashCause::Obstacle);
            return;
        }

        // 8) Modes.
        let grounded = self.state.vertical_velocity <= 0.0
            && self.ground_gap(track, cfg.ground_probe_length).is_some();
        self.state.grounded = grounded;
        match self.state.mode {
            Mode::Running if !grounded => self.enter(Mode::Airborne),
            Mode::Airborne if grounded => self.enter(Mode::Running),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDef, SegmentClass, SegmentTemplate};
    use std::sync::Arc;

    const DT: f32 = 1.0 / 60.0;

    fn tile(class: SegmentClass) -> Arc<SegmentTemplate> {
        Arc::new(SegmentTemplate::new("t", class, [4.0, 0.5, 4.0]))
    }

    /// Straight tiles from z = 0 to z = 4 * (count - 1).
    fn corridor(count: usize) -> TrackState {
        let mut track = TrackState::new();
        for i in 0..count {
            track.push_segment(
                tile(SegmentClass::Straight),
                Vec3::new(0.0, 0.0, 4.0 * i as f32),
                Heading::PosZ,
            );
        }
        track.commit();
        track
    }

    fn avatar() -> AvatarLocomotion {
        AvatarLocomotion::new(LocomotionConfig::default(), Vec3::zeros(), Heading::PosZ)
    }

    fn run(avatar: &mut AvatarLocomotion, track: &TrackState, secs: f32) {
        for _ in 0..(secs / DT).round() as usize {
            avatar.step(DT, 0.0, track);
        }
    }

    #[test]
    fn runs_forward_and_stays_grounded() {
        let track = corridor(20);
        let mut a = avatar();
        run(&mut a, &track, 2.0);
        assert_eq!(a.mode(), Mode::Running);
        assert!(a.state().grounded);
        assert!(a.state().position.z > 7.9);
        assert!(a.state().position.y.abs() < 1.0e-4);
        assert!(a.drain_events().is_empty());
    }

    #[test]
    fn speed_is_monotonic_and_capped() {
        let track = corridor(2);
        let cfg = LocomotionConfig {
            speed_ramp_rate: 50.0,
            ..LocomotionConfig::default()
        };
        let mut a = AvatarLocomotion::new(cfg, Vec3::zeros(), Heading::PosZ);
        let mut last = a.state().forward_speed;
        for _ in 0..60 {
            // Keep it on the tile; only the speed matters here.
            a.state.position = Vec3::zeros();
            a.step(DT, 0.0, &track);
            let speed = a.state().forward_speed;
            assert!(speed >= last);
            assert!(speed <= 30.0);
            last = speed;
        }
        assert_eq!(last, 30.0);
    }

    #[test]
    fn gravity_steepens_with_speed() {
        let track = corridor(2);
        let cfg = LocomotionConfig {
            speed_ramp_rate: 10.0,
            gravity_per_speed: 0.5,
            ..LocomotionConfig::default()
        };
        let mut a = AvatarLocomotion::new(cfg, Vec3::zeros(), Heading::PosZ);
        a.state.position = Vec3::zeros();
        a.step(0.1, 0.0, &track);
        // One m/s faster, half a m/s² steeper.
        assert!((a.state().gravity - (-9.81 - 0.5)).abs() < 1.0e-4);
    }

    #[test]
    fn jump_clears_and_lands() {
        let track = corridor(30);
        let mut a = avatar();
        assert!(a.jump());
        assert_eq!(a.drain_events(), vec![AvatarEvent::ModeEntered(Mode::Jumping)]);
        assert!(!a.jump());

        let mut peak: f32 = 0.0;
        for _ in 0..90 {
            a.step(DT, 0.0, &track);
            peak = peak.max(a.state().position.y);
        }
        // v = sqrt(3 g h) peaks at 1.5 h.
        assert!(peak > 1.3 && peak < 1.6, "peak {peak}");
        assert!(a.state().grounded);
        assert!(a.state().position.y.abs() < 1.0e-4);
        assert_eq!(a.mode(), Mode::Jumping);

        a.end_jump();
        assert_eq!(a.mode(), Mode::Running);
    }

    #[test]
    fn slide_requires_running_and_reverts() {
        let mut a = avatar();
        assert!(a.slide());
        assert!(!a.slide());
        assert_eq!(a.envelope_half_extents().y, 0.5);
        a.end_slide();
        assert_eq!(a.mode(), Mode::Running);
        assert_eq!(a.envelope_half_extents().y, 1.0);
    }

    #[test]
    fn jump_cancels_slide() {
        let mut a = avatar();
        a.slide();
        assert!(a.jump());
        assert_eq!(a.mode(), Mode::Jumping);
        assert_eq!(a.envelope_half_extents().y, 1.0);
        a.end_slide();
        assert_eq!(a.mode(), Mode::Jumping);
    }

    #[test]
    fn running_off_the_end_falls() {
        let track = corridor(1);
        let mut a = avatar();
        run(&mut a, &track, 1.0);
        assert_eq!(a.mode(), Mode::Crashed);
        // Airborne for the tick both probes leave the tile, then out of tolerance.
        assert_eq!(
            a.drain_events(),
            vec![
                AvatarEvent::ModeEntered(Mode::Airborne),
                AvatarEvent::Crashed(CrashCause::Fell),
            ]
        );
        // Terminal: further steps and commands do nothing.
        let at = a.state().position;
        a.step(DT, 1.0, &track);
        assert_eq!(a.state().position, at);
        assert!(!a.jump());
        assert_eq!(a.request_turn(TurnDirection::Left, &track), TurnOutcome::Ignored);
        assert!(a.drain_events().is_empty());
    }

    fn with_obstacle(index: usize) -> TrackState {
        let mut track = corridor(10);
        let template = Arc::new(CatalogDef::default().obstacles[index].clone());
        track.push_obstacle(template, Vec3::new(0.0, 0.0, 4.0), shared::Quat::identity());
        track.commit();
        track
    }

    #[test]
    fn hurdle_crashes_a_runner() {
        let track = with_obstacle(0);
        let mut a = avatar();
        run(&mut a, &track, 1.5);
        assert_eq!(a.mode(), Mode::Crashed);
        assert_eq!(a.drain_events(), vec![AvatarEvent::Crashed(CrashCause::Obstacle)]);
    }

    #[test]
    fn hurdle_is_cleared_by_a_jump() {
        let track = with_obstacle(0);
        let mut a = avatar();
        // Take off around z = 2; the hurdle spans 3.8..4.2.
        run(&mut a, &track, 0.5);
        a.jump();
        run(&mut a, &track, 1.5);
        assert_ne!(a.mode(), Mode::Crashed);
        assert!(a.state().position.z > 6.0);
    }

    #[test]
    fn bar_is_cleared_by_a_slide() {
        let track = with_obstacle(1);
        let mut a = avatar();
        run(&mut a, &track, 0.5);
        a.slide();
        run(&mut a, &track, 0.7);
        assert_eq!(a.mode(), Mode::Sliding);
        assert!(a.state().position.z > 4.5);

        let mut b = avatar();
        run(&mut b, &track, 1.5);
        assert_eq!(b.mode(), Mode::Crashed);
    }

    #[test]
    fn strafe_and_optional_limit() {
        let track = corridor(10);
        let mut a = avatar();
        for _ in 0..36 {
            a.step(DT, 1.0, &track);
        }
        // Right of +Z is -X. Unenforced, the limit is only measured.
        assert!((a.state().position.x + 1.8).abs() < 1.0e-3);
        assert!((a.state().lateral_offset - 1.8).abs() < 1.0e-3);
        assert_eq!(a.mode(), Mode::Running);

        let cfg = LocomotionConfig {
            enforce_lateral_limit: true,
            ..LocomotionConfig::default()
        };
        let mut b = AvatarLocomotion::new(cfg, Vec3::zeros(), Heading::PosZ);
        for _ in 0..60 {
            b.step(DT, -1.0, &track);
        }
        assert!((b.state().position.x - 1.5).abs() < 1.0e-4);
        assert!((b.state().lateral_offset + 1.5).abs() < 1.0e-4);
    }

    #[test]
    fn turn_snaps_to_pivot() {
        let mut track = TrackState::new();
        track.push_segment(tile(SegmentClass::Straight), Vec3::new(5.0, 0.0, 6.0), Heading::PosZ);
        track.push_segment(tile(SegmentClass::TurnLeft), Vec3::new(5.0, 0.0, 10.0), Heading::PosZ);
        track.commit();

        let mut a = AvatarLocomotion::new(
            LocomotionConfig::default(),
            Vec3::new(5.3, 0.0, 9.0),
            Heading::PosZ,
        );
        assert_eq!(
            a.request_turn(TurnDirection::Left, &track),
            TurnOutcome::Committed(Heading::PosX)
        );
        assert_eq!(a.state().position, Vec3::new(5.0, 0.0, 10.0));
        assert_eq!(a.state().heading, Heading::PosX);
        assert_eq!(
            a.drain_events(),
            vec![AvatarEvent::TurnCommitted {
                heading: Heading::PosX,
                pivot: Vec3::new(5.0, 0.0, 10.0),
            }]
        );
    }

    #[test]
    fn wrong_direction_is_a_missed_turn() {
        let mut track = TrackState::new();
        track.push_segment(tile(SegmentClass::TurnLeft), Vec3::zeros(), Heading::PosZ);
        track.commit();

        let mut a = avatar();
        assert_eq!(a.request_turn(TurnDirection::Right, &track), TurnOutcome::Missed);
        assert_eq!(a.mode(), Mode::Crashed);
        assert_eq!(a.drain_events(), vec![AvatarEvent::Crashed(CrashCause::MissedTurn)]);
    }

    #[test]
    fn leaving_the_ground_without_a_jump_is_airborne() {
        let track = corridor(3);
        let mut a = avatar();
        a.state.position.y = 0.5;
        a.step(DT, 0.0, &track);
        assert_eq!(a.mode(), Mode::Airborne);
        run(&mut a, &track, 0.5);
        assert_eq!(a.mode(), Mode::Running);
        assert_eq!(
            a.drain_events(),
            vec![
                AvatarEvent::ModeEntered(Mode::Airborne),
                AvatarEvent::ModeEntered(Mode::Running),
            ]
        );
    }
}
