use serde::{Deserialize, Serialize};
use shared::{Heading, Quat, Vec3};

/// Avatar movement mode. `Crashed` is terminal for the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Running,
    Sliding,
    Jumping,
    /// Off the ground without a jump in progress.
    Airborne,
    Crashed,
}

impl Mode {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Mode::Crashed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashCause {
    /// Overlapped an obstacle.
    Obstacle,
    /// No ground within the fall tolerance.
    Fell,
    /// Turned where no matching turn segment was in reach.
    MissedTurn,
}

/// Notifications raised by the avatar, drained by whoever drives it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AvatarEvent {
    ModeEntered(Mode),
    TurnCommitted { heading: Heading, pivot: Vec3 },
    Crashed(CrashCause),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AvatarState {
    /// Base (feet) point.
    pub position: Vec3,
    pub heading: Heading,
    pub vertical_velocity: f32,
    pub forward_speed: f32,
    pub gravity: f32,
    pub grounded: bool,
    /// Sideways displacement since the last committed turn, positive to the right.
    pub lateral_offset: f32,
    pub mode: Mode,
}

impl AvatarState {
    pub fn new(position: Vec3, heading: Heading, forward_speed: f32, gravity: f32) -> Self {
        Self {
            position,
            heading,
            vertical_velocity: 0.0,
            forward_speed,
            gravity,
            grounded: true,
            lateral_offset: 0.0,
            mode: Mode::Running,
        }
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        self.heading.rotation()
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.heading.vector()
    }
}
