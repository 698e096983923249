use serde::{Deserialize, Serialize};
use shared::{Heading, TurnDirection};

use crate::locomotion::{CrashCause, Mode};

/// Decoded player commands for one tick.
///
/// `turn`, `jump` and `slide` are edge-triggered: set them only on the tick the command
/// was issued. `strafe` is the held axis value, positive to the right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub turn: Option<TurnDirection>,
    pub jump: bool,
    pub slide: bool,
    pub strafe: f32,
}

impl InputFrame {
    pub fn turn(direction: TurnDirection) -> Self {
        Self {
            turn: Some(direction),
            ..Self::default()
        }
    }

    pub fn jump() -> Self {
        Self {
            jump: true,
            ..Self::default()
        }
    }

    pub fn slide() -> Self {
        Self {
            slide: true,
            ..Self::default()
        }
    }
}

/// What presentation needs to hear about, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    TurnCommitted { heading: Heading },
    ModeEntered(Mode),
    ScoreChanged { score: u32 },
    /// Raised once per run.
    GameOver { final_score: u32, cause: CrashCause },
}

/// Pending timed actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    SlideEnd,
    JumpEnd,
    ObstacleWave,
}

impl TimerKind {
    /// Timers tied to the avatar's current move; dropped on a crash.
    #[inline]
    pub fn is_move_hold(self) -> bool {
        matches!(self, TimerKind::SlideEnd | TimerKind::JumpEnd)
    }
}
