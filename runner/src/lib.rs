pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod generator;
pub mod locomotion;
pub mod timer;
pub mod track;

pub use catalog::{CatalogDef, SegmentCatalog, SegmentClass, SegmentTemplate};
pub use config::{GeneratorConfig, LocomotionConfig, ObstacleWave, RunnerConfig};
pub use coordinator::RunCoordinator;
pub use error::{CatalogError, ConfigError, RunnerError};
pub use events::{InputFrame, RunEvent, TimerKind};
pub use generator::{CorridorGenerator, GeneratorStats, Placement, PlacementRejection};
pub use locomotion::{AvatarLocomotion, AvatarState, CrashCause, Mode, TurnOutcome};
pub use timer::{TimerId, TimerQueue};
pub use track::{GenerationCursor, LiveCollectible, LiveObstacle, LiveSegment, TrackState, TurnQuery};

pub use shared::{Heading, TurnDirection};
