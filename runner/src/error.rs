use thiserror::Error;

/// Startup-time problems with the template catalog.
///
/// All of these are fatal misconfiguration: a run cannot start without a usable catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A random selection was asked to pick from an empty list.
    #[error("no {0} template available")]
    Empty(&'static str),
    /// The first straight template must be classified STRAIGHT; it defines the base tile.
    #[error("base tile must be a straight segment, got {0:?}")]
    BaseTileNotStraight(crate::catalog::SegmentClass),
    /// The turn list may only hold turn-class templates.
    #[error("turn list contains a non-turn template at index {0}")]
    NotATurn(usize),
    /// Extents must be strictly positive on every axis.
    #[error("template `{0}` has a non-positive extent")]
    BadExtent(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("straight run range is empty: min {min} >= max {max}")]
    EmptyRunRange { min: u32, max: u32 },
    #[error("`{name}` range is empty: min {min} > max {max}")]
    EmptyRange { name: &'static str, min: f32, max: f32 },
    #[error("`{name}` must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("`{name}` must be within [0, 1], got {value}")]
    NotAProbability { name: &'static str, value: f32 },
    #[error("`{name}` must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("max speed {max} is below initial speed {initial}")]
    SpeedCapBelowStart { initial: f32, max: f32 },
    #[error("gravity must point down (negative), got {0}")]
    GravityNotDownward(f32),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to parse definition: {0}")]
    Parse(#[from] serde_json::Error),
}
