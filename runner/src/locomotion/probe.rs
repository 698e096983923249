//! Ground probes and the avatar's collision envelope.

use shared::{Heading, Vec3};

use crate::config::LocomotionConfig;
use crate::track::TrackState;

/// Half extents of the upright envelope box standing on the avatar's base.
pub fn envelope_half_extents(config: &LocomotionConfig, sliding: bool) -> Vec3 {
    let height = if sliding {
        config.height * 0.5
    } else {
        config.height
    };
    let half_width = config.envelope_width * 0.5;
    Vec3::new(half_width, height * 0.5, half_width)
}

/// Cast the fore and aft probes down from just above `base`.
///
/// Returns the smallest gap between the base and ground under either probe, or `None`
/// when neither probe reaches ground within `length`. A negative gap means the base has
/// sunk below the surface.
pub fn ground_gap(
    track: &TrackState,
    config: &LocomotionConfig,
    base: Vec3,
    heading: Heading,
    length: f32,
) -> Option<f32> {
    let lift = Vec3::new(0.0, config.probe_lift, 0.0);
    let offset = heading.vector() * config.probe_offset;

    [base + lift + offset, base + lift - offset]
        .into_iter()
        .filter_map(|origin| track.probe_ground(origin, length))
        .map(|hit| hit.distance - config.probe_lift)
        .reduce(f32::min)
}
