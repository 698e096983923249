/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-5;

/// Minimum `normal.y` for a ray hit to count as walkable ground.
///
/// Track slabs are flat, so anything steeper is the side face of a slab or obstacle.
pub const MIN_GROUND_NORMAL_Y: f32 = 0.7;
