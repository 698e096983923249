pub mod constants;
pub mod math;
pub mod query_world;
pub mod surface;

pub use nalgebra as na;

pub use constants::{DIST_EPS, MIN_GROUND_NORMAL_Y};
pub use math::{
    Heading, Iso, Point3, Quat, TurnDirection, Vec3, planar_distance_sq, rotated_extent,
    yaw_rotation,
};
pub use query_world::{ColliderShapeDef, PlacementDef, QueryWorld, RayHit};
pub use surface::{LedgerId, SurfaceClass, SurfaceMask, SurfaceTag};
