//! Simulation (nalgebra) to render (glam) conversions. Both are right-handed with +Y up.

use bevy::prelude::*;

#[inline]
pub fn vec3(v: &shared::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn quat(q: &shared::Quat) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[inline]
pub fn heading_rotation(heading: shared::Heading) -> Quat {
    Quat::from_rotation_y(heading.yaw())
}
