/*!
Math aliases and the cardinal heading model.

Conventions
- Right-handed, +Y up, meters.
- Yaw is a rotation about +Y. A yaw of `0` faces +Z; `R_y(yaw) * +Z = (sin yaw, 0, cos yaw)`.
- Turning right is a clockwise rotation seen from above, i.e. a negative yaw delta.
  A runner facing +Z has -X on its right-hand side.
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// One of the four axis-aligned forward directions a run can take.
///
/// Every turn is exactly ±90°, so the direction of travel is always one of these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    #[default]
    PosZ,
    NegX,
    NegZ,
    PosX,
}

impl Heading {
    /// Unit vector along the heading.
    #[inline]
    pub fn vector(self) -> Vec3 {
        match self {
            Heading::PosZ => Vec3::new(0.0, 0.0, 1.0),
            Heading::NegX => Vec3::new(-1.0, 0.0, 0.0),
            Heading::NegZ => Vec3::new(0.0, 0.0, -1.0),
            Heading::PosX => Vec3::new(1.0, 0.0, 0.0),
        }
    }

    /// Yaw (radians) that rotates +Z onto this heading.
    #[inline]
    pub fn yaw(self) -> f32 {
        match self {
            Heading::PosZ => 0.0,
            Heading::PosX => FRAC_PI_2,
            Heading::NegZ => std::f32::consts::PI,
            Heading::NegX => -FRAC_PI_2,
        }
    }

    #[inline]
    pub fn rotation(self) -> Quat {
        yaw_rotation(self.yaw())
    }

    /// Unit vector pointing to the runner's right-hand side.
    #[inline]
    pub fn right(self) -> Vec3 {
        self.rotated(TurnDirection::Right).vector()
    }

    /// Heading after a 90° turn.
    pub fn rotated(self, turn: TurnDirection) -> Heading {
        // Clockwise order seen from above.
        const CW: [Heading; 4] = [Heading::PosZ, Heading::NegX, Heading::NegZ, Heading::PosX];
        let idx = CW.iter().position(|h| *h == self).unwrap_or(0);
        let next = match turn {
            TurnDirection::Right => (idx + 1) % 4,
            TurnDirection::Left => (idx + 3) % 4,
        };
        CW[next]
    }

    /// Snap an arbitrary planar vector to the nearest cardinal heading.
    ///
    /// Returns `None` for vectors with no planar component.
    pub fn from_vector(v: Vec3) -> Option<Heading> {
        if v.x.abs() <= crate::DIST_EPS && v.z.abs() <= crate::DIST_EPS {
            return None;
        }
        Some(if v.z.abs() >= v.x.abs() {
            if v.z >= 0.0 { Heading::PosZ } else { Heading::NegZ }
        } else if v.x >= 0.0 {
            Heading::PosX
        } else {
            Heading::NegX
        })
    }
}

/// A discrete turn command.
///
/// The numeric value follows the input axis convention: left is `-1`, right is `+1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    #[inline]
    pub fn value(self) -> f32 {
        match self {
            TurnDirection::Left => -1.0,
            TurnDirection::Right => 1.0,
        }
    }

    /// Decode an axis value. Anything that is not clearly left or right is ignored.
    pub fn from_value(value: f32) -> Option<TurnDirection> {
        if value <= -0.5 {
            Some(TurnDirection::Left)
        } else if value >= 0.5 {
            Some(TurnDirection::Right)
        } else {
            None
        }
    }

    /// Yaw delta (radians) applied by this turn.
    #[inline]
    pub fn yaw_delta(self) -> f32 {
        -FRAC_PI_2 * self.value()
    }
}

/// Yaw-only rotation about +Y.
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_axis_angle(&na::Vector3::y_axis(), yaw)
}

/// World-space axis-aligned size of a box with local `extent` under `rotation`.
pub fn rotated_extent(extent: Vec3, rotation: &Quat) -> Vec3 {
    let m = rotation.to_rotation_matrix();
    let m = m.matrix();
    Vec3::new(
        m[(0, 0)].abs() * extent.x + m[(0, 1)].abs() * extent.y + m[(0, 2)].abs() * extent.z,
        m[(1, 0)].abs() * extent.x + m[(1, 1)].abs() * extent.y + m[(1, 2)].abs() * extent.z,
        m[(2, 0)].abs() * extent.x + m[(2, 1)].abs() * extent.y + m[(2, 2)].abs() * extent.z,
    )
}

/// Planar (XZ) distance squared between two world positions (meters^2).
#[inline]
pub fn planar_distance_sq(a: &Vec3, b: &Vec3) -> f32 {
    let x = b.x - a.x;
    let z = b.z - a.z;
    x * x + z * z
}
