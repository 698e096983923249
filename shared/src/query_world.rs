//! Rapier-based query world for track geometry.
//!
//! The runner's world changes only when the track ledger changes (a segment is spawned or
//! retired, an obstacle is placed, a collectible is picked up). Rather than patching Rapier
//! sets incrementally, the ledger owner rebuilds a [`QueryWorld`] from a fresh list of
//! [`PlacementDef`]s after each mutation and queries it in between.
//!
//! Design goals
//! - Deterministic: given the same inputs, build identical in-memory sets (sorted by tag).
//! - Query-focused: only what ray casts and overlap tests need. No dynamics are stepped.
//! - Classified: every collider carries a packed [`SurfaceTag`], and every query takes a
//!   [`SurfaceMask`] so ground probes never see pickups and turn checks never see obstacles.

// Re-export Rapier so downstream crates can reach its types without depending on it directly.
pub use rapier3d;

use rapier3d::na::Translation3;
use rapier3d::parry::{query, shape::Shape};
use rapier3d::prelude::*;

use crate::{
    math::{Iso, Point3, Quat, Vec3},
    surface::{SurfaceClass, SurfaceMask, SurfaceTag},
};

/// Canonical definition of one collider in the query world.
#[derive(Clone, Debug)]
pub struct PlacementDef {
    pub tag: SurfaceTag,
    /// World-space centre of the shape.
    pub translation: Vec3,
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
}

/// Supported collider shapes.
///
/// Track geometry is boxes; pickups are balls. Extend as needed.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },
    /// Sphere/ball (meters).
    Sphere { radius: f32 },
}

/// Result of a downward probe.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub tag: SurfaceTag,
    /// Distance from the ray origin to the hit (meters).
    pub distance: f32,
    pub normal: Vec3,
}

/// In-memory Rapier structures needed for scene queries against the current track.
pub struct QueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl Default for QueryWorld {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl QueryWorld {
    /// Build a query world from placement definitions.
    ///
    /// Colliders are inserted without parent bodies; their pose is set directly.
    pub fn build(mut defs: Vec<PlacementDef>) -> Self {
        // Ensure deterministic insertion order.
        defs.sort_by_key(|d| (d.tag.class as u8, d.tag.id));

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut modified_colliders = Vec::with_capacity(defs.len());

        for def in defs {
            let mut collider = collider_from_def(&def);
            let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
            collider.set_position(iso);
            modified_colliders.push(colliders.insert(collider));
        }

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
        }
    }

    /// Number of colliders in the world.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.len() == 0
    }

    /// Create a borrowed `QueryPipeline` view for scene queries.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Cast a ray straight down from `origin`, considering only surfaces in `mask`.
    ///
    /// Returns the closest hit within `max_dist`.
    pub fn cast_down(&self, origin: Vec3, max_dist: f32, mask: SurfaceMask) -> Option<RayHit> {
        if max_dist <= 0.0 {
            return None;
        }

        let predicate = |_handle: ColliderHandle, collider: &Collider| mask.matches(collider.user_data);
        let filter = QueryFilter::default().predicate(&predicate);
        let pipeline = self.query_pipeline(filter);

        let ray = Ray::new(
            Point3::new(origin.x, origin.y, origin.z),
            vector![0.0, -1.0, 0.0],
        );
        let (handle, hit) = pipeline.cast_ray_and_get_normal(&ray, max_dist, true)?;
        let tag = self
            .colliders
            .get(handle)
            .and_then(|c| SurfaceTag::unpack(c.user_data))?;

        Some(RayHit {
            tag,
            distance: hit.time_of_impact,
            normal: hit.normal,
        })
    }

    /// All tagged colliders in `mask` overlapping `shape` placed at `pose`.
    ///
    /// Results are ordered by insertion order, which is deterministic (see [`Self::build`]).
    pub fn overlapping(&self, pose: &Iso, shape: &dyn Shape, mask: SurfaceMask) -> Vec<SurfaceTag> {
        self.colliders
            .iter()
            .filter(|(_, collider)| mask.matches(collider.user_data))
            .filter(|(_, collider)| {
                query::intersection_test(pose, shape, collider.position(), collider.shape())
                    .unwrap_or(false)
            })
            .filter_map(|(_, collider)| SurfaceTag::unpack(collider.user_data))
            .collect()
    }
}

/// Build a Rapier collider from a `PlacementDef`.
///
/// The pose is applied by the caller, so the collider is created with identity local transform.
fn collider_from_def(def: &PlacementDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
    };

    let sensor = matches!(
        def.tag.class,
        SurfaceClass::TurnTrigger | SurfaceClass::Collectible
    );

    builder.sensor(sensor).user_data(def.tag.pack()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::parry::shape::{Ball, Cuboid};

    fn slab(id: u64, center: Vec3) -> PlacementDef {
        PlacementDef {
            tag: SurfaceTag::new(id, SurfaceClass::Ground),
            translation: center,
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 0.25, 2.0),
            },
        }
    }

    fn trigger(id: u64, center: Vec3) -> PlacementDef {
        PlacementDef {
            tag: SurfaceTag::new(id, SurfaceClass::TurnTrigger),
            translation: center,
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 1.5, 2.0),
            },
        }
    }

    #[test]
    fn downward_probe_hits_slab_top() {
        // Slab top surface at y = 0.
        let world = QueryWorld::build(vec![slab(7, Vec3::new(0.0, -0.25, 0.0))]);
        let hit = world
            .cast_down(Vec3::new(0.5, 0.1, 0.5), 0.2, SurfaceMask::only(SurfaceClass::Ground))
            .expect("ground below");
        assert_eq!(hit.tag, SurfaceTag::new(7, SurfaceClass::Ground));
        assert!((hit.distance - 0.1).abs() < 1.0e-4);
        assert!(hit.normal.y > 0.99);
    }

    #[test]
    fn downward_probe_respects_length_and_mask() {
        let world = QueryWorld::build(vec![
            slab(1, Vec3::new(0.0, -0.25, 0.0)),
            trigger(2, Vec3::new(0.0, 1.5, 0.0)),
        ]);
        // Too short to reach the slab.
        assert!(
            world
                .cast_down(Vec3::new(0.0, 1.0, 0.0), 0.2, SurfaceMask::only(SurfaceClass::Ground))
                .is_none()
        );
        // Off the slab entirely.
        assert!(
            world
                .cast_down(Vec3::new(5.0, 0.1, 0.0), 20.0, SurfaceMask::only(SurfaceClass::Ground))
                .is_none()
        );
        // The trigger is ignored by a ground-only probe even though the ray starts inside it.
        let hit = world
            .cast_down(Vec3::new(0.0, 1.0, 0.0), 20.0, SurfaceMask::only(SurfaceClass::Ground))
            .expect("slab");
        assert_eq!(hit.tag.id, 1);
    }

    #[test]
    fn overlap_filters_by_class() {
        let world = QueryWorld::build(vec![
            slab(1, Vec3::new(0.0, -0.25, 0.0)),
            trigger(2, Vec3::new(0.0, 1.5, 0.0)),
        ]);
        let ball = Ball::new(0.5);
        let pose = Iso::translation(0.0, 1.0, 0.0);

        let hits = world.overlapping(&pose, &ball, SurfaceMask::only(SurfaceClass::TurnTrigger));
        assert_eq!(hits, vec![SurfaceTag::new(2, SurfaceClass::TurnTrigger)]);

        let far = Iso::translation(10.0, 1.0, 0.0);
        assert!(
            world
                .overlapping(&far, &ball, SurfaceMask::only(SurfaceClass::TurnTrigger))
                .is_empty()
        );
    }

    #[test]
    fn overlap_with_box_envelope() {
        let world = QueryWorld::build(vec![PlacementDef {
            tag: SurfaceTag::new(9, SurfaceClass::Obstacle),
            translation: Vec3::new(0.0, 1.7, 3.0),
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 0.5, 0.25),
            },
        }]);
        let mask = SurfaceMask::only(SurfaceClass::Obstacle);

        // Standing envelope (0..2 m tall) reaches the bar.
        let standing = Cuboid::new(Vec3::new(0.4, 1.0, 0.4));
        assert_eq!(
            world.overlapping(&Iso::translation(0.0, 1.0, 3.0), &standing, mask).len(),
            1
        );

        // Half-height envelope (0..1 m tall) passes under it.
        let sliding = Cuboid::new(Vec3::new(0.4, 0.5, 0.4));
        assert!(
            world
                .overlapping(&Iso::translation(0.0, 0.5, 3.0), &sliding, mask)
                .is_empty()
        );
    }

    #[test]
    fn empty_world_answers_nothing() {
        let world = QueryWorld::default();
        assert!(world.is_empty());
        assert!(
            world
                .cast_down(Vec3::zeros(), 20.0, SurfaceMask::only(SurfaceClass::Ground))
                .is_none()
        );
    }
}
