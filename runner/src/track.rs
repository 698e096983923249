/*!
Track ledger: the live segments, obstacles and collectibles, plus the generation cursor.

Only the corridor generator mutates a [`TrackState`]; everyone else reads it. Mutations mark
the ledger dirty and the owner calls [`TrackState::commit`] once its operation is complete,
which rebuilds the collision query world. Queries between commits therefore always see a
whole operation's result, never half of it.

Geometry
- A segment's `position` is the centre of its walkable top surface.
- Its ground slab hangs below that surface with the template's extent.
- Turn-class segments add a trigger volume over their footprint.
*/

use std::collections::VecDeque;
use std::sync::Arc;

use shared::{
    ColliderShapeDef, Heading, Iso, LedgerId, PlacementDef, Quat, QueryWorld, RayHit,
    SurfaceClass, SurfaceMask, SurfaceTag, Vec3, na, rotated_extent, yaw_rotation,
};

use crate::catalog::{CollectibleTemplate, ObstacleTemplate, SegmentClass, SegmentTemplate};

#[derive(Clone, Debug)]
pub struct LiveSegment {
    pub id: LedgerId,
    pub template: Arc<SegmentTemplate>,
    pub position: Vec3,
    pub orientation: Quat,
    /// Spawn order; retirement is oldest-first.
    pub insertion_order: u64,
}

impl LiveSegment {
    #[inline]
    pub fn class(&self) -> SegmentClass {
        self.template.class
    }

    /// Axis-aligned world-space size.
    pub fn world_extent(&self) -> Vec3 {
        rotated_extent(self.template.extent(), &self.orientation)
    }

    /// Direction of travel along the segment, derived from its orientation.
    pub fn forward(&self) -> Vec3 {
        let placement = self.orientation * yaw_rotation(self.template.intrinsic_yaw()).inverse();
        placement * Vec3::z()
    }

    pub fn heading(&self) -> Option<Heading> {
        Heading::from_vector(self.forward())
    }

    /// Where a committed turn repositions the avatar.
    pub fn pivot(&self) -> Vec3 {
        self.position + self.orientation * self.template.pivot_offset()
    }

    fn placements(&self) -> impl Iterator<Item = PlacementDef> + '_ {
        let extent = self.template.extent();
        let ground = PlacementDef {
            tag: SurfaceTag::new(self.id, SurfaceClass::Ground),
            translation: self.position - Vec3::new(0.0, extent.y * 0.5, 0.0),
            rotation: self.orientation,
            shape: ColliderShapeDef::Cuboid {
                half_extents: extent * 0.5,
            },
        };

        let trigger = self.class().is_turn().then(|| {
            let height = self.template.trigger_height;
            PlacementDef {
                tag: SurfaceTag::new(self.id, SurfaceClass::TurnTrigger),
                translation: self.position + Vec3::new(0.0, height * 0.5, 0.0),
                rotation: self.orientation,
                shape: ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(extent.x * 0.5, height * 0.5, extent.z * 0.5),
                },
            }
        });

        std::iter::once(ground).chain(trigger)
    }
}

#[derive(Clone, Debug)]
pub struct LiveObstacle {
    pub id: LedgerId,
    pub template: Arc<ObstacleTemplate>,
    /// Track-surface point the obstacle stands on.
    pub position: Vec3,
    pub orientation: Quat,
}

impl LiveObstacle {
    fn placement(&self) -> PlacementDef {
        let extent = self.template.extent();
        PlacementDef {
            tag: SurfaceTag::new(self.id, SurfaceClass::Obstacle),
            translation: self.position
                + Vec3::new(0.0, self.template.elevation + extent.y * 0.5, 0.0),
            rotation: self.orientation,
            shape: ColliderShapeDef::Cuboid {
                half_extents: extent * 0.5,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct LiveCollectible {
    pub id: LedgerId,
    pub template: Arc<CollectibleTemplate>,
    pub position: Vec3,
}

impl LiveCollectible {
    fn placement(&self) -> PlacementDef {
        PlacementDef {
            tag: SurfaceTag::new(self.id, SurfaceClass::Collectible),
            translation: self.position,
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Sphere {
                radius: self.template.radius,
            },
        }
    }
}

/// Where the next segment goes and which way it faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationCursor {
    pub position: Vec3,
    pub direction: Heading,
}

impl Default for GenerationCursor {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            direction: Heading::PosZ,
        }
    }
}

/// Outcome of looking for a turnable segment under the avatar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnQuery {
    Found {
        pivot: Vec3,
        segment: LedgerId,
        class: SegmentClass,
    },
    NotFound,
}

#[derive(Default)]
pub struct TrackState {
    segments: VecDeque<LiveSegment>,
    obstacles: Vec<LiveObstacle>,
    collectibles: Vec<LiveCollectible>,
    cursor: GenerationCursor,
    next_id: LedgerId,
    next_insertion: u64,
    world: QueryWorld,
    dirty: bool,
}

impl TrackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> GenerationCursor {
        self.cursor
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut GenerationCursor {
        &mut self.cursor
    }

    /// Live segments, oldest first.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &LiveSegment> {
        self.segments.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The most recently spawned segment.
    pub fn newest_segment(&self) -> Option<&LiveSegment> {
        self.segments.back()
    }

    pub fn segment(&self, id: LedgerId) -> Option<&LiveSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn obstacles(&self) -> &[LiveObstacle] {
        &self.obstacles
    }

    pub fn collectibles(&self) -> &[LiveCollectible] {
        &self.collectibles
    }

    pub fn collectible(&self, id: LedgerId) -> Option<&LiveCollectible> {
        self.collectibles.iter().find(|c| c.id == id)
    }

    /// Have there been mutations since the last [`Self::commit`]?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn allocate_id(&mut self) -> LedgerId {
        let id = self.next_id;
        self.next_id += 1;
        self.dirty = true;
        id
    }

    /// Append a segment at `position` facing `heading`, composed with the template's own yaw.
    pub(crate) fn push_segment(
        &mut self,
        template: Arc<SegmentTemplate>,
        position: Vec3,
        heading: Heading,
    ) -> LedgerId {
        let id = self.allocate_id();
        let orientation = heading.rotation() * yaw_rotation(template.intrinsic_yaw());
        let insertion_order = self.next_insertion;
        self.next_insertion += 1;

        log::debug!(
            "spawn segment {id} `{}` at ({:.1}, {:.1}, {:.1}) facing {heading:?}",
            template.name,
            position.x,
            position.y,
            position.z
        );

        self.segments.push_back(LiveSegment {
            id,
            template,
            position,
            orientation,
            insertion_order,
        });
        id
    }

    /// Retire every segment except the newest. Returns how many were retired.
    pub(crate) fn retire_all_but_newest(&mut self) -> usize {
        let mut retired = 0;
        while self.segments.len() > 1 {
            if let Some(old) = self.segments.pop_front() {
                log::debug!("retire segment {}", old.id);
                retired += 1;
            }
        }
        if retired > 0 {
            self.dirty = true;
        }
        retired
    }

    pub(crate) fn clear_obstacles(&mut self) -> usize {
        let count = self.obstacles.len();
        if count > 0 {
            self.obstacles.clear();
            self.dirty = true;
        }
        count
    }

    pub(crate) fn clear_collectibles(&mut self) -> usize {
        let count = self.collectibles.len();
        if count > 0 {
            self.collectibles.clear();
            self.dirty = true;
        }
        count
    }

    pub(crate) fn push_obstacle(
        &mut self,
        template: Arc<ObstacleTemplate>,
        position: Vec3,
        orientation: Quat,
    ) -> LedgerId {
        let id = self.allocate_id();
        self.obstacles.push(LiveObstacle {
            id,
            template,
            position,
            orientation,
        });
        id
    }

    pub(crate) fn push_collectible(
        &mut self,
        template: Arc<CollectibleTemplate>,
        position: Vec3,
    ) -> LedgerId {
        let id = self.allocate_id();
        self.collectibles.push(LiveCollectible {
            id,
            template,
            position,
        });
        id
    }

    pub(crate) fn remove_collectible(&mut self, id: LedgerId) -> Option<LiveCollectible> {
        let idx = self.collectibles.iter().position(|c| c.id == id)?;
        self.dirty = true;
        Some(self.collectibles.remove(idx))
    }

    /// Rebuild the collision query world from the ledger, if anything changed.
    pub(crate) fn commit(&mut self) {
        if !self.dirty {
            return;
        }
        let defs: Vec<PlacementDef> = self
            .segments
            .iter()
            .flat_map(|s| s.placements())
            .chain(self.obstacles.iter().map(LiveObstacle::placement))
            .chain(self.collectibles.iter().map(LiveCollectible::placement))
            .collect();
        self.world = QueryWorld::build(defs);
        self.dirty = false;
    }

    /// Cast straight down for ground from `origin`.
    pub fn probe_ground(&self, origin: Vec3, length: f32) -> Option<RayHit> {
        self.world
            .cast_down(origin, length, SurfaceMask::only(SurfaceClass::Ground))
            .filter(|hit| hit.normal.y >= shared::MIN_GROUND_NORMAL_Y)
    }

    /// Look for a turn-class segment within `radius` of `position` and gate it by `direction`.
    ///
    /// Only the first trigger found is considered.
    pub fn query_turn(
        &self,
        position: Vec3,
        radius: f32,
        direction: shared::TurnDirection,
    ) -> TurnQuery {
        let ball = shared::query_world::rapier3d::parry::shape::Ball::new(radius);
        let pose = Iso::translation(position.x, position.y, position.z);
        let hits = self.world.overlapping(
            &pose,
            &ball,
            SurfaceMask::only(SurfaceClass::TurnTrigger),
        );

        let Some(segment) = hits.first().and_then(|tag| self.segment(tag.id)) else {
            return TurnQuery::NotFound;
        };

        if segment.class().accepts(direction) {
            TurnQuery::Found {
                pivot: segment.pivot(),
                segment: segment.id,
                class: segment.class(),
            }
        } else {
            TurnQuery::NotFound
        }
    }

    /// Ids of entries of `class` overlapping an upright box resting on `base`.
    pub fn touching(&self, base: Vec3, half_extents: Vec3, class: SurfaceClass) -> Vec<LedgerId> {
        let cuboid = shared::query_world::rapier3d::parry::shape::Cuboid::new(half_extents);
        let center = base + Vec3::new(0.0, half_extents.y, 0.0);
        let pose = Iso::from_parts(na::Translation3::from(center), Quat::identity());
        self.world
            .overlapping(&pose, &cuboid, SurfaceMask::only(class))
            .into_iter()
            .map(|tag| tag.id)
            .collect()
    }
}
