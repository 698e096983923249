//! Read-only catalog of track, obstacle and collectible templates.
//!
//! Loaded once at startup (built-in defaults or JSON) and validated up front: an empty
//! list or a malformed template is a [`CatalogError`], never a runtime retry path.

use std::sync::Arc;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use shared::{TurnDirection, Vec3};

use crate::error::{CatalogError, RunnerError};

/// How a segment behaves under the avatar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentClass {
    Straight,
    TurnLeft,
    TurnRight,
    /// A junction that may be left in either direction.
    LateralShift,
}

impl SegmentClass {
    /// Turn-class segments end a run, carry a turn trigger and never hold obstacles.
    #[inline]
    pub fn is_turn(self) -> bool {
        !matches!(self, SegmentClass::Straight)
    }

    /// Can a turn in `direction` be committed on this segment?
    pub fn accepts(self, direction: TurnDirection) -> bool {
        match self {
            SegmentClass::Straight => false,
            SegmentClass::TurnLeft => direction == TurnDirection::Left,
            SegmentClass::TurnRight => direction == TurnDirection::Right,
            SegmentClass::LateralShift => true,
        }
    }
}

fn default_trigger_height() -> f32 {
    3.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub name: String,
    pub class: SegmentClass,
    /// Local size: X = width, Y = slab thickness, Z = length.
    pub extent: [f32; 3],
    /// Pivot relative to the segment's surface centre, in the segment's local frame.
    #[serde(default)]
    pub pivot_offset: [f32; 3],
    /// Authored yaw of the template itself (degrees), composed with the placement heading.
    #[serde(default)]
    pub intrinsic_yaw_deg: f32,
    /// Height of the turn trigger volume above the surface.
    #[serde(default = "default_trigger_height")]
    pub trigger_height: f32,
}

impl SegmentTemplate {
    pub fn new(name: impl Into<String>, class: SegmentClass, extent: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            class,
            extent,
            pivot_offset: [0.0; 3],
            intrinsic_yaw_deg: 0.0,
            trigger_height: default_trigger_height(),
        }
    }

    #[inline]
    pub fn extent(&self) -> Vec3 {
        Vec3::from(self.extent)
    }

    #[inline]
    pub fn pivot_offset(&self) -> Vec3 {
        Vec3::from(self.pivot_offset)
    }

    #[inline]
    pub fn intrinsic_yaw(&self) -> f32 {
        self.intrinsic_yaw_deg.to_radians()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleTemplate {
    pub name: String,
    /// Local size: X = width across the track, Y = height, Z = depth along it.
    pub extent: [f32; 3],
    /// Gap between the track surface and the obstacle's underside.
    #[serde(default)]
    pub elevation: f32,
}

impl ObstacleTemplate {
    #[inline]
    pub fn extent(&self) -> Vec3 {
        Vec3::from(self.extent)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectibleTemplate {
    pub name: String,
    pub radius: f32,
    /// Score awarded on pickup.
    pub value: u32,
}

/// Serializable form of the catalog, one list per template category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogDef {
    /// The tile every straight run is built from. Its length is the base-tile depth.
    pub base_tile: SegmentTemplate,
    pub turns: Vec<SegmentTemplate>,
    pub obstacles: Vec<ObstacleTemplate>,
    pub collectibles: Vec<CollectibleTemplate>,
}

impl Default for CatalogDef {
    /// Built-in set whose geometry joins up under the default 2 m turn margin:
    /// 4×4 m tiles, a hurdle to jump and a bar to slide under.
    fn default() -> Self {
        let tile = [4.0, 0.5, 4.0];
        Self {
            base_tile: SegmentTemplate::new("straight", SegmentClass::Straight, tile),
            turns: vec![
                SegmentTemplate::new("turn_left", SegmentClass::TurnLeft, tile),
                SegmentTemplate::new("turn_right", SegmentClass::TurnRight, tile),
            ],
            obstacles: vec![
                ObstacleTemplate {
                    name: "hurdle".into(),
                    extent: [4.0, 0.8, 0.4],
                    elevation: 0.0,
                },
                ObstacleTemplate {
                    name: "bar".into(),
                    extent: [4.0, 1.0, 0.4],
                    elevation: 1.2,
                },
            ],
            collectibles: vec![CollectibleTemplate {
                name: "coin".into(),
                radius: 0.5,
                value: 1,
            }],
        }
    }
}

/// Validated, immutable template catalog.
///
/// Templates are reference-counted so live ledger entries can point at them directly.
#[derive(Clone, Debug)]
pub struct SegmentCatalog {
    base_tile: Arc<SegmentTemplate>,
    turns: Vec<Arc<SegmentTemplate>>,
    obstacles: Vec<Arc<ObstacleTemplate>>,
    collectibles: Vec<Arc<CollectibleTemplate>>,
}

impl Default for SegmentCatalog {
    fn default() -> Self {
        // The built-in definition is valid by construction; see `default_catalog_is_valid`.
        let def = CatalogDef::default();
        Self {
            base_tile: Arc::new(def.base_tile),
            turns: def.turns.into_iter().map(Arc::new).collect(),
            obstacles: def.obstacles.into_iter().map(Arc::new).collect(),
            collectibles: def.collectibles.into_iter().map(Arc::new).collect(),
        }
    }
}

impl SegmentCatalog {
    pub fn new(def: CatalogDef) -> Result<Self, CatalogError> {
        if def.base_tile.class != SegmentClass::Straight {
            return Err(CatalogError::BaseTileNotStraight(def.base_tile.class));
        }
        if def.turns.is_empty() {
            return Err(CatalogError::Empty("turn"));
        }
        if def.obstacles.is_empty() {
            return Err(CatalogError::Empty("obstacle"));
        }
        if def.collectibles.is_empty() {
            return Err(CatalogError::Empty("collectible"));
        }
        if let Some(idx) = def.turns.iter().position(|t| !t.class.is_turn()) {
            return Err(CatalogError::NotATurn(idx));
        }

        let segments = std::iter::once(&def.base_tile).chain(def.turns.iter());
        for template in segments {
            if !positive_extent(template.extent) {
                return Err(CatalogError::BadExtent(template.name.clone()));
            }
        }
        for template in &def.obstacles {
            if !positive_extent(template.extent) {
                return Err(CatalogError::BadExtent(template.name.clone()));
            }
        }
        for template in &def.collectibles {
            if template.radius <= 0.0 {
                return Err(CatalogError::BadExtent(template.name.clone()));
            }
        }

        log::info!(
            "catalog loaded: {} turn, {} obstacle, {} collectible templates",
            def.turns.len(),
            def.obstacles.len(),
            def.collectibles.len()
        );

        Ok(Self {
            base_tile: Arc::new(def.base_tile),
            turns: def.turns.into_iter().map(Arc::new).collect(),
            obstacles: def.obstacles.into_iter().map(Arc::new).collect(),
            collectibles: def.collectibles.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn from_json(text: &str) -> Result<Self, RunnerError> {
        let def: CatalogDef = serde_json::from_str(text)?;
        Ok(Self::new(def)?)
    }

    pub fn base_tile(&self) -> &Arc<SegmentTemplate> {
        &self.base_tile
    }

    /// Length of the base tile along its run direction.
    pub fn base_tile_depth(&self) -> f32 {
        self.base_tile.extent[2]
    }

    pub fn turns(&self) -> &[Arc<SegmentTemplate>] {
        &self.turns
    }

    pub fn obstacles(&self) -> &[Arc<ObstacleTemplate>] {
        &self.obstacles
    }

    pub fn collectibles(&self) -> &[Arc<CollectibleTemplate>] {
        &self.collectibles
    }

    pub fn random_turn<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Arc<SegmentTemplate>, CatalogError> {
        choose(&self.turns, "turn", rng)
    }

    pub fn random_obstacle<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Arc<ObstacleTemplate>, CatalogError> {
        choose(&self.obstacles, "obstacle", rng)
    }

    pub fn random_collectible<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<&Arc<CollectibleTemplate>, CatalogError> {
        choose(&self.collectibles, "collectible", rng)
    }
}

/// Uniformly pick one entry, or report that there was nothing to pick.
pub fn choose<'a, T, R: Rng + ?Sized>(
    list: &'a [T],
    what: &'static str,
    rng: &mut R,
) -> Result<&'a T, CatalogError> {
    list.choose(rng).ok_or(CatalogError::Empty(what))
}

fn positive_extent(extent: [f32; 3]) -> bool {
    extent.iter().all(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn default_catalog_is_valid() {
        let catalog = SegmentCatalog::new(CatalogDef::default()).expect("valid");
        assert_eq!(catalog.base_tile_depth(), 4.0);
        assert_eq!(catalog.turns().len(), 2);
    }

    #[test]
    fn empty_lists_are_startup_errors() {
        let mut def = CatalogDef::default();
        def.turns.clear();
        assert_eq!(SegmentCatalog::new(def).err(), Some(CatalogError::Empty("turn")));

        let mut def = CatalogDef::default();
        def.obstacles.clear();
        assert_eq!(
            SegmentCatalog::new(def).err(),
            Some(CatalogError::Empty("obstacle"))
        );
    }

    #[test]
    fn choose_from_empty_is_a_defined_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let empty: Vec<u8> = Vec::new();
        assert_eq!(choose(&empty, "segment", &mut rng), Err(CatalogError::Empty("segment")));
        assert_eq!(choose(&[5u8], "segment", &mut rng), Ok(&5));
    }

    #[test]
    fn misclassified_templates_are_rejected() {
        let mut def = CatalogDef::default();
        def.turns.push(SegmentTemplate::new("oops", SegmentClass::Straight, [4.0, 0.5, 4.0]));
        assert_eq!(SegmentCatalog::new(def).err(), Some(CatalogError::NotATurn(2)));

        let mut def = CatalogDef::default();
        def.base_tile.class = SegmentClass::TurnLeft;
        assert_eq!(
            SegmentCatalog::new(def).err(),
            Some(CatalogError::BaseTileNotStraight(SegmentClass::TurnLeft))
        );

        let mut def = CatalogDef::default();
        def.obstacles[0].extent[1] = 0.0;
        assert_eq!(
            SegmentCatalog::new(def).err(),
            Some(CatalogError::BadExtent("hurdle".into()))
        );
    }

    #[test]
    fn turn_gating_by_class() {
        assert!(SegmentClass::TurnLeft.accepts(TurnDirection::Left));
        assert!(!SegmentClass::TurnLeft.accepts(TurnDirection::Right));
        assert!(SegmentClass::TurnRight.accepts(TurnDirection::Right));
        assert!(!SegmentClass::TurnRight.accepts(TurnDirection::Left));
        assert!(SegmentClass::LateralShift.accepts(TurnDirection::Left));
        assert!(SegmentClass::LateralShift.accepts(TurnDirection::Right));
        assert!(!SegmentClass::Straight.accepts(TurnDirection::Left));
    }

    #[test]
    fn catalog_loads_from_json() {
        let json = r#"{
            "base_tile": { "name": "s", "class": "STRAIGHT", "extent": [4, 0.5, 6] },
            "turns": [
                { "name": "t", "class": "LATERAL_SHIFT", "extent": [12, 0.5, 4], "pivot_offset": [0, 0, 0] }
            ],
            "obstacles": [ { "name": "o", "extent": [4, 1, 0.5] } ],
            "collectibles": [ { "name": "c", "radius": 0.4, "value": 5 } ]
        }"#;
        let catalog = SegmentCatalog::from_json(json).expect("valid json catalog");
        assert_eq!(catalog.base_tile_depth(), 6.0);
        assert_eq!(catalog.turns()[0].class, SegmentClass::LateralShift);
        assert_eq!(catalog.turns()[0].trigger_height, 3.0);
        assert_eq!(catalog.collectibles()[0].value, 5);
    }
}
