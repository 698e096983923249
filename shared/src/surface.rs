/*!
Surface classification for query-world colliders.

Every collider inserted into a [`crate::QueryWorld`] carries a [`SurfaceTag`] packed into
Rapier's `user_data: u128`, so a ray or overlap hit can be mapped straight back to the
ledger entry that produced it.

# Bit layout
Least-significant bit = bit 0:

- bits 0..=63   : ledger id (u64) of the segment/obstacle/collectible
- bits 64..=71  : [`SurfaceClass`] tag (u8)
- bits 72..=127 : reserved, zero

Changing the numeric tags changes how existing worlds decode; they are rebuilt every
mutation, so there is no stored data to migrate.
*/

use serde::{Deserialize, Serialize};

/// Id of an entry in the track ledger.
pub type LedgerId = u64;

/// What kind of surface a collider represents.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceClass {
    /// Walkable slab of a track segment.
    Ground = 1,
    /// Volume over a turn-class segment where a turn command may be committed.
    TurnTrigger = 2,
    /// Anything that ends the run on contact.
    Obstacle = 3,
    /// Pickup volume.
    Collectible = 4,
}

impl SurfaceClass {
    pub fn from_tag(tag: u8) -> Option<SurfaceClass> {
        match tag {
            1 => Some(SurfaceClass::Ground),
            2 => Some(SurfaceClass::TurnTrigger),
            3 => Some(SurfaceClass::Obstacle),
            4 => Some(SurfaceClass::Collectible),
            _ => None,
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of classes a query should consider.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceMask(u8);

impl SurfaceMask {
    pub const NONE: SurfaceMask = SurfaceMask(0);

    pub fn only(class: SurfaceClass) -> Self {
        Self(class.bit())
    }

    pub fn with(self, class: SurfaceClass) -> Self {
        Self(self.0 | class.bit())
    }

    #[inline]
    pub fn contains(self, class: SurfaceClass) -> bool {
        self.0 & class.bit() != 0
    }

    /// Does a packed `user_data` value belong to this mask?
    #[inline]
    pub fn matches(self, user_data: u128) -> bool {
        SurfaceTag::unpack(user_data).is_some_and(|tag| self.contains(tag.class))
    }
}

/// A ledger id together with its surface class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceTag {
    pub id: LedgerId,
    pub class: SurfaceClass,
}

impl SurfaceTag {
    pub fn new(id: LedgerId, class: SurfaceClass) -> Self {
        Self { id, class }
    }

    #[inline]
    pub fn pack(self) -> u128 {
        (self.id as u128) | ((self.class as u128) << LedgerId::BITS)
    }

    /// Decode a packed value. Returns `None` for unknown class tags or non-zero reserved bits.
    pub fn unpack(user_data: u128) -> Option<SurfaceTag> {
        const RESERVED_MASK: u128 = !0u128 << 72;
        if user_data & RESERVED_MASK != 0 {
            return None;
        }
        let class = SurfaceClass::from_tag(((user_data >> LedgerId::BITS) & 0xFF) as u8)?;
        let id = (user_data & (u64::MAX as u128)) as LedgerId;
        Some(SurfaceTag { id, class })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_places_id_low_and_class_above() {
        let tag = SurfaceTag::new(0x0123_4567_89AB_CDEF, SurfaceClass::Obstacle);
        let packed = tag.pack();
        assert_eq!(packed, 0x0123_4567_89AB_CDEFu128 | (3u128 << 64));
        assert_eq!(SurfaceTag::unpack(packed), Some(tag));
    }

    #[test]
    fn unpack_rejects_unknown_class_and_reserved_bits() {
        assert_eq!(SurfaceTag::unpack(7 | (200u128 << 64)), None);
        assert_eq!(SurfaceTag::unpack(7), None);
        let tag = SurfaceTag::new(7, SurfaceClass::Ground).pack() | (1u128 << 80);
        assert_eq!(SurfaceTag::unpack(tag), None);
    }

    #[test]
    fn mask_matches_only_selected_classes() {
        let mask = SurfaceMask::only(SurfaceClass::Ground).with(SurfaceClass::Obstacle);
        assert!(mask.matches(SurfaceTag::new(1, SurfaceClass::Ground).pack()));
        assert!(mask.matches(SurfaceTag::new(2, SurfaceClass::Obstacle).pack()));
        assert!(!mask.matches(SurfaceTag::new(3, SurfaceClass::TurnTrigger).pack()));
        assert!(!SurfaceMask::NONE.matches(SurfaceTag::new(4, SurfaceClass::Ground).pack()));
    }
}
