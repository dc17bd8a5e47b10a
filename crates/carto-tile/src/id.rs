use crate::{TileIdError, MAX_ZOOM};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one tile in the source pyramid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCanonicalTileId")]
pub struct CanonicalTileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

#[derive(Deserialize)]
struct RawCanonicalTileId {
    z: u8,
    x: u32,
    y: u32,
}

impl TryFrom<RawCanonicalTileId> for CanonicalTileId {
    type Error = TileIdError;

    fn try_from(raw: RawCanonicalTileId) -> Result<Self, Self::Error> {
        Self::new(raw.z, raw.x, raw.y)
    }
}

impl CanonicalTileId {
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, TileIdError> {
        if z > MAX_ZOOM {
            return Err(TileIdError::ZoomTooLarge { z, max: MAX_ZOOM });
        }
        let dim = 1u64 << z;
        if u64::from(x) >= dim || u64::from(y) >= dim {
            return Err(TileIdError::OutOfRange { z, x, y });
        }
        Ok(Self { z, x, y })
    }

    /// Returns true when `parent` is a strict ancestor of this tile.
    #[must_use]
    pub fn is_child_of(&self, parent: &CanonicalTileId) -> bool {
        if parent.z >= self.z {
            return false;
        }
        let shift = u32::from(self.z - parent.z);
        shr(self.x, shift) == parent.x && shr(self.y, shift) == parent.y
    }

    /// The ancestor of this tile at `target_z`, or the tile itself when
    /// `target_z` is not coarser than its own zoom.
    #[must_use]
    pub fn scaled_to(&self, target_z: u8) -> CanonicalTileId {
        if target_z >= self.z {
            return *self;
        }
        let shift = u32::from(self.z - target_z);
        CanonicalTileId {
            z: target_z,
            x: shr(self.x, shift),
            y: shr(self.y, shift),
        }
    }

    /// The four tiles one zoom level below this one.
    ///
    /// Returns an empty list at [`MAX_ZOOM`].
    #[must_use]
    pub fn children(&self) -> Vec<CanonicalTileId> {
        if self.z >= MAX_ZOOM {
            return Vec::new();
        }
        let z = self.z + 1;
        let x = self.x * 2;
        let y = self.y * 2;
        vec![
            CanonicalTileId { z, x, y },
            CanonicalTileId { z, x: x + 1, y },
            CanonicalTileId { z, x, y: y + 1 },
            CanonicalTileId {
                z,
                x: x + 1,
                y: y + 1,
            },
        ]
    }
}

impl fmt::Display for CanonicalTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A canonical tile as displayed at a given zoom level and world copy.
///
/// `overscaled_z` is the zoom level the tile is rendered at; it equals
/// `canonical.z` for ordinary tiles and exceeds it for tiles overzoomed past
/// the source's maximum zoom. `wrap` selects the world copy (0 is the primary
/// world, -1 the copy west of the anti-meridian, and so on).
///
/// Ordering compares `overscaled_z`, then `wrap`, then the canonical tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOverscaledTileId")]
pub struct OverscaledTileId {
    pub overscaled_z: u8,
    pub wrap: i16,
    pub canonical: CanonicalTileId,
}

#[derive(Deserialize)]
struct RawOverscaledTileId {
    overscaled_z: Option<u8>,
    #[serde(default)]
    wrap: i16,
    canonical: CanonicalTileId,
}

impl TryFrom<RawOverscaledTileId> for OverscaledTileId {
    type Error = TileIdError;

    fn try_from(raw: RawOverscaledTileId) -> Result<Self, Self::Error> {
        let overscaled_z = raw.overscaled_z.unwrap_or(raw.canonical.z);
        Self::new(overscaled_z, raw.wrap, raw.canonical)
    }
}

impl OverscaledTileId {
    pub fn new(
        overscaled_z: u8,
        wrap: i16,
        canonical: CanonicalTileId,
    ) -> Result<Self, TileIdError> {
        if overscaled_z < canonical.z {
            return Err(TileIdError::OverscaledBelowCanonical {
                overscaled_z,
                z: canonical.z,
            });
        }
        Ok(Self {
            overscaled_z,
            wrap,
            canonical,
        })
    }

    /// Convenience for a non-overscaled tile in the primary world copy.
    pub fn from_canonical(canonical: CanonicalTileId) -> Self {
        Self {
            overscaled_z: canonical.z,
            wrap: 0,
            canonical,
        }
    }

    /// Shorthand for `from_canonical(CanonicalTileId::new(z, x, y)?)`.
    pub fn from_zxy(z: u8, x: u32, y: u32) -> Result<Self, TileIdError> {
        CanonicalTileId::new(z, x, y).map(Self::from_canonical)
    }

    #[must_use]
    pub fn with_wrap(self, wrap: i16) -> Self {
        Self { wrap, ..self }
    }

    /// Returns true when this tile is displayed at a finer zoom than `parent`
    /// and covers part of `parent`'s area.
    ///
    /// World copies are not compared: a tile in wrap 1 is a child of its
    /// canonical parent in wrap 0.
    #[must_use]
    pub fn is_child_of(&self, parent: &OverscaledTileId) -> bool {
        self.overscaled_z > parent.overscaled_z
            && (self.canonical == parent.canonical || self.canonical.is_child_of(&parent.canonical))
    }

    /// The tile covering this one when displayed at zoom `z`, in the same
    /// world copy.
    ///
    /// For `z` at or above the canonical zoom only the overscaled zoom
    /// changes.
    #[must_use]
    pub fn scaled_to(&self, z: u8) -> OverscaledTileId {
        OverscaledTileId {
            overscaled_z: z,
            wrap: self.wrap,
            canonical: self.canonical.scaled_to(z),
        }
    }

    /// Tiles displayed one zoom level below this one.
    ///
    /// Past `source_max_zoom` the source has no finer data, so the single
    /// child is the same canonical tile overzoomed by one level.
    #[must_use]
    pub fn children(&self, source_max_zoom: u8) -> Vec<OverscaledTileId> {
        let Some(overscaled_z) = self.overscaled_z.checked_add(1) else {
            return Vec::new();
        };
        if self.overscaled_z >= source_max_zoom || self.canonical.z >= MAX_ZOOM {
            return vec![OverscaledTileId {
                overscaled_z,
                ..*self
            }];
        }
        self.canonical
            .children()
            .into_iter()
            .map(|canonical| OverscaledTileId {
                overscaled_z,
                wrap: self.wrap,
                canonical,
            })
            .collect()
    }

    /// Column of this tile counted across all world copies.
    #[must_use]
    pub fn unwrapped_x(&self) -> i64 {
        i64::from(self.canonical.x) + i64::from(self.wrap) * (1i64 << self.canonical.z)
    }

    #[must_use]
    pub fn is_overscaled(&self) -> bool {
        self.overscaled_z > self.canonical.z
    }
}

impl fmt::Display for OverscaledTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)?;
        if self.is_overscaled() {
            write!(f, "@z{}", self.overscaled_z)?;
        }
        if self.wrap != 0 {
            write!(f, " (wrap {})", self.wrap)?;
        }
        Ok(())
    }
}

fn shr(value: u32, shift: u32) -> u32 {
    value.checked_shr(shift).unwrap_or(0)
}
