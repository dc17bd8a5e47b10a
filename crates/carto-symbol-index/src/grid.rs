use crate::Anchor;
use carto_tile::{OverscaledTileId, EXTENT, MAX_ZOOM};

/// An anchor snapped to the coarse matching grid of some zoom level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

/// Maps tile-local anchors onto a coarse world grid so the same feature laid
/// out in different tiles lands in the same (or an adjacent) cell.
///
/// At the tile's own zoom one cell spans `cell_size_px` rendered pixels of a
/// `tile_size` pixel tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantizationGrid {
    extent: u32,
    rounding_factor: f64,
}

impl QuantizationGrid {
    pub const DEFAULT_TILE_SIZE: u32 = 512;
    pub const DEFAULT_CELL_SIZE_PX: f64 = 2.0;
    /// Finest supported grid, in cells per tile edge. At [`MAX_ZOOM`] the
    /// world then spans `2^62` cells, which leaves room in an `i64` for
    /// anchors up to a full tile outside their tile.
    pub const MAX_CELLS_PER_TILE: f64 = (1u64 << 30) as f64;

    /// Returns `None` unless every parameter is positive and finite and the
    /// grid is no finer than [`Self::MAX_CELLS_PER_TILE`].
    pub fn new(extent: u32, tile_size: u32, cell_size_px: f64) -> Option<Self> {
        if extent == 0 || tile_size == 0 || !cell_size_px.is_finite() || cell_size_px <= 0.0 {
            return None;
        }
        if f64::from(tile_size) / cell_size_px > Self::MAX_CELLS_PER_TILE {
            return None;
        }
        Some(Self {
            extent,
            rounding_factor: f64::from(tile_size) / f64::from(extent) / cell_size_px,
        })
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    /// Tile units per grid cell at the tile's own zoom.
    pub fn cell_units(&self) -> f64 {
        1.0 / self.rounding_factor
    }

    /// Quantize `anchor` of `tile` onto the grid of canonical zoom `grid_z`.
    ///
    /// Only canonical zooms take part: an overzoomed tile shares its grid with
    /// the canonical tile it was cut from.
    pub fn quantize(&self, anchor: Anchor, tile: &OverscaledTileId, grid_z: u8) -> GridPoint {
        let zoom_delta = i32::from(tile.canonical.z) - i32::from(grid_z);
        let scale = self.rounding_factor / 2f64.powi(zoom_delta);
        let extent = f64::from(self.extent);
        GridPoint {
            x: ((f64::from(tile.canonical.x) * extent + f64::from(anchor.x)) * scale).floor()
                as i64,
            y: ((f64::from(tile.canonical.y) * extent + f64::from(anchor.y)) * scale).floor()
                as i64,
        }
    }
}

impl Default for QuantizationGrid {
    fn default() -> Self {
        Self {
            extent: EXTENT,
            rounding_factor: f64::from(Self::DEFAULT_TILE_SIZE)
                / f64::from(EXTENT)
                / Self::DEFAULT_CELL_SIZE_PX,
        }
    }
}
