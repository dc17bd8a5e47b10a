//! Tile pyramid coordinates.
//!
//! A [`CanonicalTileId`] addresses one node of the Web Mercator tile pyramid.
//! An [`OverscaledTileId`] adds the zoom the tile is actually displayed at
//! (which may exceed the source's maximum zoom) and the world copy it belongs
//! to, so that tiles on either side of the anti-meridian stay distinct.

mod error;
mod id;

pub use error::TileIdError;
pub use id::{CanonicalTileId, OverscaledTileId};

/// Number of fixed-point units spanning one tile edge in tile-local space.
pub const EXTENT: u32 = 8192;

/// Highest canonical zoom level representable by [`CanonicalTileId`].
pub const MAX_ZOOM: u8 = 32;
