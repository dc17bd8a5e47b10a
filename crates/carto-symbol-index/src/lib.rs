//! Cross-tile symbol identity index.
//!
//! Every time a tile is laid out its labels come back as fresh
//! [`SymbolInstance`]s with no memory of earlier layouts. This crate gives each
//! instance a [`CrossTileId`] that stays the same while the label moves between
//! tiles, zoom levels and regenerated buckets, so placement and fade
//! animations can follow it.
//!
//! The index has three levels:
//! - [`TileLayerIndex`]: the quantized anchors of one tile's bucket, grouped by
//!   symbol key.
//! - [`CrossTileSymbolLayerIndex`]: every held tile of one style layer, keyed by
//!   overscaled zoom; matches new buckets against ancestors and descendants.
//! - [`CrossTileSymbolIndex`]: one layer index per style layer plus the global id
//!   counters.
//!
//! All calls are synchronous and single threaded. While a reconciliation call
//! runs the index is the only writer of [`SymbolInstance::cross_tile_id`]; the
//! caller must not hand the buckets to anything else until it returns.

mod cross_tile;
mod grid;
mod ids;
mod layer_index;
mod symbol;
mod tile_index;

pub use cross_tile::CrossTileSymbolIndex;
pub use grid::{GridPoint, QuantizationGrid};
pub use ids::{BucketInstanceId, BucketInstanceIdCounter, CrossTileId, CrossTileIdCounter};
pub use layer_index::CrossTileSymbolLayerIndex;
pub use symbol::{Anchor, Bucket, RenderTile, SymbolBucket, SymbolInstance};
pub use tile_index::{IndexedSymbolInstance, TileLayerIndex};

pub use carto_tile::{CanonicalTileId, OverscaledTileId, EXTENT};
