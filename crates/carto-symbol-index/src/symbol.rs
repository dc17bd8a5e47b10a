use crate::{BucketInstanceId, CrossTileId};
use carto_tile::OverscaledTileId;
use serde::{Deserialize, Serialize};

/// Tile-local anchor position in fixed-point tile units (see [`crate::EXTENT`]).
///
/// Anchors may fall slightly outside `0..EXTENT` when a label sits in the
/// tile's buffer region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One placeable label or icon produced by a tile's layout pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolInstance {
    key: String,
    anchor: Anchor,
    /// Assigned by the cross-tile index; `None` until the bucket is reconciled.
    pub cross_tile_id: Option<CrossTileId>,
}

impl SymbolInstance {
    pub fn new(key: impl Into<String>, anchor: Anchor) -> Self {
        Self {
            key: key.into(),
            anchor,
            cross_tile_id: None,
        }
    }

    /// Grouping key; only instances with equal keys can share an identity.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

/// The symbol layout result of one tile for one style layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolBucket {
    /// Stamped lazily by [`crate::CrossTileSymbolIndex::add_layer`] the first
    /// time this bucket is reconciled.
    pub bucket_instance_id: Option<BucketInstanceId>,
    pub symbol_instances: Vec<SymbolInstance>,
}

impl SymbolBucket {
    pub fn new(symbol_instances: Vec<SymbolInstance>) -> Self {
        Self {
            bucket_instance_id: None,
            symbol_instances,
        }
    }
}

/// A per-layer render bucket of unknown kind.
pub trait Bucket {
    /// Capability query for the symbol-bearing bucket kind.
    fn as_symbol_bucket_mut(&mut self) -> Option<&mut SymbolBucket> {
        None
    }
}

impl Bucket for SymbolBucket {
    fn as_symbol_bucket_mut(&mut self) -> Option<&mut SymbolBucket> {
        Some(self)
    }
}

/// A tile currently held by the renderer's tile pyramid.
pub trait RenderTile {
    fn id(&self) -> OverscaledTileId;

    /// Whether the tile has loaded enough data to be drawn this frame.
    fn is_renderable(&self) -> bool;

    /// The bucket this tile built for `layer_id`, if any.
    fn bucket_mut(&mut self, layer_id: &str) -> Option<&mut dyn Bucket>;
}
