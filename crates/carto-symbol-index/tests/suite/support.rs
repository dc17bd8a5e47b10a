use carto_symbol_index::{
    Anchor, Bucket, CrossTileId, OverscaledTileId, RenderTile, SymbolBucket, SymbolInstance,
};
use std::collections::BTreeMap;

pub const LAYER: &str = "road-labels";

/// A render tile holding symbol buckets only.
#[derive(Clone, Debug)]
pub struct TestTile {
    pub id: OverscaledTileId,
    pub renderable: bool,
    pub buckets: BTreeMap<String, SymbolBucket>,
}

impl TestTile {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self::at(OverscaledTileId::from_zxy(z, x, y).unwrap())
    }

    pub fn at(id: OverscaledTileId) -> Self {
        Self {
            id,
            renderable: true,
            buckets: BTreeMap::new(),
        }
    }

    pub fn with_symbols(mut self, symbols: &[(&str, i32, i32)]) -> Self {
        self.regenerate(symbols);
        self
    }

    /// Replace the layer's bucket as a fresh layout pass would.
    pub fn regenerate(&mut self, symbols: &[(&str, i32, i32)]) {
        let instances = symbols
            .iter()
            .map(|&(key, x, y)| SymbolInstance::new(key, Anchor::new(x, y)))
            .collect();
        self.buckets
            .insert(LAYER.to_owned(), SymbolBucket::new(instances));
    }

    pub fn bucket(&self) -> &SymbolBucket {
        &self.buckets[LAYER]
    }

    pub fn symbol_bucket_mut(&mut self) -> &mut SymbolBucket {
        self.buckets.get_mut(LAYER).unwrap()
    }

    /// Cross-tile ids of the layer's instances in bucket order; `0` when unset.
    pub fn ids(&self) -> Vec<u64> {
        self.bucket()
            .symbol_instances
            .iter()
            .map(|instance| instance.cross_tile_id.map_or(0, CrossTileId::get))
            .collect()
    }
}

impl RenderTile for TestTile {
    fn id(&self) -> OverscaledTileId {
        self.id
    }

    fn is_renderable(&self) -> bool {
        self.renderable
    }

    fn bucket_mut(&mut self, layer_id: &str) -> Option<&mut dyn Bucket> {
        self.buckets
            .get_mut(layer_id)
            .map(|bucket| bucket as &mut dyn Bucket)
    }
}
