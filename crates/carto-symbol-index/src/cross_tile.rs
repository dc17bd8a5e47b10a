use crate::{
    BucketInstanceId, BucketInstanceIdCounter, CrossTileId, CrossTileIdCounter,
    CrossTileSymbolLayerIndex, QuantizationGrid, RenderTile,
};
use std::collections::{BTreeMap, HashSet};

/// Cross-tile symbol index of a whole style: one layer index per symbol layer
/// plus the id counters shared by all of them.
///
/// Both counters only ever grow. [`CrossTileSymbolIndex::reset`] drops the
/// layer indexes but keeps the counters, so ids handed out before a reset are
/// never reissued to different labels afterwards.
#[derive(Debug, Default)]
pub struct CrossTileSymbolIndex {
    grid: QuantizationGrid,
    layer_indexes: BTreeMap<String, CrossTileSymbolLayerIndex>,
    max_cross_tile_id: CrossTileIdCounter,
    max_bucket_instance_id: BucketInstanceIdCounter,
}

impl CrossTileSymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grid(grid: QuantizationGrid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> QuantizationGrid {
        self.grid
    }

    /// Reconcile the buckets of `layer_id` on every renderable tile in
    /// `render_tiles`, then forget tiles of this layer that were not offered.
    ///
    /// Returns `true` when any bucket was (re)indexed or any tile dropped, i.e.
    /// when placement has to look at the layer's identities again.
    ///
    /// Tiles without a bucket for the layer are skipped.
    ///
    /// # Panics
    ///
    /// Panics if a tile's bucket for `layer_id` is not a symbol bucket.
    pub fn add_layer<T: RenderTile>(&mut self, layer_id: &str, render_tiles: &mut [T]) -> bool {
        let grid = self.grid;
        let layer_index = self
            .layer_indexes
            .entry(layer_id.to_owned())
            .or_insert_with(|| CrossTileSymbolLayerIndex::new(grid));

        let mut symbol_buckets_changed = false;
        let mut current_bucket_ids: HashSet<BucketInstanceId> = HashSet::new();

        for render_tile in render_tiles.iter_mut() {
            if !render_tile.is_renderable() {
                continue;
            }
            let tile_id = render_tile.id();
            let Some(bucket) = render_tile.bucket_mut(layer_id) else {
                continue;
            };
            let Some(symbol_bucket) = bucket.as_symbol_bucket_mut() else {
                panic!("bucket of layer `{layer_id}` on tile {tile_id} is not a symbol bucket");
            };

            let bucket_instance_id = *symbol_bucket
                .bucket_instance_id
                .get_or_insert_with(|| self.max_bucket_instance_id.allocate());

            let bucket_added = layer_index.add_bucket(
                tile_id,
                bucket_instance_id,
                &mut symbol_bucket.symbol_instances,
                &mut self.max_cross_tile_id,
            );
            symbol_buckets_changed |= bucket_added;
            current_bucket_ids.insert(bucket_instance_id);
        }

        if layer_index.remove_stale_buckets(&current_bucket_ids) {
            symbol_buckets_changed = true;
        }

        tracing::trace!(
            target: "carto.symbol_index",
            layer = layer_id,
            tiles = current_bucket_ids.len(),
            changed = symbol_buckets_changed,
            "reconciled symbol layer"
        );
        symbol_buckets_changed
    }

    /// Drop the indexes of layers not named in `used_layer_ids`, e.g. after a
    /// style change removed them. Returns whether any layer was dropped.
    pub fn prune_unused_layers<'a>(
        &mut self,
        used_layer_ids: impl IntoIterator<Item = &'a str>,
    ) -> bool {
        let used: HashSet<&str> = used_layer_ids.into_iter().collect();
        let before = self.layer_indexes.len();
        self.layer_indexes
            .retain(|layer_id, _| used.contains(layer_id.as_str()));
        let pruned = before - self.layer_indexes.len();
        if pruned > 0 {
            tracing::debug!(target: "carto.symbol_index", pruned, "pruned unused symbol layers");
        }
        pruned > 0
    }

    /// Forget every layer index. The id counters are kept.
    pub fn reset(&mut self) {
        tracing::debug!(
            target: "carto.symbol_index",
            layers = self.layer_indexes.len(),
            max_cross_tile_id = self.max_cross_tile_id.last().map_or(0, CrossTileId::get),
            "resetting cross-tile symbol index"
        );
        self.layer_indexes.clear();
    }

    pub fn layer_index(&self, layer_id: &str) -> Option<&CrossTileSymbolLayerIndex> {
        self.layer_indexes.get(layer_id)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.layer_indexes.keys().map(String::as_str)
    }

    pub fn layer_count(&self) -> usize {
        self.layer_indexes.len()
    }

    /// The highest cross-tile id handed out so far.
    pub fn max_cross_tile_id(&self) -> Option<CrossTileId> {
        self.max_cross_tile_id.last()
    }

    /// The highest bucket instance id handed out so far.
    pub fn max_bucket_instance_id(&self) -> Option<BucketInstanceId> {
        self.max_bucket_instance_id.last()
    }

    /// Approximate heap memory usage of all layer indexes in bytes.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        use std::mem::size_of;

        let mut bytes = 0u64;
        for (layer_id, layer_index) in &self.layer_indexes {
            bytes = bytes.saturating_add(
                (size_of::<String>() + size_of::<CrossTileSymbolLayerIndex>()) as u64,
            );
            bytes = bytes.saturating_add(layer_id.capacity() as u64);
            bytes = bytes.saturating_add(layer_index.estimated_bytes());
        }
        bytes
    }
}
