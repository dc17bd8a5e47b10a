use crate::{
    BucketInstanceId, CrossTileIdCounter, QuantizationGrid, SymbolInstance, TileLayerIndex,
};
use carto_tile::OverscaledTileId;
use std::collections::{BTreeMap, HashSet};

/// Cross-tile index of one style layer: overscaled zoom → tile → tile index.
#[derive(Clone, Debug, Default)]
pub struct CrossTileSymbolLayerIndex {
    grid: QuantizationGrid,
    indexes: BTreeMap<u8, BTreeMap<OverscaledTileId, TileLayerIndex>>,
}

impl CrossTileSymbolLayerIndex {
    pub fn new(grid: QuantizationGrid) -> Self {
        Self {
            grid,
            indexes: BTreeMap::new(),
        }
    }

    /// Reconcile the bucket `bucket_instance_id` of `tile_id` with every held
    /// tile and index it. Returns `false` without touching anything when that
    /// exact bucket is already indexed for the tile.
    ///
    /// Identities already present on `symbol_instances` are discarded. Each
    /// instance then takes the identity of a match in a held descendant tile or
    /// in the held ancestor at some coarser or equal zoom (including the
    /// tile's own previous bucket); the rest get fresh ids from `counter`.
    pub fn add_bucket(
        &mut self,
        tile_id: OverscaledTileId,
        bucket_instance_id: BucketInstanceId,
        symbol_instances: &mut [SymbolInstance],
        counter: &mut CrossTileIdCounter,
    ) -> bool {
        if self
            .tile_index(&tile_id)
            .is_some_and(|previous| previous.bucket_instance_id() == bucket_instance_id)
        {
            tracing::trace!(
                target: "carto.symbol_index",
                tile = %tile_id,
                bucket = %bucket_instance_id,
                "bucket already indexed"
            );
            return false;
        }

        for instance in symbol_instances.iter_mut() {
            instance.cross_tile_id = None;
        }

        let mut matched = 0usize;
        for (&zoom, zoom_indexes) in &self.indexes {
            if zoom > tile_id.overscaled_z {
                for child_index in zoom_indexes.values() {
                    if child_index.coord().is_child_of(&tile_id) {
                        matched += child_index.find_matches(symbol_instances, &tile_id);
                    }
                }
            } else if let Some(parent_index) = zoom_indexes.get(&tile_id.scaled_to(zoom)) {
                matched += parent_index.find_matches(symbol_instances, &tile_id);
            }
        }

        let mut assigned = 0usize;
        for instance in symbol_instances.iter_mut() {
            if instance.cross_tile_id.is_none() {
                instance.cross_tile_id = Some(counter.allocate());
                assigned += 1;
            }
        }

        let index = TileLayerIndex::new(tile_id, symbol_instances, bucket_instance_id, self.grid);
        let replaced = self
            .indexes
            .entry(tile_id.overscaled_z)
            .or_default()
            .insert(tile_id, index)
            .is_some();

        tracing::debug!(
            target: "carto.symbol_index",
            tile = %tile_id,
            bucket = %bucket_instance_id,
            symbols = symbol_instances.len(),
            matched,
            assigned,
            replaced,
            "indexed symbol bucket"
        );
        true
    }

    /// Drop every tile whose bucket is not in `current_ids`. Returns whether
    /// anything was dropped.
    pub fn remove_stale_buckets(&mut self, current_ids: &HashSet<BucketInstanceId>) -> bool {
        let mut removed = 0usize;
        self.indexes.retain(|_, zoom_indexes| {
            zoom_indexes.retain(|tile_id, index| {
                let live = current_ids.contains(&index.bucket_instance_id());
                if !live {
                    tracing::trace!(
                        target: "carto.symbol_index",
                        tile = %tile_id,
                        bucket = %index.bucket_instance_id(),
                        "removing stale bucket"
                    );
                    removed += 1;
                }
                live
            });
            !zoom_indexes.is_empty()
        });

        if removed > 0 {
            tracing::debug!(
                target: "carto.symbol_index",
                removed,
                remaining = self.tile_count(),
                "removed stale buckets"
            );
        }
        removed > 0
    }

    /// The index held for exactly `tile_id`, if any.
    pub fn tile_index(&self, tile_id: &OverscaledTileId) -> Option<&TileLayerIndex> {
        self.indexes.get(&tile_id.overscaled_z)?.get(tile_id)
    }

    pub fn contains_tile(&self, tile_id: &OverscaledTileId) -> bool {
        self.tile_index(tile_id).is_some()
    }

    /// Held tile indexes, ordered by overscaled zoom then tile id.
    pub fn tiles(&self) -> impl Iterator<Item = &TileLayerIndex> + '_ {
        self.indexes.values().flat_map(BTreeMap::values)
    }

    pub fn tile_count(&self) -> usize {
        self.indexes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Approximate heap memory usage of this index in bytes.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        use std::mem::size_of;

        let per_tile = (size_of::<OverscaledTileId>() + size_of::<TileLayerIndex>()) as u64;
        self.tiles().fold(0u64, |bytes, index| {
            bytes
                .saturating_add(per_tile)
                .saturating_add(index.estimated_bytes())
        })
    }
}
