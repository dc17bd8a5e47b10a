use crate::{BucketInstanceId, CrossTileId, GridPoint, QuantizationGrid, SymbolInstance};
use carto_tile::OverscaledTileId;
use std::collections::BTreeMap;

/// An indexed symbol: its identity and its anchor on the owning tile's grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexedSymbolInstance {
    pub cross_tile_id: CrossTileId,
    pub coord: GridPoint,
}

/// Snapshot of one tile's reconciled symbol bucket: key → quantized anchors.
///
/// Built once and never mutated; a regenerated bucket produces a new index.
#[derive(Clone, Debug)]
pub struct TileLayerIndex {
    coord: OverscaledTileId,
    bucket_instance_id: BucketInstanceId,
    grid: QuantizationGrid,
    indexed_symbol_instances: BTreeMap<String, Vec<IndexedSymbolInstance>>,
}

impl TileLayerIndex {
    /// Index `symbol_instances` of the tile at `coord`. Called once every
    /// instance has an identity; any instance still without one is left out.
    pub(crate) fn new(
        coord: OverscaledTileId,
        symbol_instances: &[SymbolInstance],
        bucket_instance_id: BucketInstanceId,
        grid: QuantizationGrid,
    ) -> Self {
        let mut indexed_symbol_instances: BTreeMap<String, Vec<IndexedSymbolInstance>> =
            BTreeMap::new();
        for instance in symbol_instances {
            let Some(cross_tile_id) = instance.cross_tile_id else {
                continue;
            };
            indexed_symbol_instances
                .entry(instance.key().to_owned())
                .or_default()
                .push(IndexedSymbolInstance {
                    cross_tile_id,
                    coord: grid.quantize(instance.anchor(), &coord, coord.canonical.z),
                });
        }

        Self {
            coord,
            bucket_instance_id,
            grid,
            indexed_symbol_instances,
        }
    }

    pub fn coord(&self) -> &OverscaledTileId {
        &self.coord
    }

    pub fn bucket_instance_id(&self) -> BucketInstanceId {
        self.bucket_instance_id
    }

    /// Indexed symbols sharing `key`, in bucket order.
    pub fn symbols(&self, key: &str) -> &[IndexedSymbolInstance] {
        self.indexed_symbol_instances
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn symbol_count(&self) -> usize {
        self.indexed_symbol_instances.values().map(Vec::len).sum()
    }

    /// Copy identities from this tile onto matching `symbol_instances` of the
    /// tile at `new_coord`. Returns how many instances were matched.
    ///
    /// A candidate matches the first indexed symbol with the same key whose
    /// cell lies within `tolerance` on both axes, after the candidate has been
    /// quantized onto this tile's grid. The tolerance is one cell when the
    /// candidate tile is finer than this one, and `2^(this z - candidate z)`
    /// cells otherwise. Candidates that already carry an id are left alone.
    pub fn find_matches(
        &self,
        symbol_instances: &mut [SymbolInstance],
        new_coord: &OverscaledTileId,
    ) -> usize {
        let own_z = self.coord.canonical.z;
        let new_z = new_coord.canonical.z;
        let tolerance: u64 = if own_z < new_z {
            1
        } else {
            1u64 << (own_z - new_z)
        };

        let mut matched = 0;
        for instance in symbol_instances.iter_mut() {
            if instance.cross_tile_id.is_some() {
                continue;
            }

            let Some(candidates) = self.indexed_symbol_instances.get(instance.key()) else {
                continue;
            };

            let scaled = self.grid.quantize(instance.anchor(), new_coord, own_z);
            let found = candidates.iter().find(|indexed| {
                indexed.coord.x.abs_diff(scaled.x) <= tolerance
                    && indexed.coord.y.abs_diff(scaled.y) <= tolerance
            });
            if let Some(indexed) = found {
                instance.cross_tile_id = Some(indexed.cross_tile_id);
                matched += 1;
            }
        }
        matched
    }

    /// Approximate heap memory usage of this index in bytes.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        use std::mem::size_of;

        let mut bytes = 0u64;
        bytes = bytes.saturating_add(
            (self.indexed_symbol_instances.len() as u64).saturating_mul(
                (size_of::<String>() + size_of::<Vec<IndexedSymbolInstance>>()) as u64,
            ),
        );
        for (key, symbols) in &self.indexed_symbol_instances {
            bytes = bytes.saturating_add(key.capacity() as u64);
            bytes = bytes.saturating_add(
                (symbols.capacity() as u64)
                    .saturating_mul(size_of::<IndexedSymbolInstance>() as u64),
            );
        }
        bytes
    }
}
