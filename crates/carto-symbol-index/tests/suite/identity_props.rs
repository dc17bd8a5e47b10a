use carto_symbol_index::{
    Anchor, BucketInstanceIdCounter, CrossTileId, CrossTileIdCounter, CrossTileSymbolIndex,
    CrossTileSymbolLayerIndex, OverscaledTileId, SymbolInstance,
};
use proptest::collection::vec;
use proptest::prelude::*;

use crate::suite::support::{TestTile, LAYER};

const KEYS: [&str; 3] = ["Main St", "Elm St", "Park"];

type Symbol = (usize, i32, i32);

fn symbol() -> impl Strategy<Value = Symbol> {
    (0..KEYS.len(), 0i32..8192, 0i32..8192)
}

fn bucket() -> impl Strategy<Value = (OverscaledTileId, Vec<Symbol>)> {
    (0u8..=4).prop_flat_map(|z| {
        let dim = 1u32 << z;
        (0..dim, 0..dim, vec(symbol(), 0..6)).prop_map(move |(x, y, symbols)| {
            (OverscaledTileId::from_zxy(z, x, y).unwrap(), symbols)
        })
    })
}

fn instances(symbols: &[Symbol]) -> Vec<SymbolInstance> {
    symbols
        .iter()
        .map(|&(key, x, y)| SymbolInstance::new(KEYS[key], Anchor::new(x, y)))
        .collect()
}

fn raw(id: Option<CrossTileId>) -> u64 {
    id.map_or(0, CrossTileId::get)
}

proptest! {
    #[test]
    fn fresh_ids_are_contiguous_unique_and_idempotent(buckets in vec(bucket(), 1..24)) {
        let mut index = CrossTileSymbolLayerIndex::default();
        let mut counter = CrossTileIdCounter::new();
        let mut bucket_ids = BucketInstanceIdCounter::new();

        for (tile_id, symbols) in buckets {
            let mut symbol_instances = instances(&symbols);
            let bucket_instance_id = bucket_ids.allocate();
            let before = raw(counter.last());

            prop_assert!(index.add_bucket(
                tile_id,
                bucket_instance_id,
                &mut symbol_instances,
                &mut counter,
            ));
            let after = raw(counter.last());
            prop_assert!(after >= before);
            prop_assert!(symbol_instances.iter().all(|i| i.cross_tile_id.is_some()));

            // Matched ids predate this call; new ids follow the counter in
            // bucket order without gaps or repeats.
            let fresh: Vec<u64> = symbol_instances
                .iter()
                .map(|i| raw(i.cross_tile_id))
                .filter(|&id| id > before)
                .collect();
            prop_assert_eq!(fresh, (before + 1..=after).collect::<Vec<_>>());

            let snapshot = symbol_instances.clone();
            let tiles = index.tile_count();
            prop_assert!(!index.add_bucket(
                tile_id,
                bucket_instance_id,
                &mut symbol_instances,
                &mut counter,
            ));
            prop_assert_eq!(&symbol_instances, &snapshot);
            prop_assert_eq!(index.tile_count(), tiles);
            prop_assert_eq!(raw(counter.last()), after);
        }
    }

    #[test]
    fn ids_are_never_reissued_across_resets(passes in vec(vec(bucket(), 1..6), 1..6)) {
        let mut index = CrossTileSymbolIndex::new();
        let mut high_water = 0u64;

        for tiles in passes {
            let mut tiles: Vec<TestTile> = tiles
                .into_iter()
                .map(|(tile_id, symbols)| {
                    let keyed: Vec<(&str, i32, i32)> = symbols
                        .iter()
                        .map(|&(key, x, y)| (KEYS[key], x, y))
                        .collect();
                    TestTile::at(tile_id).with_symbols(&keyed)
                })
                .collect();
            // Duplicate tile ids within one pass would share an index slot.
            tiles.sort_by_key(|tile| tile.id);
            tiles.dedup_by_key(|tile| tile.id);

            index.reset();
            index.add_layer(LAYER, &mut tiles);

            for tile in &tiles {
                for id in tile.ids() {
                    prop_assert!(id > high_water, "id {} reissued after reset", id);
                }
            }
            high_water = raw(index.max_cross_tile_id());
        }
    }
}
