use crate::suite::support::{TestTile, LAYER};
use carto_symbol_index::{BucketInstanceId, CrossTileId, CrossTileSymbolIndex, OverscaledTileId};

#[test]
fn child_tile_reuses_parent_identity_and_unrelated_tile_gets_a_new_one() {
    let mut index = CrossTileSymbolIndex::new();

    // Quantizes to cell (100, 200) on the z10 grid.
    let parent = TestTile::new(10, 0, 0).with_symbols(&[("Main St", 3200, 6400)]);
    let mut tiles = vec![parent];
    assert!(index.add_layer(LAYER, &mut tiles));
    assert_eq!(tiles[0].ids(), vec![1]);

    // 11/0/1 is a child of 10/0/0; its anchor lands on cell (101, 200).
    tiles.push(TestTile::new(11, 0, 1).with_symbols(&[("Main St", 6464, 4608)]));
    // Same key, far away.
    tiles.push(TestTile::new(10, 5, 5).with_symbols(&[("Main St", 3200, 6400)]));
    assert!(index.add_layer(LAYER, &mut tiles));

    assert_eq!(tiles[1].ids(), vec![1]);
    assert_eq!(tiles[2].ids(), vec![2]);
    assert_eq!(index.max_cross_tile_id(), CrossTileId::new(2));
}

#[test]
fn identities_survive_zooming_in_and_back_out() {
    let mut index = CrossTileSymbolIndex::new();
    let symbols = [("Main St", 3200, 6400), ("Park", 1000, 1000)];

    let mut zoomed_out = vec![TestTile::new(10, 0, 0).with_symbols(&symbols)];
    index.add_layer(LAYER, &mut zoomed_out);
    assert_eq!(zoomed_out[0].ids(), vec![1, 2]);

    let mut zoomed_in = vec![
        TestTile::new(11, 0, 0).with_symbols(&[("Park", 2000, 2000)]),
        TestTile::new(11, 0, 1).with_symbols(&[("Main St", 6400, 4608)]),
        TestTile::new(11, 1, 0).with_symbols(&[]),
        TestTile::new(11, 1, 1).with_symbols(&[]),
    ];
    assert!(index.add_layer(LAYER, &mut zoomed_in));
    assert_eq!(zoomed_in[0].ids(), vec![2]);
    assert_eq!(zoomed_in[1].ids(), vec![1]);

    let layer = index.layer_index(LAYER).unwrap();
    assert_eq!(layer.tile_count(), 4, "the parent is no longer offered");
    assert!(!layer.contains_tile(&OverscaledTileId::from_zxy(10, 0, 0).unwrap()));

    // Zooming back out reloads the parent; its labels are found again in the
    // children before those are dropped.
    let mut reloaded = vec![TestTile::new(10, 0, 0).with_symbols(&symbols)];
    assert!(index.add_layer(LAYER, &mut reloaded));
    assert_eq!(reloaded[0].ids(), vec![1, 2]);
    assert_eq!(index.max_cross_tile_id(), CrossTileId::new(2));
    assert_eq!(index.layer_index(LAYER).unwrap().tile_count(), 1);
}

#[test]
fn stale_bucket_is_dropped_when_its_tile_is_not_offered() {
    let mut index = CrossTileSymbolIndex::new();
    let mut tiles: Vec<TestTile> = [(5, 0), (6, 1), (7, 2)]
        .into_iter()
        .map(|(raw, x)| {
            let mut tile = TestTile::new(4, x, 0).with_symbols(&[("A", 100, 100)]);
            tile.symbol_bucket_mut().bucket_instance_id = BucketInstanceId::new(raw);
            tile
        })
        .collect();
    assert!(index.add_layer(LAYER, &mut tiles));
    assert!(!index.add_layer(LAYER, &mut tiles));

    let dropped = tiles.pop().unwrap();
    assert!(index.add_layer(LAYER, &mut tiles));

    let layer = index.layer_index(LAYER).unwrap();
    assert_eq!(layer.tile_count(), 2);
    assert!(!layer.contains_tile(&dropped.id));
    let live: Vec<u64> = layer
        .tiles()
        .map(|tile| tile.bucket_instance_id().get())
        .collect();
    assert_eq!(live, vec![5, 6]);
}

#[test]
fn regenerated_bucket_rematches_reordered_instances() {
    let mut index = CrossTileSymbolIndex::new();
    let mut tiles =
        vec![TestTile::new(10, 0, 0).with_symbols(&[("A", 100, 100), ("B", 5000, 5000)])];
    index.add_layer(LAYER, &mut tiles);
    assert_eq!(tiles[0].ids(), vec![1, 2]);

    tiles[0].regenerate(&[("B", 5000, 5000), ("A", 100, 100)]);
    for instance in &mut tiles[0].symbol_bucket_mut().symbol_instances {
        instance.cross_tile_id = CrossTileId::new(9);
    }
    assert!(index.add_layer(LAYER, &mut tiles));

    assert_eq!(tiles[0].ids(), vec![2, 1]);
    assert_eq!(tiles[0].bucket().bucket_instance_id, BucketInstanceId::new(2));
    assert_eq!(index.max_cross_tile_id(), CrossTileId::new(2));

    // A label that moved away in the new layout is a new label.
    tiles[0].regenerate(&[("B", 5000, 5000), ("A", 4000, 100)]);
    assert!(index.add_layer(LAYER, &mut tiles));
    assert_eq!(tiles[0].ids(), vec![2, 3]);
}

#[test]
fn hidden_tiles_keep_nothing_alive() {
    let mut index = CrossTileSymbolIndex::new();
    let mut tiles = vec![TestTile::new(6, 1, 1).with_symbols(&[("A", 10, 10)])];
    index.add_layer(LAYER, &mut tiles);

    tiles[0].renderable = false;
    assert!(index.add_layer(LAYER, &mut tiles));
    assert!(index.layer_index(LAYER).unwrap().is_empty());

    // Back on screen with the same bucket: indexed again, nothing to match.
    tiles[0].renderable = true;
    assert!(index.add_layer(LAYER, &mut tiles));
    assert_eq!(tiles[0].ids(), vec![2]);
}

#[test]
fn descendant_search_crosses_world_copies() {
    let mut index = CrossTileSymbolIndex::new();
    let child = OverscaledTileId::from_zxy(2, 0, 0).unwrap().with_wrap(1);
    let mut tiles = vec![TestTile::at(child).with_symbols(&[("A", 200, 200)])];
    index.add_layer(LAYER, &mut tiles);

    // The parent lives in wrap 0, yet the descendant check ignores wraps.
    tiles.push(TestTile::new(1, 0, 0).with_symbols(&[("A", 100, 100)]));
    index.add_layer(LAYER, &mut tiles);
    assert_eq!(tiles[1].ids(), vec![1]);
}
