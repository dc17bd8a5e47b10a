//! Replays scripted tile updates through a [`CrossTileSymbolIndex`].
//!
//! A script names symbol buckets once and then lists update passes. Each
//! pass offers, per layer, the tiles currently on screen and the bucket each
//! one carries. A bucket name stands for one layout result on one tile:
//! offering it again in the layer's next pass offers the same bucket (with
//! whatever identities it was given), while offering a different name on the
//! same tile models a regenerated layout.

use anyhow::{bail, Context, Result};
use carto_symbol_index::{
    Anchor, Bucket, CrossTileSymbolIndex, RenderTile, SymbolBucket, SymbolInstance,
};
use carto_tile::OverscaledTileId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    #[serde(default)]
    pub buckets: BTreeMap<String, Vec<ScriptSymbol>>,
    pub passes: Vec<ScriptPass>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptSymbol {
    pub key: String,
    pub anchor: Anchor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptPass {
    /// Clear every layer index (but not the id counters) before this pass.
    #[serde(default)]
    pub reset: bool,
    /// Drop layer indexes for layers this pass does not mention.
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub layers: BTreeMap<String, Vec<ScriptTile>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptTile {
    pub tile: OverscaledTileId,
    #[serde(default = "default_renderable")]
    pub renderable: bool,
    pub bucket: String,
}

fn default_renderable() -> bool {
    true
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;
        let script: ReplayScript = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse replay script {}", path.display()))?;
        Ok(script)
    }
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub passes: Vec<PassReport>,
    pub max_cross_tile_id: Option<u64>,
    pub max_bucket_instance_id: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PassReport {
    pub pass: usize,
    pub pruned: bool,
    pub layers: Vec<LayerReport>,
}

#[derive(Debug, Serialize)]
pub struct LayerReport {
    pub layer: String,
    pub changed: bool,
    pub tiles: Vec<TileReport>,
}

#[derive(Debug, Serialize)]
pub struct TileReport {
    pub tile: String,
    pub bucket: String,
    pub renderable: bool,
    pub bucket_instance_id: Option<u64>,
    pub cross_tile_ids: Vec<Option<u64>>,
}

struct ReplayTile<'a> {
    id: OverscaledTileId,
    renderable: bool,
    layer: &'a str,
    bucket: SymbolBucket,
}

impl RenderTile for ReplayTile<'_> {
    fn id(&self) -> OverscaledTileId {
        self.id
    }

    fn is_renderable(&self) -> bool {
        self.renderable
    }

    fn bucket_mut(&mut self, layer_id: &str) -> Option<&mut dyn Bucket> {
        if layer_id == self.layer {
            Some(&mut self.bucket)
        } else {
            None
        }
    }
}

/// A bucket kept from an earlier pass, and the tile it was offered on.
type LiveBuckets = BTreeMap<String, (OverscaledTileId, SymbolBucket)>;

/// Runs every pass of `script` through `index`.
///
/// A bucket stays with its tile while consecutive passes of its layer keep
/// offering it, so it keeps its bucket instance id and symbol identities. A
/// layer pass that leaves a bucket out drops it; offering the name again
/// later lays it out afresh. Moving a kept bucket to another tile is an
/// error.
pub fn run(script: &ReplayScript, index: &mut CrossTileSymbolIndex) -> Result<ReplayReport> {
    let mut live: BTreeMap<String, LiveBuckets> = BTreeMap::new();
    let mut passes = Vec::with_capacity(script.passes.len());

    for (number, pass) in (1..).zip(&script.passes) {
        if pass.reset {
            index.reset();
        }

        let mut layers = Vec::with_capacity(pass.layers.len());
        for (layer_id, entries) in &pass.layers {
            let mut previous = live.remove(layer_id).unwrap_or_default();
            let mut tiles = Vec::with_capacity(entries.len());
            let mut seen_tiles = BTreeSet::new();
            let mut seen_buckets = BTreeSet::new();
            for entry in entries {
                if !seen_tiles.insert(entry.tile) {
                    bail!(
                        "pass {number}: tile {} appears twice in layer `{layer_id}`",
                        entry.tile
                    );
                }
                if !seen_buckets.insert(entry.bucket.as_str()) {
                    bail!(
                        "pass {number}: bucket `{}` is offered twice in layer `{layer_id}`",
                        entry.bucket
                    );
                }
                let bucket = match previous.remove(&entry.bucket) {
                    Some((tile_id, _)) if tile_id != entry.tile => bail!(
                        "pass {number}: bucket `{}` of layer `{layer_id}` moved from tile {tile_id} to {}",
                        entry.bucket,
                        entry.tile
                    ),
                    Some((_, bucket)) => bucket,
                    None => new_bucket(script, &entry.bucket)
                        .with_context(|| format!("pass {number}, layer `{layer_id}`"))?,
                };
                tiles.push(ReplayTile {
                    id: entry.tile,
                    renderable: entry.renderable,
                    layer: layer_id,
                    bucket,
                });
            }

            let changed = index.add_layer(layer_id, &mut tiles);
            tracing::debug!(
                target: "carto.replay",
                pass = number,
                layer = %layer_id,
                tiles = tiles.len(),
                dropped_buckets = previous.len(),
                changed,
                "replayed layer"
            );

            let mut kept = LiveBuckets::new();
            let mut reports = Vec::with_capacity(tiles.len());
            for (entry, tile) in entries.iter().zip(tiles) {
                reports.push(TileReport {
                    tile: tile.id.to_string(),
                    bucket: entry.bucket.clone(),
                    renderable: tile.renderable,
                    bucket_instance_id: tile.bucket.bucket_instance_id.map(|id| id.get()),
                    cross_tile_ids: tile
                        .bucket
                        .symbol_instances
                        .iter()
                        .map(|instance| instance.cross_tile_id.map(|id| id.get()))
                        .collect(),
                });
                kept.insert(entry.bucket.clone(), (tile.id, tile.bucket));
            }
            live.insert(layer_id.clone(), kept);
            layers.push(LayerReport {
                layer: layer_id.clone(),
                changed,
                tiles: reports,
            });
        }

        let pruned =
            pass.prune && index.prune_unused_layers(pass.layers.keys().map(String::as_str));
        if pass.prune {
            live.retain(|layer_id, _| pass.layers.contains_key(layer_id));
        }
        passes.push(PassReport {
            pass: number,
            pruned,
            layers,
        });
    }

    Ok(ReplayReport {
        passes,
        max_cross_tile_id: index.max_cross_tile_id().map(|id| id.get()),
        max_bucket_instance_id: index.max_bucket_instance_id().map(|id| id.get()),
    })
}

fn new_bucket(script: &ReplayScript, name: &str) -> Result<SymbolBucket> {
    let Some(symbols) = script.buckets.get(name) else {
        bail!("unknown bucket `{name}`");
    };
    Ok(SymbolBucket::new(
        symbols
            .iter()
            .map(|symbol| SymbolInstance::new(symbol.key.clone(), symbol.anchor))
            .collect(),
    ))
}

/// Plain-text rendering of a replay report, one line per tile.
pub fn render_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    for pass in &report.passes {
        out.push_str(&format!("pass {}:\n", pass.pass));
        for layer in &pass.layers {
            let state = if layer.changed { "changed" } else { "unchanged" };
            out.push_str(&format!("  {}: {state}\n", layer.layer));
            for tile in &layer.tiles {
                let ids: Vec<String> = tile
                    .cross_tile_ids
                    .iter()
                    .map(|id| id.map_or_else(|| "-".to_owned(), |id| id.to_string()))
                    .collect();
                let hidden = if tile.renderable { "" } else { " (hidden)" };
                out.push_str(&format!(
                    "    {} [{}]{hidden}: {}\n",
                    tile.tile,
                    tile.bucket,
                    ids.join(", ")
                ));
            }
        }
        if pass.pruned {
            out.push_str("  pruned unused layers\n");
        }
    }
    let max = report
        .max_cross_tile_id
        .map_or_else(|| "none".to_owned(), |id| id.to_string());
    out.push_str(&format!("max cross-tile id: {max}\n"));
    out
}
