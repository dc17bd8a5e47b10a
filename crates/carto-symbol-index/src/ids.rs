use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Persistent identity of a label across tiles, zooms and bucket regenerations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossTileId(NonZeroU64);

impl CrossTileId {
    /// Returns `None` for `0`, which is never a valid id.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for CrossTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Names one regeneration of one tile's symbol bucket.
///
/// A bucket rebuilt from new layout output must get a new id; an unchanged id
/// tells the layer index the bucket was already reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketInstanceId(NonZeroU64);

impl BucketInstanceId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for BucketInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Monotonic source of [`CrossTileId`]s. Ids are never handed out twice.
///
/// Not `Clone`: a copy would re-issue ids.
#[derive(Debug, Default)]
pub struct CrossTileIdCounter {
    last: Option<NonZeroU64>,
}

impl CrossTileIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently allocated id, if any.
    pub fn last(&self) -> Option<CrossTileId> {
        self.last.map(CrossTileId)
    }

    pub fn allocate(&mut self) -> CrossTileId {
        let id = bump(self.last);
        self.last = Some(id);
        CrossTileId(id)
    }
}

/// Monotonic source of [`BucketInstanceId`]s.
#[derive(Debug, Default)]
pub struct BucketInstanceIdCounter {
    last: Option<NonZeroU64>,
}

impl BucketInstanceIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<BucketInstanceId> {
        self.last.map(BucketInstanceId)
    }

    pub fn allocate(&mut self) -> BucketInstanceId {
        let id = bump(self.last);
        self.last = Some(id);
        BucketInstanceId(id)
    }
}

fn bump(last: Option<NonZeroU64>) -> NonZeroU64 {
    match last {
        Some(last) => last.checked_add(1).expect("id space exhausted"),
        None => NonZeroU64::MIN,
    }
}
