//! Remembering which structure origins were already processed, plus short-TTL
//! runtime caches that keep the periodic re-scans cheap.

use hashbrown::{HashMap, HashSet};

use crate::locate::FoundMarker;
use crate::math::Cube;
use crate::service::Tick;
use crate::space::DimensionId;

/// Per-dimension record of processed structure origins and scan caches.
///
/// The processed sets are the durable part; convert through [`schema`] to
/// persist them. The two caches are runtime-only and rebuilt on demand: a
/// chunk-scan cache so a chunk with no markers is not re-scanned more than once
/// per TTL window, and a marker cache so a structure's markers are not
/// re-located every tick while its placement waits on world generation.
///
/// All keys carry the [`DimensionId`], so one tracker may serve several
/// dimensions containing occurrences of the same structure type.
#[derive(Debug, Default)]
pub struct IdempotencyTracker {
    processed: HashMap<DimensionId, HashSet<Cube>>,
    chunk_scans: HashMap<(DimensionId, Cube), Tick>,
    markers: HashMap<(DimensionId, Cube), (Tick, Vec<FoundMarker>)>,
}

impl IdempotencyTracker {
    /// Whether the structure at `origin` has already been handled (or abandoned).
    pub fn is_processed(&self, dimension: &DimensionId, origin: Cube) -> bool {
        self.processed
            .get(dimension)
            .is_some_and(|set| set.contains(&origin))
    }

    /// Record `origin` as handled. Returns `false` if it already was.
    pub fn mark_processed(&mut self, dimension: &DimensionId, origin: Cube) -> bool {
        self.processed
            .entry(dimension.clone())
            .or_default()
            .insert(origin)
    }

    /// How many origins are recorded for `dimension`.
    pub fn processed_count(&self, dimension: &DimensionId) -> usize {
        self.processed.get(dimension).map_or(0, HashSet::len)
    }

    /// Whether `chunk` was scanned within the last `ttl` ticks.
    pub fn chunk_recently_scanned(
        &self,
        dimension: &DimensionId,
        chunk: Cube,
        now: Tick,
        ttl: u64,
    ) -> bool {
        self.chunk_scans
            .get(&(dimension.clone(), chunk))
            .is_some_and(|&at| now.saturating_sub(at) < ttl)
    }

    /// Record that `chunk` was scanned at `now`.
    pub fn note_chunk_scanned(&mut self, dimension: &DimensionId, chunk: Cube, now: Tick) {
        self.chunk_scans.insert((dimension.clone(), chunk), now);
    }

    /// The cached marker scan for the structure at `origin`, if still fresh.
    pub fn cached_markers(
        &self,
        dimension: &DimensionId,
        origin: Cube,
        now: Tick,
        ttl: u64,
    ) -> Option<&[FoundMarker]> {
        let (at, markers) = self.markers.get(&(dimension.clone(), origin))?;
        (now.saturating_sub(*at) < ttl).then_some(markers.as_slice())
    }

    /// Cache the marker scan for the structure at `origin`.
    pub fn cache_markers(
        &mut self,
        dimension: &DimensionId,
        origin: Cube,
        now: Tick,
        markers: Vec<FoundMarker>,
    ) {
        self.markers
            .insert((dimension.clone(), origin), (now, markers));
    }

    /// Drop the cached markers for `origin` (they were consumed by placement).
    pub fn forget_markers(&mut self, dimension: &DimensionId, origin: Cube) {
        self.markers.remove(&(dimension.clone(), origin));
    }

    /// Drop cache entries older than `ttl`, bounding memory across long runs.
    pub fn expire_caches(&mut self, now: Tick, ttl: u64) {
        self.chunk_scans
            .retain(|_, &mut at| now.saturating_sub(at) < ttl);
        self.markers
            .retain(|_, &mut (at, _)| now.saturating_sub(at) < ttl);
    }

    /// Convert the durable part (the processed sets only) to its serialized form.
    ///
    /// Output order is sorted so identical registries serialize identically.
    pub fn to_snapshot(&self) -> schema::TrackerSnapshot {
        let mut dimensions: Vec<schema::DimensionEntry> = self
            .processed
            .iter()
            .filter(|(_, origins)| !origins.is_empty())
            .map(|(dimension, origins)| {
                let mut origins: Vec<[i32; 3]> =
                    origins.iter().map(|cube| [cube.x, cube.y, cube.z]).collect();
                origins.sort_unstable();
                schema::DimensionEntry {
                    dimension: dimension.0.clone(),
                    origins,
                }
            })
            .collect();
        dimensions.sort_unstable_by(|a, b| a.dimension.cmp(&b.dimension));
        schema::TrackerSnapshot::V1 { dimensions }
    }

    /// Reconstruct a tracker from its serialized form.
    ///
    /// The caches start empty; they are never persisted.
    pub fn from_snapshot(snapshot: schema::TrackerSnapshot) -> Self {
        let schema::TrackerSnapshot::V1 { dimensions } = snapshot;
        let mut tracker = Self::default();
        for entry in dimensions {
            let dimension = DimensionId(entry.dimension);
            let set: &mut HashSet<Cube> = tracker.processed.entry(dimension).or_default();
            for [x, y, z] in entry.origins {
                set.insert(Cube::new(x, y, z));
            }
        }
        tracker
    }
}

/// Serde types for the persisted processed-structure registry.
///
/// These are deliberately separate from the runtime types: the on-disk form is
/// a stable format with an explicit version tag, and origins are stored as
/// plain coordinate triples rather than [`Cube`]s.
pub mod schema {
    use serde::{Deserialize, Serialize};

    /// Top-level persisted registry.
    #[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "version")]
    pub enum TrackerSnapshot {
        /// Initial format.
        #[serde(rename = "1")]
        V1 {
            /// One entry per dimension with at least one processed origin.
            dimensions: Vec<DimensionEntry>,
        },
    }

    /// The processed origins of one dimension.
    #[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
    pub struct DimensionEntry {
        /// The dimension's stable name.
        pub dimension: String,
        /// Processed structure origins, as `[x, y, z]`.
        pub origins: Vec<[i32; 3]>,
    }
}
