//! The per-world annex service: discovers structure occurrences, runs the
//! placement pipeline, and owns all the shared mutable state.

use core::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use hashbrown::HashMap;
use rand::SeedableRng as _;
use rand_xoshiro::Xoshiro256Plus;

use crate::block::{MarkerKind, Palette};
use crate::candidate::{self, MissingSocket};
use crate::collision;
use crate::corridor::{self, DescentError};
use crate::locate::{self, FoundMarker};
use crate::math::{Cube, Face6, GridAab, GridCoordinate, Rotation};
use crate::placer::{
    self, Chain, IntentionalWaterloggingSet, ProtectedAreaList, Processor, standard_processors,
};
use crate::policy::{self, Phase, Selection};
use crate::solve;
use crate::space::{DimensionId, SetCubeError, VoxelWorld};
use crate::template::{SocketRole, TemplateLoadError, TemplateSource};
use crate::tracker::{IdempotencyTracker, schema};

/// Game time, in host ticks. Monotonic within a world.
pub type Tick = u64;

/// Work postponed to a future tick.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DeferredTask {
    /// Re-run the waterlogging finalize pass over `bounds`, to catch
    /// waterlogging reintroduced by neighboring chunks generating later.
    FinalizeWaterlogging {
        /// Dimension the box belongs to.
        dimension: DimensionId,
        /// The box to reconcile.
        bounds: GridAab,
    },
}

impl DeferredTask {
    fn dimension(&self) -> &DimensionId {
        match self {
            DeferredTask::FinalizeWaterlogging { dimension, .. } => dimension,
        }
    }
}

#[derive(Debug)]
struct QueuedTask {
    at: Tick,
    /// Insertion order; tasks due on the same tick run first-scheduled-first.
    seq: u64,
    task: DeferredTask,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        (self.at, self.seq) == (other.at, other.seq)
    }
}
impl Eq for QueuedTask {}
impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Stand-in for the host's "run at tick N+k" capability: tasks are queued with
/// a due tick and drained by [`Scheduler::due`] from the host's tick callback.
///
/// Modeling this as a queue of [`DeferredTask`] values (rather than closures)
/// keeps the pipeline testable by advancing a fake clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<QueuedTask>>,
    next_seq: u64,
}

impl Scheduler {
    /// Queue `task` to run at tick `at`.
    pub fn schedule(&mut self, at: Tick, task: DeferredTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(QueuedTask { at, seq, task }));
    }

    /// Remove and return the tasks for `dimension` that are due at `now`.
    ///
    /// Due tasks belonging to other dimensions are left queued; each
    /// dimension's own tick callback drains them.
    pub fn due(&mut self, now: Tick, dimension: &DimensionId) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        let mut other = Vec::new();
        while let Some(Reverse(queued)) = self.queue.peek() {
            if queued.at > now {
                break;
            }
            let Reverse(queued) = self.queue.pop().unwrap();
            if queued.task.dimension() == dimension {
                due.push(queued.task);
            } else {
                other.push(queued);
            }
        }
        for queued in other {
            self.queue.push(Reverse(queued));
        }
        due
    }

    /// Number of queued tasks, due or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no tasks are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Tuning knobs of the annex pipeline.
///
/// The numeric defaults are empirically tuned for the default module set, not
/// derived; retune them when retargeting to modules of different sizes.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct AnnexConfig {
    /// Minimum number of dead-end markers before placement proceeds, so we
    /// never commit against a maze that has not finished generating.
    pub min_marker_count: usize,
    /// Horizontal half-extent of the marker search box when the host reports
    /// no structure bounds.
    pub marker_search_radius: u32,
    /// Vertical extent of that fallback search box.
    pub marker_search_height: u32,
    /// How far to probe from a marker when detecting its opening direction.
    pub probe_distance: GridCoordinate,
    /// Diagonal offset of the Phase C isolated placement from the maze's
    /// bounding box.
    pub fallback_offset: GridCoordinate,
    /// Floor elevation of a Phase C isolated placement.
    pub isolated_floor_y: GridCoordinate,
    /// Edge length of the room cells collisions are quantized to.
    pub cell_footprint: u32,
    /// Hard cap on stair segments per descent.
    pub stair_cap: usize,
    /// Elevation the stair chain descends toward.
    pub corridor_target_y: GridCoordinate,
    /// Socket-height compensation between the stair and terminus templates.
    pub terminus_socket_correction: GridCoordinate,
    /// Tick offsets, relative to placement, of the finalize re-runs.
    pub finalize_delays: Vec<u64>,
    /// Lifetime of the chunk-scan and marker caches, in ticks.
    pub scan_cache_ttl: u64,
    /// Template name of the connector corridor module.
    pub connector_template: String,
    /// Template name of the boss chamber module.
    pub boss_template: String,
    /// Template name of the repeating stair segment.
    pub stair_template: String,
    /// Template name of the vault terminating the stair chain.
    pub terminus_template: String,
}

impl Default for AnnexConfig {
    fn default() -> Self {
        Self {
            min_marker_count: 3,
            marker_search_radius: 30,
            marker_search_height: 40,
            probe_distance: 5,
            fallback_offset: 150,
            isolated_floor_y: 64,
            cell_footprint: 7,
            stair_cap: 100,
            corridor_target_y: -4,
            terminus_socket_correction: 1,
            finalize_delays: vec![20, 60],
            scan_cache_ttl: 200,
            connector_template: String::from("annex/connector"),
            boss_template: String::from("annex/boss_chamber"),
            stair_template: String::from("annex/stair_segment"),
            terminus_template: String::from("annex/vault"),
        }
    }
}

/// Why one structure occurrence could not be (or was not) extended this tick.
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum AnnexError {
    /// structure volume not generated yet; will retry
    NotYetGenerated,
    /// found {found} dead-end markers, need {required}; will retry
    InsufficientMarkers {
        /// Dead-end markers discovered so far.
        found: usize,
        /// The configured minimum.
        required: usize,
    },
    /// {0}
    TemplateLoad(TemplateLoadError),
    /// {0}
    MissingSocket(MissingSocket),
    /// {0}
    Descent(DescentError),
    /// {0}
    Placement(SetCubeError),
}

impl core::error::Error for AnnexError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            AnnexError::NotYetGenerated | AnnexError::InsufficientMarkers { .. } => None,
            AnnexError::TemplateLoad(e) => Some(e),
            AnnexError::MissingSocket(e) => Some(e),
            AnnexError::Descent(e) => Some(e),
            AnnexError::Placement(e) => Some(e),
        }
    }
}

impl From<TemplateLoadError> for AnnexError {
    fn from(e: TemplateLoadError) -> Self {
        AnnexError::TemplateLoad(e)
    }
}
impl From<MissingSocket> for AnnexError {
    fn from(e: MissingSocket) -> Self {
        AnnexError::MissingSocket(e)
    }
}
impl From<DescentError> for AnnexError {
    fn from(e: DescentError) -> Self {
        AnnexError::Descent(e)
    }
}
impl From<SetCubeError> for AnnexError {
    fn from(e: SetCubeError) -> Self {
        AnnexError::Placement(e)
    }
}

impl AnnexError {
    /// Whether the same occurrence should be attempted again on a later tick.
    ///
    /// Non-retryable errors mark the occurrence abandoned instead; a missing or
    /// corrupt template would fail identically on every retry.
    pub fn retry_later(&self) -> bool {
        matches!(
            self,
            AnnexError::NotYetGenerated | AnnexError::InsufficientMarkers { .. }
        )
    }
}

/// One host-reported occurrence of the base maze structure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StructureOccurrence {
    /// The occurrence's origin position, its identity for idempotency purposes.
    pub origin: Cube,
    /// The host's bounding box for the occurrence, if it reports one.
    pub bounds: Option<GridAab>,
}

/// Derive the RNG seed for one occurrence, so identical worlds make identical
/// placement choices.
fn placement_seed(dimension: &DimensionId, origin: Cube) -> u64 {
    // FNV-1a over the dimension name and origin coordinates.
    let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
    let mut mix = |byte: u8| {
        seed = (seed ^ u64::from(byte)).wrapping_mul(0x100_0000_01b3);
    };
    for byte in dimension.0.bytes() {
        mix(byte);
    }
    for coordinate in [origin.x, origin.y, origin.z] {
        for byte in coordinate.to_le_bytes() {
            mix(byte);
        }
    }
    seed
}

const CHUNK_EDGE: GridCoordinate = 16;

/// The structure-stitching engine for one host world.
///
/// One instance owns all shared mutable state (processed-structure registry,
/// waterlogging set, scan caches, deferred-task queue); the host calls
/// [`AnnexService::tick`] from each dimension's periodic callback. Nothing
/// escapes the tick boundary: per-occurrence failures are caught and logged
/// here, so one occurrence's failure never prevents processing of others.
#[derive(Debug)]
pub struct AnnexService {
    config: AnnexConfig,
    palette: Palette,
    templates: Arc<dyn TemplateSource>,
    tracker: IdempotencyTracker,
    waterlogging: IntentionalWaterloggingSet,
    scheduler: Scheduler,
    processors: Vec<Box<dyn Processor>>,
    points_of_interest: HashMap<DimensionId, Vec<Cube>>,
}

impl AnnexService {
    /// Construct a service with a fresh (nothing processed) registry.
    pub fn new(config: AnnexConfig, palette: Palette, templates: Arc<dyn TemplateSource>) -> Self {
        Self {
            config,
            palette,
            templates,
            tracker: IdempotencyTracker::default(),
            waterlogging: IntentionalWaterloggingSet::default(),
            scheduler: Scheduler::default(),
            processors: standard_processors(),
            points_of_interest: HashMap::new(),
        }
    }

    /// The service's configuration.
    pub fn config(&self) -> &AnnexConfig {
        &self.config
    }

    /// Committed boss-chamber centers in `dimension`, in commit order.
    ///
    /// An external mob-spawning subsystem polls these; this engine never spawns
    /// entities itself.
    pub fn points_of_interest(&self, dimension: &DimensionId) -> &[Cube] {
        self.points_of_interest
            .get(dimension)
            .map_or(&[], Vec::as_slice)
    }

    /// Serialize the durable processed-structure registry.
    pub fn to_snapshot(&self) -> schema::TrackerSnapshot {
        self.tracker.to_snapshot()
    }

    /// Replace the processed-structure registry with a persisted one.
    pub fn restore_snapshot(&mut self, snapshot: schema::TrackerSnapshot) {
        self.tracker = IdempotencyTracker::from_snapshot(snapshot);
    }

    /// Whether the occurrence at `origin` has been handled (or abandoned).
    pub fn is_processed(&self, dimension: &DimensionId, origin: Cube) -> bool {
        self.tracker.is_processed(dimension, origin)
    }

    /// One dimension's periodic callback: run due deferred tasks, then attempt
    /// every reported occurrence that has not been processed yet.
    ///
    /// Never panics or returns an error; all failures are logged here.
    pub fn tick(
        &mut self,
        world: &mut dyn VoxelWorld,
        dimension: &DimensionId,
        now: Tick,
        occurrences: &[StructureOccurrence],
    ) {
        for task in self.scheduler.due(now, dimension) {
            let DeferredTask::FinalizeWaterlogging {
                dimension: task_dimension,
                bounds,
            } = task;
            if let Err(error) = placer::finalize_waterlogging(
                world,
                bounds,
                &task_dimension,
                &mut self.waterlogging,
                &self.palette,
            ) {
                log::error!("deferred waterlogging finalize over {bounds:?} failed: {error}");
            }
        }

        self.tracker.expire_caches(now, self.config.scan_cache_ttl);

        for occurrence in occurrences {
            if self.tracker.is_processed(dimension, occurrence.origin) {
                continue;
            }
            match self.process_occurrence(world, dimension, now, *occurrence) {
                Ok(phase) => {
                    log::info!(
                        "annex committed for structure at {origin:?} via {phase:?}",
                        origin = occurrence.origin,
                    );
                    self.tracker.mark_processed(dimension, occurrence.origin);
                    self.tracker.forget_markers(dimension, occurrence.origin);
                }
                Err(error) if error.retry_later() => {
                    log::debug!(
                        "annex for structure at {origin:?} deferred: {error}",
                        origin = occurrence.origin,
                    );
                }
                Err(error) => {
                    log::error!(
                        "annex for structure at {origin:?} abandoned: {error}",
                        origin = occurrence.origin,
                    );
                    self.tracker.mark_processed(dimension, occurrence.origin);
                    self.tracker.forget_markers(dimension, occurrence.origin);
                }
            }
        }
    }

    /// Locate the occurrence's markers, consulting and maintaining the caches.
    fn locate_markers(
        &mut self,
        world: &dyn VoxelWorld,
        dimension: &DimensionId,
        now: Tick,
        occurrence: StructureOccurrence,
    ) -> Result<Vec<FoundMarker>, AnnexError> {
        let ttl = self.config.scan_cache_ttl;
        if let Some(cached) = self
            .tracker
            .cached_markers(dimension, occurrence.origin, now, ttl)
        {
            return Ok(cached.to_vec());
        }

        let chunk = occurrence.origin.map(|c| c.div_euclid(CHUNK_EDGE));
        if self
            .tracker
            .chunk_recently_scanned(dimension, chunk, now, ttl)
        {
            return Err(AnnexError::NotYetGenerated);
        }

        let bounds = locate::search_volume(
            occurrence.origin,
            occurrence.bounds,
            self.config.marker_search_radius,
            self.config.marker_search_height,
        );
        let scan = locate::find_markers(world, &self.palette, bounds);
        if scan.markers.is_empty() {
            self.tracker.note_chunk_scanned(dimension, chunk, now);
            return Err(AnnexError::NotYetGenerated);
        }
        if scan.complete {
            self.tracker
                .cache_markers(dimension, occurrence.origin, now, scan.markers.clone());
        }
        Ok(scan.markers)
    }

    /// The full decision pipeline for one occurrence, run to completion
    /// synchronously. Returns the phase that committed.
    fn process_occurrence(
        &mut self,
        world: &mut dyn VoxelWorld,
        dimension: &DimensionId,
        now: Tick,
        occurrence: StructureOccurrence,
    ) -> Result<Phase, AnnexError> {
        let markers = self.locate_markers(world, dimension, now, occurrence)?;
        let anchors: Vec<Cube> = markers
            .iter()
            .filter(|marker| marker.kind == MarkerKind::DeadEnd)
            .map(|marker| marker.cube)
            .collect();
        if anchors.len() < self.config.min_marker_count {
            return Err(AnnexError::InsufficientMarkers {
                found: anchors.len(),
                required: self.config.min_marker_count,
            });
        }

        let connector = self.templates.load(&self.config.connector_template)?;
        let boss = self.templates.load(&self.config.boss_template)?;
        let stairs = self.templates.load(&self.config.stair_template)?;
        let terminus = self.templates.load(&self.config.terminus_template)?;

        let mut candidates = Vec::new();
        {
            let reader: &dyn VoxelWorld = &*world;
            for &anchor in &anchors {
                let Some(opening) = solve::detect_opening_direction(
                    |cube| {
                        reader
                            .block(cube)
                            .is_some_and(|state| self.palette.is_passable(state.id))
                    },
                    anchor,
                    self.config.probe_distance,
                ) else {
                    // Sealed marker; nothing to preserve, nothing to attach to.
                    continue;
                };
                let mut anchor_candidates =
                    candidate::candidates_for_anchor(&connector, &boss, anchor, opening)?;
                for candidate in &mut anchor_candidates {
                    let report = collision::evaluate(
                        reader,
                        &self.palette,
                        candidate.bounds,
                        self.config.cell_footprint,
                    );
                    candidate.collisions = report.count;
                    candidate.colliding_cells = report.cells;
                }
                candidates.extend(anchor_candidates);
            }
        }

        let mut rng =
            Xoshiro256Plus::seed_from_u64(placement_seed(dimension, occurrence.origin));
        let selection = policy::select(
            candidates,
            occurrence.bounds,
            self.config.fallback_offset,
            self.config.isolated_floor_y,
            &mut rng,
        );
        let phase = selection.phase();

        let mut chain = Chain {
            palette: &self.palette,
            dimension,
            waterlogging: &mut self.waterlogging,
            scheduler: &mut self.scheduler,
            now,
            finalize_delays: &self.config.finalize_delays,
            processors: &self.processors,
            protected: ProtectedAreaList::default(),
        };

        let boss_placed = match &selection {
            Selection::Chained { candidate, .. } => {
                chain.place(
                    world,
                    &connector,
                    candidate.connector_position,
                    candidate.rotation,
                )?;
                // The anchor marker has served its purpose only now that the
                // connector is committed against it.
                placer::clear_marker(world, &self.palette, candidate.anchor)?;
                chain.place(world, &boss, candidate.boss_position, candidate.boss_rotation)?
            }
            Selection::Isolated { anchor } => chain.place(world, &boss, *anchor, Rotation::R0)?,
        };

        // Descend from the boss chamber's floor hatch, if its template has one.
        if let Some(hatch) = boss.world_socket(
            SocketRole::Bottom,
            boss_placed.position,
            boss_placed.rotation,
        ) {
            let plan = corridor::plan_descent(
                &stairs,
                &terminus,
                hatch.cube + Face6::NY.normal_vector(),
                hatch.facing,
                self.config.corridor_target_y,
                self.config.terminus_socket_correction,
                self.config.stair_cap,
            )?;
            corridor::build_descent(world, &plan, &stairs, &terminus, &mut chain)?;
        }

        // Cleanup runs whichever phase fired.
        for marker in &markers {
            placer::clear_marker(world, &self.palette, marker.cube)?;
        }

        self.points_of_interest
            .entry(dimension.clone())
            .or_default()
            .push(boss_placed.bounds.center_cube());
        Ok(phase)
    }
}
