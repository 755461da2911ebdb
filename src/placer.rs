//! Writing module templates into the world: fluid pre-pass, processor pipeline,
//! and the waterlogging finalize pass.

use core::fmt;

use hashbrown::HashSet;

use crate::block::{BlockState, FLUID_LEVEL_FULL, Palette};
use crate::math::{Cube, GridAab, Rotation};
use crate::service::{DeferredTask, Scheduler, Tick};
use crate::space::{DimensionId, SetCubeError, VoxelWorld};
use crate::template::ModuleTemplate;

/// Process-lifetime record of block positions whose fluid-presence flag was
/// deliberately set by a placement processor.
///
/// An entry is consumed (removed) exactly once, by the finalize pass that
/// restores it after host generation has stripped the flag. Entries whose flag
/// is intact stay recorded, so the delayed re-runs keep distinguishing
/// intentional water from water leaked in by neighboring generation.
#[derive(Debug, Default)]
pub struct IntentionalWaterloggingSet {
    cubes: HashSet<(DimensionId, Cube)>,
}

impl IntentionalWaterloggingSet {
    /// Record that `cube` is intentionally waterlogged.
    pub fn insert(&mut self, dimension: &DimensionId, cube: Cube) {
        self.cubes.insert((dimension.clone(), cube));
    }

    /// Whether `cube` is recorded as intentionally waterlogged.
    pub fn contains(&self, dimension: &DimensionId, cube: Cube) -> bool {
        // TODO(perf): keying a HashSet by (DimensionId, Cube) clones the
        // dimension name per lookup; intern the id if this shows up in profiles.
        self.cubes.contains(&(dimension.clone(), cube))
    }

    /// Remove and return whether `cube` was recorded. One-shot.
    pub fn consume(&mut self, dimension: &DimensionId, cube: Cube) -> bool {
        self.cubes.remove(&(dimension.clone(), cube))
    }

    /// Number of unconsumed entries.
    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    /// Whether there are no unconsumed entries.
    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }
}

/// Bounding boxes of modules already committed in the current placement chain.
///
/// The fluid-clearing pre-pass consults this so a later module never strips
/// fluid belonging to an earlier, already-finished module of the same chain.
#[derive(Clone, Debug, Default)]
pub struct ProtectedAreaList {
    areas: Vec<GridAab>,
}

impl ProtectedAreaList {
    /// Protect `bounds` for the rest of this chain.
    pub fn push(&mut self, bounds: GridAab) {
        self.areas.push(bounds);
    }

    /// Whether `cube` lies inside any protected box.
    pub fn contains(&self, cube: Cube) -> bool {
        self.areas.iter().any(|area| area.contains_cube(cube))
    }

    /// The protected boxes, in commit order.
    pub fn areas(&self) -> &[GridAab] {
        &self.areas
    }
}

/// Mutable state a [`Processor`] may consult and update per block.
#[derive(Debug)]
pub struct ProcessorState<'a> {
    /// Block classification.
    pub palette: &'a Palette,
    /// Dimension being placed into.
    pub dimension: &'a DimensionId,
    /// Intentional-waterlogging record.
    pub waterlogging: &'a mut IntentionalWaterloggingSet,
}

/// A per-block transform applied while instantiating a template.
///
/// `authored` is the block as written in the template; `current` is the state
/// as produced by bulk instantiation (which normalizes fluid level to full and
/// drops waterlogging) and by any earlier processors in the pipeline.
pub trait Processor: fmt::Debug {
    /// Transform one block about to be written at `cube`.
    fn process(
        &self,
        cube: Cube,
        authored: &BlockState,
        current: BlockState,
        state: &mut ProcessorState<'_>,
    ) -> BlockState;
}

/// Converts the decorative-fluid placeholder block into real fluid, and records
/// authored waterlogging in the [`IntentionalWaterloggingSet`] so the finalize
/// pass can restore it after bulk instantiation drops the flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecorativeFluidProcessor;

impl Processor for DecorativeFluidProcessor {
    fn process(
        &self,
        cube: Cube,
        authored: &BlockState,
        mut current: BlockState,
        state: &mut ProcessorState<'_>,
    ) -> BlockState {
        if authored.id == state.palette.decorative_fluid {
            current.id = state.palette.ambient_fluid;
        }
        if authored.waterlogged && state.palette.is_hydratable(current.id) {
            state.waterlogging.insert(state.dimension, cube);
        }
        current
    }
}

/// Copies each block's authored fluid fill level onto the placed state, so
/// partially filled fluid blocks are not flattened to full.
#[derive(Clone, Copy, Debug, Default)]
pub struct FluidLevelProcessor;

impl Processor for FluidLevelProcessor {
    fn process(
        &self,
        _cube: Cube,
        authored: &BlockState,
        mut current: BlockState,
        state: &mut ProcessorState<'_>,
    ) -> BlockState {
        if state.palette.is_fluid(current.id) {
            current.fluid_level = authored.fluid_level;
        }
        current
    }
}

/// The processor pipeline every placement in this crate uses.
pub fn standard_processors() -> Vec<Box<dyn Processor>> {
    vec![
        Box::new(DecorativeFluidProcessor),
        Box::new(FluidLevelProcessor),
    ]
}

/// Everything [`place_module`] needs besides the template and transform.
#[derive(Debug)]
pub struct PlaceContext<'a> {
    /// Block classification.
    pub palette: &'a Palette,
    /// Dimension being placed into.
    pub dimension: &'a DimensionId,
    /// Intentional-waterlogging record, shared across the whole service.
    pub waterlogging: &'a mut IntentionalWaterloggingSet,
    /// Boxes committed earlier in this chain; the fluid pre-pass skips them.
    pub protected: &'a ProtectedAreaList,
    /// Sink for the deferred finalize re-runs.
    pub scheduler: &'a mut Scheduler,
    /// Current tick, used as the base for scheduling.
    pub now: Tick,
    /// Tick offsets at which to re-run the finalize pass.
    pub finalize_delays: &'a [u64],
    /// Per-block transforms.
    pub processors: &'a [Box<dyn Processor>],
}

/// A module committed to the world.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlacedModule {
    /// Template name, for logging.
    pub name: String,
    /// Most negative corner of the placement.
    pub position: Cube,
    /// Rotation the template was placed with.
    pub rotation: Rotation,
    /// Rotation-aware world bounding box.
    pub bounds: GridAab,
}

/// Write `template` into the world at `position` with `rotation`.
///
/// 1. Pre-pass: clear generation-time ambient fluid from the target box,
///    excluding decorative-fluid placeholder blocks (distinguished by block
///    identity) and any protected earlier module of the chain.
/// 2. Instantiate the template's blocks through the processor pipeline.
/// 3. Run the waterlogging finalize pass over the box.
/// 4. Schedule finalize re-runs at the configured future-tick offsets, to catch
///    waterlogging reintroduced by neighboring chunks generating later.
///
/// Sentinel marker cleanup is *not* done here; callers remove a module's
/// markers only after the next module of the chain has been placed against it.
pub fn place_module(
    world: &mut dyn VoxelWorld,
    template: &ModuleTemplate,
    position: Cube,
    rotation: Rotation,
    cx: &mut PlaceContext<'_>,
) -> Result<PlacedModule, SetCubeError> {
    let bounds = template.bounds_at(position, rotation);
    log::debug!(
        "placing {name:?} at {position:?} rotation {rotation:?}",
        name = template.name(),
    );

    // Ambient fluid pre-pass.
    for cube in bounds.interior_iter() {
        if cx.protected.contains(cube) {
            continue;
        }
        let Some(state) = world.block(cube) else {
            continue;
        };
        if cx.palette.is_fluid(state.id) && state.id != cx.palette.decorative_fluid {
            world.set_block(cube, BlockState::of(cx.palette.air))?;
        }
    }

    // Instantiate through the processor pipeline. Bulk instantiation flattens
    // fluid fill levels, like host template engines do; the processors put
    // back what was authored.
    for (offset, authored) in template.blocks() {
        let cube = position + rotation.transform_cell(template.size(), offset);
        let mut state = authored;
        if cx.palette.is_fluid(state.id) {
            state.fluid_level = FLUID_LEVEL_FULL;
        }
        let mut processor_state = ProcessorState {
            palette: cx.palette,
            dimension: cx.dimension,
            waterlogging: cx.waterlogging,
        };
        for processor in cx.processors {
            state = processor.process(cube, &authored, state, &mut processor_state);
        }
        world.set_block(cube, state)?;
    }

    finalize_waterlogging(world, bounds, cx.dimension, cx.waterlogging, cx.palette)?;

    for &delay in cx.finalize_delays {
        cx.scheduler.schedule(
            cx.now + delay,
            DeferredTask::FinalizeWaterlogging {
                dimension: cx.dimension.clone(),
                bounds,
            },
        );
    }

    Ok(PlacedModule {
        name: template.name().to_owned(),
        position,
        rotation,
        bounds,
    })
}

/// Drives the placements of one chain (connector, boss, stair segments,
/// terminus), accumulating each committed bounding box into the
/// [`ProtectedAreaList`] consulted by every later placement of the same chain.
#[derive(Debug)]
pub struct Chain<'a> {
    /// Block classification.
    pub palette: &'a Palette,
    /// Dimension being placed into.
    pub dimension: &'a DimensionId,
    /// Intentional-waterlogging record, shared across the whole service.
    pub waterlogging: &'a mut IntentionalWaterloggingSet,
    /// Sink for deferred finalize re-runs.
    pub scheduler: &'a mut Scheduler,
    /// Current tick.
    pub now: Tick,
    /// Tick offsets for finalize re-runs.
    pub finalize_delays: &'a [u64],
    /// Per-block transforms.
    pub processors: &'a [Box<dyn Processor>],
    /// Boxes committed so far in this chain.
    pub protected: ProtectedAreaList,
}

impl Chain<'_> {
    /// Place one module and protect its box for the rest of the chain.
    pub fn place(
        &mut self,
        world: &mut dyn VoxelWorld,
        template: &ModuleTemplate,
        position: Cube,
        rotation: Rotation,
    ) -> Result<PlacedModule, SetCubeError> {
        let mut cx = PlaceContext {
            palette: self.palette,
            dimension: self.dimension,
            waterlogging: &mut *self.waterlogging,
            protected: &self.protected,
            scheduler: &mut *self.scheduler,
            now: self.now,
            finalize_delays: self.finalize_delays,
            processors: self.processors,
        };
        let placed = place_module(world, template, position, rotation, &mut cx)?;
        self.protected.push(placed.bounds);
        Ok(placed)
    }
}

/// Reconcile every hydratable block in `bounds` against the intentional
/// waterlogging record: forcibly clear the flag where no entry exists, restore
/// it where one does, consuming the entry when a restore actually happens.
pub fn finalize_waterlogging(
    world: &mut dyn VoxelWorld,
    bounds: GridAab,
    dimension: &DimensionId,
    waterlogging: &mut IntentionalWaterloggingSet,
    palette: &Palette,
) -> Result<(), SetCubeError> {
    for cube in bounds.interior_iter() {
        let Some(mut state) = world.block(cube) else {
            continue;
        };
        if !palette.is_hydratable(state.id) {
            continue;
        }
        let intended = waterlogging.contains(dimension, cube);
        if state.waterlogged && !intended {
            state.waterlogged = false;
            world.set_block(cube, state)?;
        } else if !state.waterlogged && intended {
            state.waterlogged = true;
            world.set_block(cube, state)?;
            waterlogging.consume(dimension, cube);
        }
    }
    Ok(())
}

/// Remove a consumed sentinel marker block, if it is still present.
pub fn clear_marker(
    world: &mut dyn VoxelWorld,
    palette: &Palette,
    cube: Cube,
) -> Result<(), SetCubeError> {
    if let Some(state) = world.block(cube) {
        if palette.marker_kind(state.id).is_some() {
            world.set_block(cube, BlockState::of(palette.air))?;
        }
    }
    Ok(())
}
