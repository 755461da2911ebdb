//! Access to the host's voxel world, and an in-memory stand-in for tests.

use core::fmt;

use hashbrown::HashMap;

use crate::block::{BlockId, BlockState};
use crate::math::{Cube, GridAab};

/// Stable identifier for one of the host's dimensions (distinct worlds that may
/// each contain occurrences of the same structure type).
///
/// The name must be stable across restarts, since persisted processed-structure
/// sets are keyed by it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct DimensionId(pub String);

impl From<&str> for DimensionId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read/write access to one dimension's block volume, as provided by the host.
///
/// Reads return [`None`] for cubes in chunks that are not yet generated or
/// loaded; callers must treat that as “try again later”, never as emptiness.
pub trait VoxelWorld {
    /// Read the block at `cube`, or [`None`] if the containing chunk is unavailable.
    fn block(&self, cube: Cube) -> Option<BlockState>;

    /// Write the block at `cube`.
    fn set_block(&mut self, cube: Cube, state: BlockState) -> Result<(), SetCubeError>;
}

/// Error from writing a block to a [`VoxelWorld`].
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[displaydoc("cannot write block at {cube:?}")]
pub struct SetCubeError {
    /// The cube that could not be written.
    pub cube: Cube,
}

impl core::error::Error for SetCubeError {}

/// Outcome of scanning a volume: the cubes that matched, and how much of the
/// volume could not be read at all.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanResult {
    /// Cubes whose block state matched the predicate.
    pub matches: Vec<Cube>,
    /// Number of cubes whose chunks were unavailable.
    pub missing: usize,
}

impl ScanResult {
    /// Whether every cube in the scanned volume was readable.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing == 0
    }
}

/// Scans rectangular volumes of a [`VoxelWorld`] with an injectable predicate,
/// so the deep triple loops live in exactly one place.
pub struct VolumeScanner<'w> {
    world: &'w dyn VoxelWorld,
}

impl<'w> VolumeScanner<'w> {
    /// Construct a scanner reading from `world`.
    #[inline]
    pub fn new(world: &'w dyn VoxelWorld) -> Self {
        Self { world }
    }

    /// Collect every cube in `bounds` whose block state satisfies `predicate`.
    ///
    /// Unreadable cubes never match; they are tallied in [`ScanResult::missing`].
    pub fn scan(
        &self,
        bounds: GridAab,
        mut predicate: impl FnMut(Cube, &BlockState) -> bool,
    ) -> ScanResult {
        let mut result = ScanResult::default();
        for cube in bounds.interior_iter() {
            match self.world.block(cube) {
                Some(state) => {
                    if predicate(cube, &state) {
                        result.matches.push(cube);
                    }
                }
                None => result.missing += 1,
            }
        }
        result
    }
}

impl fmt::Debug for VolumeScanner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeScanner").finish_non_exhaustive()
    }
}

/// An in-memory sparse voxel world.
///
/// Primarily for tests and offline experiments: cubes not explicitly set read
/// as air, and an optional `generated` region simulates a world whose outer
/// chunks do not exist yet.
#[derive(Clone, Debug)]
pub struct SparseWorld {
    blocks: HashMap<Cube, BlockState>,
    air: BlockId,
    /// If set, cubes outside this box read as [`None`] (not yet generated).
    pub generated: Option<GridAab>,
    write_count: usize,
}

impl SparseWorld {
    /// Construct an empty world whose default block is `air`.
    pub fn new(air: BlockId) -> Self {
        Self {
            blocks: HashMap::new(),
            air,
            generated: None,
            write_count: 0,
        }
    }

    /// Fill `bounds` with the given state, bypassing the write counter.
    ///
    /// Intended for setting up test fixtures.
    pub fn fill(&mut self, bounds: GridAab, state: BlockState) {
        for cube in bounds.interior_iter() {
            self.blocks.insert(cube, state);
        }
    }

    /// Remove all blocks of the given kind from `bounds`, bypassing the write counter.
    pub fn clear_matching(&mut self, bounds: GridAab, id: BlockId) {
        for cube in bounds.interior_iter() {
            if self.blocks.get(&cube).is_some_and(|s| s.id == id) {
                self.blocks.remove(&cube);
            }
        }
    }

    /// How many `set_block` calls have been made.
    #[inline]
    pub fn write_count(&self) -> usize {
        self.write_count
    }
}

impl VoxelWorld for SparseWorld {
    fn block(&self, cube: Cube) -> Option<BlockState> {
        if let Some(generated) = self.generated {
            if !generated.contains_cube(cube) {
                return None;
            }
        }
        Some(
            self.blocks
                .get(&cube)
                .copied()
                .unwrap_or(BlockState::of(self.air)),
        )
    }

    fn set_block(&mut self, cube: Cube, state: BlockState) -> Result<(), SetCubeError> {
        self.write_count += 1;
        if state.id == self.air && !state.waterlogged {
            self.blocks.remove(&cube);
        } else {
            self.blocks.insert(cube, state);
        }
        Ok(())
    }
}
