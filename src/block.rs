//! Block identity and state, and the palette describing which blocks mean what
//! to the stitching engine.
//!
//! The host's block registry is external; we deal only in opaque [`BlockId`]s
//! plus the per-block state bits placement cares about (waterlogging and fluid
//! fill level).

use hashbrown::HashSet;

/// Opaque identifier for a block kind, assigned by the host's block registry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BlockId(pub u16);

/// Fluid fill level of a full (source) fluid block.
///
/// Levels count *emptiness*: higher numbers are shallower, matching the usual
/// falling-fluid convention.
pub const FLUID_LEVEL_FULL: u8 = 0;

/// The state of one cube in the world: which block, and its fluid-related flags.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BlockState {
    /// Which block kind occupies the cube.
    pub id: BlockId,
    /// Whether a solid block's cube also contains fluid.
    pub waterlogged: bool,
    /// Fill level; meaningful only for fluid blocks.
    pub fluid_level: u8,
}

impl BlockState {
    /// A plain, dry block of the given kind.
    #[inline]
    pub const fn of(id: BlockId) -> Self {
        Self {
            id,
            waterlogged: false,
            fluid_level: FLUID_LEVEL_FULL,
        }
    }

    /// A fluid block at the given fill level.
    #[inline]
    pub const fn fluid(id: BlockId, fluid_level: u8) -> Self {
        Self {
            id,
            waterlogged: false,
            fluid_level,
        }
    }

    /// The same block with its waterlogged flag set as given.
    #[inline]
    #[must_use]
    pub const fn with_waterlogged(mut self, waterlogged: bool) -> Self {
        self.waterlogged = waterlogged;
        self
    }
}

/// The semantic role of a sentinel marker block.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[allow(clippy::exhaustive_enums)]
pub enum MarkerKind {
    /// Marks a dead end of the generated maze, a candidate anchor for extension.
    DeadEnd,
    /// Marks a connector position inside already-stitched content.
    Connector,
}

/// Classification of host block kinds, as the stitching engine needs to know them.
///
/// All of these identities come from the host at startup; the engine never
/// registers blocks itself.
#[derive(Clone, Debug)]
pub struct Palette {
    /// The empty block.
    pub air: BlockId,
    /// The generation-time ambient fluid (the kind the maze floods with).
    pub ambient_fluid: BlockId,
    /// Placeholder block authors put in templates where decorative fluid belongs.
    /// Converted to [`Self::ambient_fluid`] by a placement processor.
    pub decorative_fluid: BlockId,
    /// Sentinel block marking maze dead ends.
    pub dead_end_marker: BlockId,
    /// Sentinel block marking connector positions.
    pub connector_marker: BlockId,
    /// The block kinds known to originate from the base maze generator.
    /// Collision against existing structures is detected by these.
    pub structure_materials: HashSet<BlockId>,
    /// Non-air block kinds that still count as walkable openings
    /// (torches, ladders, and the like).
    pub passable: HashSet<BlockId>,
}

impl Palette {
    /// Whether the block kind belongs to the base maze's structure material.
    #[inline]
    pub fn is_structure_material(&self, id: BlockId) -> bool {
        self.structure_materials.contains(&id)
    }

    /// Whether a probe ray can pass through this block kind.
    #[inline]
    pub fn is_passable(&self, id: BlockId) -> bool {
        id == self.air || self.passable.contains(&id)
    }

    /// Whether this block kind is a fluid.
    #[inline]
    pub fn is_fluid(&self, id: BlockId) -> bool {
        id == self.ambient_fluid
    }

    /// Whether the waterlogged flag is meaningful on this block kind.
    #[inline]
    pub fn is_hydratable(&self, id: BlockId) -> bool {
        id != self.air && !self.is_fluid(id)
    }

    /// If the block kind is a sentinel marker, which kind of marker it is.
    pub fn marker_kind(&self, id: BlockId) -> Option<MarkerKind> {
        if id == self.dead_end_marker {
            Some(MarkerKind::DeadEnd)
        } else if id == self.connector_marker {
            Some(MarkerKind::Connector)
        } else {
            None
        }
    }
}
