//! Grid-aligned geometry: cubes, boxes, faces, and the four cardinal rotations.
//!
//! Everything in this module is pure data and pure functions; world access
//! happens elsewhere.

mod cube;
pub use cube::Cube;

mod face;
pub use face::{Axis, Face6};

mod grid_aab;
pub use grid_aab::GridAab;

mod rotation;
pub use rotation::Rotation;

/// Coordinates that are locations in world space.
pub type GridCoordinate = i32;

/// Sizes of grid volumes, which are never negative.
pub type GridSizeCoord = u32;

/// A point in world space, identifying a lattice point (corner of a [`Cube`]).
pub type GridPoint = euclid::Point3D<GridCoordinate, Cube>;

/// A vector between [`GridPoint`]s.
pub type GridVector = euclid::Vector3D<GridCoordinate, Cube>;

/// The size of a [`GridAab`] or module template.
pub type GridSize = euclid::Size3D<GridSizeCoord, Cube>;
