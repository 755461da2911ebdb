use core::fmt;
use core::ops;

use crate::math::{GridAab, GridCoordinate, GridPoint, GridVector};

/// A unit cube on the world grid, identified by the coordinates of its most negative
/// corner.
///
/// This is distinct from [`GridPoint`] to avoid confusion between points (zero size)
/// and cubes (unit size), which causes off-by-one errors when rotating things.
///
/// `Cube` is also used as the `euclid` unit type for all grid coordinates.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub struct Cube {
    pub x: GridCoordinate,
    pub y: GridCoordinate,
    pub z: GridCoordinate,
}

impl Cube {
    /// The cube with lower corner at the coordinate origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Construct `Cube { x, y, z }` from the given coordinates.
    #[inline]
    pub const fn new(x: GridCoordinate, y: GridCoordinate, z: GridCoordinate) -> Self {
        Self { x, y, z }
    }

    /// Convert a lattice point to the cube having it as its most negative corner.
    #[inline]
    pub fn from_lower_bounds(point: GridPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: point.z,
        }
    }

    /// The most negative corner of the cube, as a [`GridPoint`].
    #[inline]
    pub fn lower_bounds(self) -> GridPoint {
        GridPoint::new(self.x, self.y, self.z)
    }

    /// The most positive corner of the cube, as a [`GridPoint`].
    #[inline]
    pub fn upper_bounds(self) -> GridPoint {
        GridPoint::new(self.x + 1, self.y + 1, self.z + 1)
    }

    /// The [`GridAab`] occupying the volume of this cube.
    #[inline]
    pub fn grid_aab(self) -> GridAab {
        GridAab::from_lower_upper(self.lower_bounds(), self.upper_bounds())
    }

    /// Apply a function to each coordinate independently.
    #[inline]
    pub fn map(self, mut f: impl FnMut(GridCoordinate) -> GridCoordinate) -> Self {
        Self {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
        }
    }
}

impl fmt::Debug for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { x, y, z } = self;
        write!(f, "({x}, {y}, {z})")
    }
}

impl From<[GridCoordinate; 3]> for Cube {
    #[inline]
    fn from([x, y, z]: [GridCoordinate; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Cube> for [GridCoordinate; 3] {
    #[inline]
    fn from(Cube { x, y, z }: Cube) -> Self {
        [x, y, z]
    }
}

impl ops::Add<GridVector> for Cube {
    type Output = Self;
    #[inline]
    fn add(self, v: GridVector) -> Self {
        Self {
            x: self.x + v.x,
            y: self.y + v.y,
            z: self.z + v.z,
        }
    }
}

impl ops::Sub<GridVector> for Cube {
    type Output = Self;
    #[inline]
    fn sub(self, v: GridVector) -> Self {
        Self {
            x: self.x - v.x,
            y: self.y - v.y,
            z: self.z - v.z,
        }
    }
}

impl ops::Sub<Cube> for Cube {
    type Output = GridVector;
    #[inline]
    fn sub(self, other: Self) -> GridVector {
        GridVector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}
