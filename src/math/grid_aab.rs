use core::fmt;

use crate::math::{Cube, GridCoordinate, GridPoint, GridSize, GridSizeCoord, GridVector};

/// An axis-aligned box on the world grid, bounding a set of [`Cube`]s.
///
/// Bounds are stored as inclusive lower and exclusive upper corners;
/// `lower_bounds() <= upper_bounds()` on every axis.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct GridAab {
    lower: GridPoint,
    upper: GridPoint,
}

impl GridAab {
    /// Construct a box from inclusive lower bounds and exclusive upper bounds.
    ///
    /// Panics if `upper` is less than `lower` on any axis.
    #[track_caller]
    pub fn from_lower_upper(lower: impl Into<GridPoint>, upper: impl Into<GridPoint>) -> Self {
        let (lower, upper) = (lower.into(), upper.into());
        assert!(
            lower.x <= upper.x && lower.y <= upper.y && lower.z <= upper.z,
            "GridAab::from_lower_upper: upper {upper:?} below lower {lower:?}"
        );
        Self { lower, upper }
    }

    /// Construct a box from inclusive lower bounds and a size.
    #[track_caller]
    pub fn from_lower_size(lower: impl Into<GridPoint>, size: impl Into<GridSize>) -> Self {
        let lower = lower.into();
        let size = size.into();
        Self::from_lower_upper(
            lower,
            GridPoint::new(
                lower.x + size.width as GridCoordinate,
                lower.y + size.height as GridCoordinate,
                lower.z + size.depth as GridCoordinate,
            ),
        )
    }

    /// The box occupying exactly one cube.
    #[inline]
    pub fn single_cube(cube: Cube) -> Self {
        cube.grid_aab()
    }

    /// The smallest box containing both given cubes.
    pub fn from_cubes(a: Cube, b: Cube) -> Self {
        Self {
            lower: GridPoint::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            upper: GridPoint::new(a.x.max(b.x) + 1, a.y.max(b.y) + 1, a.z.max(b.z) + 1),
        }
    }

    /// Inclusive lower bounds.
    #[inline]
    pub fn lower_bounds(&self) -> GridPoint {
        self.lower
    }

    /// Exclusive upper bounds.
    #[inline]
    pub fn upper_bounds(&self) -> GridPoint {
        self.upper
    }

    /// Size of the box on each axis.
    #[inline]
    pub fn size(&self) -> GridSize {
        GridSize::new(
            (self.upper.x - self.lower.x) as GridSizeCoord,
            (self.upper.y - self.lower.y) as GridSizeCoord,
            (self.upper.z - self.lower.z) as GridSizeCoord,
        )
    }

    /// The number of cubes the box contains.
    pub fn volume(&self) -> usize {
        let size = self.size();
        size.width as usize * size.height as usize * size.depth as usize
    }

    /// Whether the box contains no cubes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// The cube closest to the center of the box (rounding toward the lower corner).
    pub fn center_cube(&self) -> Cube {
        Cube::new(
            self.lower.x + (self.upper.x - self.lower.x) / 2,
            self.lower.y + (self.upper.y - self.lower.y) / 2,
            self.lower.z + (self.upper.z - self.lower.z) / 2,
        )
    }

    /// Whether the box contains the given cube.
    #[inline]
    pub fn contains_cube(&self, cube: Cube) -> bool {
        (self.lower.x..self.upper.x).contains(&cube.x)
            && (self.lower.y..self.upper.y).contains(&cube.y)
            && (self.lower.z..self.upper.z).contains(&cube.z)
    }

    /// Displace the box by the given offset.
    #[must_use]
    pub fn translate(&self, offset: impl Into<GridVector>) -> Self {
        let offset = offset.into();
        Self {
            lower: self.lower + offset,
            upper: self.upper + offset,
        }
    }

    /// The smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union_box(self, other: Self) -> Self {
        Self {
            lower: GridPoint::new(
                self.lower.x.min(other.lower.x),
                self.lower.y.min(other.lower.y),
                self.lower.z.min(other.lower.z),
            ),
            upper: GridPoint::new(
                self.upper.x.max(other.upper.x),
                self.upper.y.max(other.upper.y),
                self.upper.z.max(other.upper.z),
            ),
        }
    }

    /// Grow the box by `delta` in every direction.
    #[must_use]
    pub fn expand(self, delta: GridSizeCoord) -> Self {
        let delta = delta as GridCoordinate;
        Self {
            lower: self.lower - GridVector::new(delta, delta, delta),
            upper: self.upper + GridVector::new(delta, delta, delta),
        }
    }

    /// Iterate over every cube in the box, in Z-last order.
    pub fn interior_iter(self) -> impl Iterator<Item = Cube> {
        let Self { lower, upper } = self;
        (lower.x..upper.x).flat_map(move |x| {
            (lower.y..upper.y)
                .flat_map(move |y| (lower.z..upper.z).map(move |z| Cube::new(x, y, z)))
        })
    }
}

impl fmt::Debug for GridAab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GridAab({:?}..{:?}, {:?}..{:?}, {:?}..{:?})",
            self.lower.x, self.upper.x, self.lower.y, self.upper.y, self.lower.z, self.upper.z
        )
    }
}
