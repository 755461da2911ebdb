use core::ops::Mul;

use crate::math::{Face6, GridSize, GridVector};

/// One of the four cardinal rotations about the vertical (+Y) axis.
///
/// This is the only kind of rotation module placement supports: modules are
/// never mirrored, tilted, or turned by non-right angles.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[repr(u8)]
#[allow(clippy::exhaustive_enums)]
pub enum Rotation {
    /// The identity rotation.
    R0,
    /// A quarter turn clockwise (viewed from above, in a Y-up right-handed
    /// coordinate system): +X becomes +Z.
    R90,
    /// A half turn.
    R180,
    /// A quarter turn counterclockwise: +X becomes −Z.
    R270,
}

impl Rotation {
    /// All four rotations, in increasing angle order.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// The identity rotation.
    pub const IDENTITY: Self = Rotation::R0;

    /// Rotate a face by this rotation. Vertical faces are unaffected.
    ///
    /// ```
    /// use maze_annex::math::{Face6, Rotation};
    ///
    /// assert_eq!(Rotation::R90.transform(Face6::PX), Face6::PZ);
    /// assert_eq!(Rotation::R90.transform(Face6::PZ), Face6::NX);
    /// assert_eq!(Rotation::R90.transform(Face6::PY), Face6::PY);
    /// ```
    #[inline]
    #[must_use]
    pub const fn transform(self, face: Face6) -> Face6 {
        use Face6::*;
        match self {
            Rotation::R0 => face,
            Rotation::R90 => match face {
                PX => PZ,
                PZ => NX,
                NX => NZ,
                NZ => PX,
                other => other,
            },
            Rotation::R180 => match face {
                PX => NX,
                PZ => NZ,
                NX => PX,
                NZ => PZ,
                other => other,
            },
            Rotation::R270 => match face {
                PX => NZ,
                NZ => NX,
                NX => PZ,
                PZ => PX,
                other => other,
            },
        }
    }

    /// Rotate a vector about the Y axis.
    #[inline]
    #[must_use]
    pub fn transform_vector(self, v: GridVector) -> GridVector {
        match self {
            Rotation::R0 => v,
            Rotation::R90 => GridVector::new(-v.z, v.y, v.x),
            Rotation::R180 => GridVector::new(-v.x, v.y, -v.z),
            Rotation::R270 => GridVector::new(v.z, v.y, -v.x),
        }
    }

    /// Rotate a size value: quarter turns exchange width and depth.
    #[inline]
    #[must_use]
    pub fn transform_size(self, size: GridSize) -> GridSize {
        match self {
            Rotation::R0 | Rotation::R180 => size,
            Rotation::R90 | Rotation::R270 => GridSize::new(size.depth, size.height, size.width),
        }
    }

    /// Rotate a cell coordinate “in place” within a volume of the given canonical size,
    /// so that coordinates in `[0, size)` stay within `[0, transform_size(size))`.
    ///
    /// Cell coordinates identify unit cubes by their most negative corner, which is why
    /// the negated axes are offset by `size − 1` rather than `size`.
    #[must_use]
    pub fn transform_cell(self, size: GridSize, offset: GridVector) -> GridVector {
        let w = size.width as i32;
        let d = size.depth as i32;
        match self {
            Rotation::R0 => offset,
            Rotation::R90 => GridVector::new(d - 1 - offset.z, offset.y, offset.x),
            Rotation::R180 => GridVector::new(w - 1 - offset.x, offset.y, d - 1 - offset.z),
            Rotation::R270 => GridVector::new(offset.z, offset.y, w - 1 - offset.x),
        }
    }

    /// Returns the rotation which undoes this one.
    #[inline]
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Rotation::R0 => Rotation::R0,
            Rotation::R90 => Rotation::R270,
            Rotation::R180 => Rotation::R180,
            Rotation::R270 => Rotation::R90,
        }
    }

    /// Find the unique rotation mapping the horizontal face `from` to the horizontal
    /// face `to`.
    ///
    /// Returns [`None`] if exactly one of the two faces is vertical; if both are
    /// vertical and equal, the identity is returned.
    pub fn from_to(from: Face6, to: Face6) -> Option<Rotation> {
        if !from.is_horizontal() || !to.is_horizontal() {
            return (from == to).then_some(Rotation::IDENTITY);
        }
        Rotation::ALL
            .into_iter()
            .find(|r| r.transform(from) == to)
    }
}

impl Mul for Rotation {
    type Output = Self;

    /// Composition: `(a * b).transform(f)` equals `a.transform(b.transform(f))`.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let quarters = (self as u8 + rhs as u8) % 4;
        match quarters {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }
}
