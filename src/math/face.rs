use crate::math::GridVector;

/// Identifies a face of a cube, or equivalently an orthogonal unit vector.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[repr(u8)]
#[allow(clippy::exhaustive_enums)]
pub enum Face6 {
    /// Negative X; the face whose normal vector is `(-1, 0, 0)`.
    NX,
    /// Negative Y; the face whose normal vector is `(0, -1, 0)`; downward.
    NY,
    /// Negative Z; the face whose normal vector is `(0, 0, -1)`.
    NZ,
    /// Positive X; the face whose normal vector is `(1, 0, 0)`.
    PX,
    /// Positive Y; the face whose normal vector is `(0, 1, 0)`; upward.
    PY,
    /// Positive Z; the face whose normal vector is `(0, 0, 1)`.
    PZ,
}

impl Face6 {
    /// All six faces.
    pub const ALL: [Face6; 6] = [
        Face6::NX,
        Face6::NY,
        Face6::NZ,
        Face6::PX,
        Face6::PY,
        Face6::PZ,
    ];

    /// The four horizontal faces, in the order probes and tie-breaks use them.
    pub const HORIZONTAL: [Face6; 4] = [Face6::NX, Face6::NZ, Face6::PX, Face6::PZ];

    /// The face opposite to this one (same axis, opposite sign).
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Face6 {
        match self {
            Face6::NX => Face6::PX,
            Face6::NY => Face6::PY,
            Face6::NZ => Face6::PZ,
            Face6::PX => Face6::NX,
            Face6::PY => Face6::NY,
            Face6::PZ => Face6::NZ,
        }
    }

    /// Which coordinate axis this face's normal vector lies on.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Face6::NX | Face6::PX => Axis::X,
            Face6::NY | Face6::PY => Axis::Y,
            Face6::NZ | Face6::PZ => Axis::Z,
        }
    }

    /// Whether this face's normal vector is horizontal (not ±Y).
    #[inline]
    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Face6::NY | Face6::PY)
    }

    /// Returns the unit vector normal to this face.
    #[inline]
    pub fn normal_vector(self) -> GridVector {
        match self {
            Face6::NX => GridVector::new(-1, 0, 0),
            Face6::NY => GridVector::new(0, -1, 0),
            Face6::NZ => GridVector::new(0, 0, -1),
            Face6::PX => GridVector::new(1, 0, 0),
            Face6::PY => GridVector::new(0, 1, 0),
            Face6::PZ => GridVector::new(0, 0, 1),
        }
    }
}

/// Enumerated coordinate axes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[allow(missing_docs, clippy::exhaustive_enums)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        for face in Face6::ALL {
            assert_eq!(face.opposite().opposite(), face);
            assert_eq!(face.normal_vector() + face.opposite().normal_vector(), GridVector::zero());
        }
    }

    #[test]
    fn horizontal_faces() {
        for face in Face6::ALL {
            assert_eq!(face.is_horizontal(), Face6::HORIZONTAL.contains(&face));
        }
    }
}
