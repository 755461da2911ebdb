//! Pure geometry for aligning module sockets to world openings.
//!
//! Rotation composition itself lives on [`Rotation`]; this module adds the two
//! placement-specific operations: probing a marker's surroundings for the
//! existing maze opening, and solving for aligning rotations.

use crate::math::{Cube, Face6, Rotation};

/// Sample passability along each of the four cardinal directions from `marker`,
/// out to `probe_distance` cells, and return the direction with the most
/// passable cells: the existing maze opening that must be preserved.
///
/// `passable` should report whether a cube is air or otherwise walk-through;
/// unreadable cubes should report `false`. Returns [`None`] when no direction
/// has any passable cell, which means the marker is sealed in solid material
/// and there is no opening to preserve.
///
/// Ties are broken by the fixed order of [`Face6::HORIZONTAL`], keeping the
/// result deterministic for a given world state.
pub fn detect_opening_direction(
    mut passable: impl FnMut(Cube) -> bool,
    marker: Cube,
    probe_distance: i32,
) -> Option<Face6> {
    let mut best: Option<(Face6, i32)> = None;
    for direction in Face6::HORIZONTAL {
        let normal = direction.normal_vector();
        let mut count = 0;
        for step in 1..=probe_distance {
            if passable(marker + normal * step) {
                count += 1;
            }
        }
        if count > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((direction, count));
        }
    }
    best.map(|(direction, _)| direction)
}

/// The unique cardinal rotation mapping a module's canonical facing to the
/// required world facing, if one exists.
#[inline]
pub fn rotation_to_align(canonical: Face6, required: Face6) -> Option<Rotation> {
    Rotation::from_to(canonical, required)
}

/// The world-space exit facing that results from placing a module with the
/// given canonical exit facing at the given rotation. Used to choose the next
/// module's rotation in a chain.
#[inline]
pub fn rotated_exit_facing(canonical_exit: Face6, rotation: Rotation) -> Face6 {
    rotation.transform(canonical_exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GridAab;

    #[test]
    fn detects_longest_opening() {
        // Passable corridor extending +X for 4 cells, and a single air cell to -Z.
        let corridor = GridAab::from_lower_size([1, 0, 0], [4, 1, 1]);
        let stray = Cube::new(0, 0, -1);
        let passable = |cube: Cube| corridor.contains_cube(cube) || cube == stray;

        assert_eq!(
            detect_opening_direction(passable, Cube::ORIGIN, 5),
            Some(Face6::PX)
        );
    }

    #[test]
    fn sealed_marker_has_no_opening() {
        assert_eq!(detect_opening_direction(|_| false, Cube::ORIGIN, 5), None);
    }

    #[test]
    fn tie_breaks_deterministically() {
        // Equal openings on all four sides: the first of Face6::HORIZONTAL wins.
        assert_eq!(
            detect_opening_direction(|_| true, Cube::ORIGIN, 3),
            Some(Face6::HORIZONTAL[0])
        );
    }

    /// Composing a rotation then its solved inverse on the same facing returns
    /// the original facing.
    #[test]
    fn solve_round_trip() {
        for canonical in Face6::HORIZONTAL {
            for rotation in Rotation::ALL {
                let world = rotated_exit_facing(canonical, rotation);
                let solved = rotation_to_align(canonical, world).unwrap();
                assert_eq!(solved, rotation);
                assert_eq!(solved.inverse().transform(world), canonical);
            }
        }
    }
}
