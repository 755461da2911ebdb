//! Counting overlap between a placement candidate and existing generated
//! material, quantized into room-sized cells.

use hashbrown::HashSet;

use crate::block::Palette;
use crate::math::{Cube, GridAab};
use crate::space::{VolumeScanner, VoxelWorld};

/// Result of evaluating one candidate's bounding box against the world.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CollisionReport {
    /// Number of distinct room cells containing structure material inside the box.
    pub count: usize,
    /// The identifiers of those cells (cube coordinates divided by the footprint).
    pub cells: HashSet<Cube>,
}

/// Scan `bounds` for blocks of the base maze's structure material and count the
/// overlap in room-footprint cells rather than raw blocks: one physically
/// overlapped room contributes exactly one unit of collision no matter how many
/// of its blocks fall inside the box.
///
/// Read-only, and monotonic in the world contents: adding material inside the
/// box never decreases the count, removing it never increases it. Unreadable
/// cubes contribute nothing.
pub fn evaluate(
    world: &dyn VoxelWorld,
    palette: &Palette,
    bounds: GridAab,
    cell_footprint: u32,
) -> CollisionReport {
    let footprint = (cell_footprint.max(1)) as i32;
    let mut cells = HashSet::new();
    VolumeScanner::new(world).scan(bounds, |cube, state| {
        if palette.is_structure_material(state.id) {
            cells.insert(cube.map(|c| c.div_euclid(footprint)));
        }
        false
    });
    CollisionReport {
        count: cells.len(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockId, BlockState};
    use crate::space::SparseWorld;
    use pretty_assertions::assert_eq;

    fn palette() -> Palette {
        Palette {
            air: BlockId(0),
            ambient_fluid: BlockId(1),
            decorative_fluid: BlockId(2),
            dead_end_marker: BlockId(3),
            connector_marker: BlockId(4),
            structure_materials: HashSet::from_iter([BlockId(10)]),
            passable: HashSet::new(),
        }
    }

    /// A box fully overlapping two distinct 7×7 room cells of structure
    /// material reports count 2, not the raw overlapping-block count.
    #[test]
    fn counts_cells_not_blocks() {
        let palette = palette();
        let mut world = SparseWorld::new(palette.air);
        // Two complete 7×1×7 rooms side by side along +X, hundreds of blocks total.
        world.fill(
            GridAab::from_lower_size([0, 0, 0], [7, 1, 7]),
            BlockState::of(BlockId(10)),
        );
        world.fill(
            GridAab::from_lower_size([7, 0, 0], [7, 1, 7]),
            BlockState::of(BlockId(10)),
        );

        let report = evaluate(
            &world,
            &palette,
            GridAab::from_lower_size([0, 0, 0], [14, 1, 7]),
            7,
        );
        assert_eq!(report.count, 2);
        assert_eq!(
            report.cells,
            HashSet::from_iter([Cube::new(0, 0, 0), Cube::new(1, 0, 0)])
        );
    }

    #[test]
    fn empty_box_is_clean() {
        let palette = palette();
        let world = SparseWorld::new(palette.air);
        let report = evaluate(
            &world,
            &palette,
            GridAab::from_lower_size([0, 0, 0], [7, 7, 7]),
            7,
        );
        assert_eq!(report, CollisionReport::default());
    }

    #[test]
    fn monotonic_under_adding_and_removing_material() {
        let palette = palette();
        let bounds = GridAab::from_lower_size([0, 0, 0], [21, 1, 7]);
        let mut world = SparseWorld::new(palette.air);

        let mut last = 0;
        for x in [1, 8, 15] {
            world
                .set_block(Cube::new(x, 0, 3), BlockState::of(BlockId(10)))
                .unwrap();
            let count = evaluate(&world, &palette, bounds, 7).count;
            assert!(count >= last);
            last = count;
        }
        assert_eq!(last, 3);

        for x in [1, 8, 15] {
            world
                .set_block(Cube::new(x, 0, 3), BlockState::of(palette.air))
                .unwrap();
            let count = evaluate(&world, &palette, bounds, 7).count;
            assert!(count <= last);
            last = count;
        }
        assert_eq!(last, 0);
    }

    #[rstest::rstest]
    #[case(1, 3)]
    #[case(4, 2)]
    #[case(7, 1)]
    fn footprint_controls_cell_granularity(#[case] footprint: u32, #[case] expected: usize) {
        let palette = palette();
        let mut world = SparseWorld::new(palette.air);
        for cube in [Cube::new(0, 0, 0), Cube::new(3, 0, 0), Cube::new(6, 0, 6)] {
            world.set_block(cube, BlockState::of(BlockId(10))).unwrap();
        }
        let report = evaluate(
            &world,
            &palette,
            GridAab::from_lower_size([0, 0, 0], [7, 1, 7]),
            footprint,
        );
        assert_eq!(report.count, expected);
    }

    #[test]
    fn negative_coordinates_quantize_consistently() {
        let palette = palette();
        let mut world = SparseWorld::new(palette.air);
        // Both blocks in the cell covering [-7, 0) on each horizontal axis.
        world
            .set_block(Cube::new(-1, 0, -1), BlockState::of(BlockId(10)))
            .unwrap();
        world
            .set_block(Cube::new(-7, 0, -7), BlockState::of(BlockId(10)))
            .unwrap();
        let report = evaluate(
            &world,
            &palette,
            GridAab::from_lower_upper([-7, 0, -7], [0, 1, 0]),
            7,
        );
        assert_eq!(report.count, 1);
    }
}
