//! Locating sentinel marker blocks left behind by the maze generator.

use itertools::Itertools as _;

use crate::block::{MarkerKind, Palette};
use crate::math::{Cube, GridAab, GridSize, GridVector};
use crate::space::{VolumeScanner, VoxelWorld};

/// A sentinel marker discovered in the world.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FoundMarker {
    /// The cube the marker block occupies.
    pub cube: Cube,
    /// Which kind of marker it is.
    pub kind: MarkerKind,
}

/// Result of scanning a structure's volume for markers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MarkerScan {
    /// Markers found, in scan order.
    pub markers: Vec<FoundMarker>,
    /// Whether the whole search volume was readable. When `false`, absent
    /// markers may simply not be generated yet and the caller must retry later.
    pub complete: bool,
}

impl MarkerScan {
    /// The dead-end markers only, which are the anchors extension attaches to.
    pub fn dead_ends(&self) -> impl Iterator<Item = Cube> + '_ {
        self.markers
            .iter()
            .filter(|marker| marker.kind == MarkerKind::DeadEnd)
            .map(|marker| marker.cube)
    }
}

/// Compute the volume to search for markers belonging to a structure.
///
/// Uses the host-reported structure bounds when available (grown by one cell,
/// since markers sit on the structure's skin), else a generous default box
/// around the origin.
pub fn search_volume(
    origin: Cube,
    reported_bounds: Option<GridAab>,
    default_radius: u32,
    default_height: u32,
) -> GridAab {
    match reported_bounds {
        Some(bounds) => bounds.expand(1),
        None => {
            let radius = default_radius as i32;
            let half_height = (default_height / 2) as i32;
            GridAab::from_lower_size(
                origin.lower_bounds() - GridVector::new(radius, half_height, radius),
                GridSize::new(default_radius * 2 + 1, default_height + 1, default_radius * 2 + 1),
            )
        }
    }
}

/// Scan `bounds` for sentinel marker blocks. Read-only; no side effects.
pub fn find_markers(world: &dyn VoxelWorld, palette: &Palette, bounds: GridAab) -> MarkerScan {
    let mut kinds = Vec::new();
    let scan = VolumeScanner::new(world).scan(bounds, |_, state| {
        match palette.marker_kind(state.id) {
            Some(kind) => {
                kinds.push(kind);
                true
            }
            None => false,
        }
    });
    MarkerScan {
        // zip_eq: the scanner records one kind per match, in the same order.
        markers: scan
            .matches
            .iter()
            .zip_eq(kinds)
            .map(|(&cube, kind)| FoundMarker { cube, kind })
            .collect(),
        complete: scan.is_complete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockId, BlockState};
    use crate::space::SparseWorld;
    use hashbrown::HashSet;

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

    #[test]
    fn finds_markers_by_kind() {
        let palette = palette();
        let mut world = SparseWorld::new(palette.air);
        world
            .set_block(Cube::new(1, 0, 1), BlockState::of(palette.dead_end_marker))
            .unwrap();
        world
            .set_block(Cube::new(3, 0, 3), BlockState::of(palette.connector_marker))
            .unwrap();
        world
            .set_block(Cube::new(2, 0, 2), BlockState::of(BlockId(10)))
            .unwrap();

        let scan = find_markers(
            &world,
            &palette,
            GridAab::from_lower_size([0, 0, 0], [5, 1, 5]),
        );
        assert!(scan.complete);
        assert_eq!(scan.markers.len(), 2);
        assert_eq!(scan.dead_ends().collect::<Vec<_>>(), vec![Cube::new(1, 0, 1)]);
    }

    #[test]
    fn incomplete_scan_is_flagged_not_failed() {
        let palette = palette();
        let mut world = SparseWorld::new(palette.air);
        world.generated = Some(GridAab::from_lower_size([0, 0, 0], [2, 1, 5]));
        world
            .set_block(Cube::new(1, 0, 1), BlockState::of(palette.dead_end_marker))
            .unwrap();

        let scan = find_markers(
            &world,
            &palette,
            GridAab::from_lower_size([0, 0, 0], [5, 1, 5]),
        );
        assert!(!scan.complete);
        assert_eq!(scan.markers.len(), 1);
    }

    #[test]
    fn search_volume_prefers_reported_bounds() {
        let reported = GridAab::from_lower_size([0, 0, 0], [10, 5, 10]);
        assert_eq!(
            search_volume(Cube::ORIGIN, Some(reported), 30, 40),
            reported.expand(1)
        );
        let fallback = search_volume(Cube::new(0, 64, 0), None, 30, 40);
        assert!(fallback.contains_cube(Cube::new(-30, 64, 30)));
        assert!(fallback.contains_cube(Cube::new(30, 84, -30)));
        assert!(!fallback.contains_cube(Cube::new(32, 64, 0)));
    }
}
