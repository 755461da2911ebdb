//! The three-phase selection and fallback policy over ranked candidates.

use rand::Rng;

use crate::candidate::PlacementCandidate;
use crate::math::{Cube, GridAab, GridCoordinate};

/// Which phase of the decision procedure produced the committed placement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum Phase {
    /// A candidate with zero collisions was available.
    Clean,
    /// Every candidate collided; one with exactly one collision cell was
    /// accepted anyway.
    Degraded,
    /// Chained placement was abandoned; the boss module is placed alone at a
    /// fixed offset outside the maze.
    Isolated,
}

/// The committed outcome of candidate selection. There is always one; the
/// policy cannot fail.
#[derive(Clone, Debug)]
#[allow(clippy::exhaustive_enums)]
pub enum Selection {
    /// A full connector-plus-boss chain at the selected candidate.
    Chained {
        /// [`Phase::Clean`] or [`Phase::Degraded`].
        phase: Phase,
        /// The selected candidate.
        candidate: PlacementCandidate,
    },
    /// The boss module alone, disconnected from the maze.
    Isolated {
        /// World position for the boss module.
        anchor: Cube,
    },
}

impl Selection {
    /// The phase that produced this selection.
    pub fn phase(&self) -> Phase {
        match self {
            Selection::Chained { phase, .. } => *phase,
            Selection::Isolated { .. } => Phase::Isolated,
        }
    }
}

/// Compute the isolated-fallback anchor: a fixed large diagonal offset outside
/// the maze's overall bounding box.
///
/// Distance alone is the collision-avoidance strategy here; it is a
/// probabilistic heuristic, not a guarantee. Total for any input, including a
/// missing or degenerate maze bounding box.
pub fn isolated_anchor(
    maze_bounds: Option<GridAab>,
    offset: GridCoordinate,
    floor_y: GridCoordinate,
) -> Cube {
    match maze_bounds {
        Some(bounds) => {
            let upper = bounds.upper_bounds();
            Cube::new(upper.x + offset, floor_y, upper.z + offset)
        }
        None => Cube::new(offset, floor_y, offset),
    }
}

/// Select a placement from the full candidate set (across all anchors).
///
/// Phase A: if any candidate has zero collisions, pick uniformly at random
/// among those. Phase B: else if any has exactly one collision cell, pick
/// uniformly among those and log a warning. Phase C: else abandon chaining and
/// return an isolated boss placement, with no collision check at all.
///
/// The caller is responsible for clearing the discovered markers afterwards,
/// whichever phase fired.
pub fn select(
    candidates: Vec<PlacementCandidate>,
    maze_bounds: Option<GridAab>,
    fallback_offset: GridCoordinate,
    fallback_floor_y: GridCoordinate,
    rng: &mut impl Rng,
) -> Selection {
    for (phase, wanted) in [(Phase::Clean, 0), (Phase::Degraded, 1)] {
        let matching: Vec<&PlacementCandidate> = candidates
            .iter()
            .filter(|candidate| candidate.collisions == wanted)
            .collect();
        if matching.is_empty() {
            continue;
        }
        let chosen = matching[rng.random_range(0..matching.len())].clone();
        if phase == Phase::Degraded {
            log::warn!(
                "no collision-free placement at {:?}; accepting degraded candidate overlapping cell {:?}",
                chosen.anchor,
                chosen.colliding_cells.iter().next(),
            );
        }
        return Selection::Chained {
            phase,
            candidate: chosen,
        };
    }

    let anchor = isolated_anchor(maze_bounds, fallback_offset, fallback_floor_y);
    log::warn!(
        "all {} candidates collide in 2+ cells; isolating boss chamber at {anchor:?}",
        candidates.len(),
    );
    Selection::Isolated { anchor }
}
