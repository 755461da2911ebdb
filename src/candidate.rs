//! Enumerating rotated placement options for a (connector, boss) module pair
//! against an anchor marker.

use hashbrown::HashSet;

use crate::math::{Cube, Face6, GridAab, Rotation};
use crate::solve;
use crate::template::{ModuleTemplate, SocketRole};

/// One fully-computed placement option. Value object; discarded after selection.
#[derive(Clone, Debug)]
pub struct PlacementCandidate {
    /// The anchor marker this candidate attaches to.
    pub anchor: Cube,
    /// Rotation applied to the connector (extension) module.
    pub rotation: Rotation,
    /// World position (most negative corner) of the connector module.
    pub connector_position: Cube,
    /// World position of the connector's exit socket after rotation.
    pub exit_cube: Cube,
    /// World facing of the connector's exit after rotation.
    pub exit_facing: Face6,
    /// Rotation derived for the boss module so its entrance faces the exit.
    pub boss_rotation: Rotation,
    /// World position (most negative corner) of the boss module.
    pub boss_position: Cube,
    /// Rotation-aware bounding box of both modules together.
    pub bounds: GridAab,
    /// Number of room cells this candidate overlaps; filled in by the
    /// collision evaluator, zero until then.
    pub collisions: usize,
    /// The overlapped cell identifiers.
    pub colliding_cells: HashSet<Cube>,
}

/// Required sockets were missing from a module template.
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[displaydoc("template {template:?} lacks a {role:?} socket")]
pub struct MissingSocket {
    /// Name of the offending template.
    pub template: String,
    /// The socket role that was required.
    pub role: SocketRole,
}

impl core::error::Error for MissingSocket {}

fn require(template: &ModuleTemplate, role: SocketRole) -> Result<(), MissingSocket> {
    match template.socket(role) {
        Some(_) => Ok(()),
        None => Err(MissingSocket {
            template: template.name().to_owned(),
            role,
        }),
    }
}

/// Enumerate the placement candidates for one anchor.
///
/// For each of the four rotations, the connector module's entrance socket is
/// translated onto the anchor cube and the boss module is aligned to the
/// rotated exit. A rotation is excluded when its resulting exit direction
/// equals `opening` — the new module must never face back into, and block, the
/// existing path — so at most three candidates are produced per anchor.
///
/// Purely computational; no world access.
pub fn candidates_for_anchor(
    connector: &ModuleTemplate,
    boss: &ModuleTemplate,
    anchor: Cube,
    opening: Face6,
) -> Result<Vec<PlacementCandidate>, MissingSocket> {
    require(connector, SocketRole::Entrance)?;
    require(connector, SocketRole::Exit)?;
    require(boss, SocketRole::Entrance)?;

    let entrance = *connector.socket(SocketRole::Entrance).unwrap();
    let exit = *connector.socket(SocketRole::Exit).unwrap();
    let boss_entrance = *boss.socket(SocketRole::Entrance).unwrap();

    let mut candidates = Vec::with_capacity(3);
    for rotation in Rotation::ALL {
        let exit_facing = solve::rotated_exit_facing(exit.facing, rotation);
        if exit_facing == opening {
            continue;
        }

        let connector_position =
            anchor - rotation.transform_cell(connector.size(), entrance.offset);
        let exit_cube =
            connector_position + rotation.transform_cell(connector.size(), exit.offset);

        // The boss entrance must be antiparallel to the exit it attaches to.
        let Some(boss_rotation) =
            solve::rotation_to_align(boss_entrance.facing, exit_facing.opposite())
        else {
            continue;
        };
        // One cell beyond the exit, so the two modules do not double-occupy
        // the socket cell.
        let boss_entrance_cube = exit_cube + exit_facing.normal_vector();
        let boss_position =
            boss_entrance_cube - boss_rotation.transform_cell(boss.size(), boss_entrance.offset);

        let bounds = connector
            .bounds_at(connector_position, rotation)
            .union_box(boss.bounds_at(boss_position, boss_rotation));

        candidates.push(PlacementCandidate {
            anchor,
            rotation,
            connector_position,
            exit_cube,
            exit_facing,
            boss_rotation,
            boss_position,
            bounds,
            collisions: 0,
            colliding_cells: HashSet::new(),
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockId, BlockState};
    use crate::math::{GridSize, GridVector};
    use crate::template::Socket;
    use pretty_assertions::assert_eq;

    fn connector() -> ModuleTemplate {
        // 3×3×5 corridor running along +Z: entrance on the -Z end facing back
        // toward the maze, exit on the +Z end.
        ModuleTemplate::new(
            "connector",
            GridSize::new(3, 3, 5),
            vec![(GridVector::new(1, 0, 2), BlockState::of(BlockId(30)))],
            vec![
                Socket {
                    role: SocketRole::Entrance,
                    offset: GridVector::new(1, 0, 0),
                    facing: Face6::NZ,
                },
                Socket {
                    role: SocketRole::Exit,
                    offset: GridVector::new(1, 0, 4),
                    facing: Face6::PZ,
                },
            ],
        )
    }

    fn boss() -> ModuleTemplate {
        ModuleTemplate::new(
            "boss",
            GridSize::new(7, 5, 7),
            vec![],
            vec![Socket {
                role: SocketRole::Entrance,
                offset: GridVector::new(3, 0, 0),
                facing: Face6::NZ,
            }],
        )
    }

    #[test]
    fn opening_direction_excludes_exactly_one_rotation() {
        // Anchor at (0, 64, 0), detected opening EAST (+X). Of the four
        // rotations, exactly the one whose exit ends up facing +X is dropped.
        let candidates =
            candidates_for_anchor(&connector(), &boss(), Cube::new(0, 64, 0), Face6::PX).unwrap();
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.exit_facing != Face6::PX));
        // All four exit directions are distinct, so the three survivors cover
        // the remaining three directions.
        let mut facings: Vec<Face6> = candidates.iter().map(|c| c.exit_facing).collect();
        facings.sort_by_key(|f| *f as u8);
        assert_eq!(facings.len(), 3);
        facings.dedup();
        assert_eq!(facings.len(), 3);
    }

    #[test]
    fn entrance_socket_lands_on_anchor() {
        let connector = connector();
        let boss = boss();
        let anchor = Cube::new(10, 0, -20);
        for candidate in
            candidates_for_anchor(&connector, &boss, anchor, Face6::NX).unwrap()
        {
            let entrance = connector
                .world_socket(
                    SocketRole::Entrance,
                    candidate.connector_position,
                    candidate.rotation,
                )
                .unwrap();
            assert_eq!(entrance.cube, anchor);
        }
    }

    #[test]
    fn boss_alignment_contract() {
        let connector = connector();
        let boss = boss();
        for candidate in
            candidates_for_anchor(&connector, &boss, Cube::new(0, 0, 0), Face6::NZ).unwrap()
        {
            let boss_entrance = boss
                .world_socket(
                    SocketRole::Entrance,
                    candidate.boss_position,
                    candidate.boss_rotation,
                )
                .unwrap();
            // Entrance sits one cell past the exit, facing back at it.
            assert_eq!(
                boss_entrance.cube,
                candidate.exit_cube + candidate.exit_facing.normal_vector()
            );
            assert_eq!(boss_entrance.facing, candidate.exit_facing.opposite());
            // Both sockets are inside the candidate's combined bounds.
            assert!(candidate.bounds.contains_cube(candidate.exit_cube));
            assert!(candidate.bounds.contains_cube(boss_entrance.cube));
        }
    }

    #[test]
    fn missing_socket_is_reported() {
        let no_exit = ModuleTemplate::new(
            "broken",
            GridSize::new(1, 1, 1),
            vec![],
            vec![Socket {
                role: SocketRole::Entrance,
                offset: GridVector::new(0, 0, 0),
                facing: Face6::NZ,
            }],
        );
        let err =
            candidates_for_anchor(&no_exit, &boss(), Cube::ORIGIN, Face6::PX).unwrap_err();
        assert_eq!(err.role, SocketRole::Exit);
    }
}
