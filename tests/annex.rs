//! End-to-end tests of the annex pipeline against an in-memory world:
//! marker discovery through candidate selection, placement, descent, and
//! idempotent re-ticking.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use maze_annex::block::{BlockId, BlockState, Palette};
use maze_annex::math::{Cube, Face6, GridAab, GridSize, GridVector};
use maze_annex::service::{AnnexConfig, AnnexService, StructureOccurrence};
use maze_annex::space::{DimensionId, SparseWorld, VoxelWorld as _};
use maze_annex::template::{MemoryTemplates, ModuleTemplate, Socket, SocketRole};

const CONNECTOR_BLOCK: BlockId = BlockId(30);
const BOSS_BLOCK: BlockId = BlockId(31);
const STAIR_BLOCK: BlockId = BlockId(32);
const VAULT_BLOCK: BlockId = BlockId(33);

fn palette() -> Palette {
    Palette {
        air: BlockId(0),
        ambient_fluid: BlockId(1),
        decorative_fluid: BlockId(2),
        dead_end_marker: BlockId(3),
        connector_marker: BlockId(4),
        structure_materials: hashbrown::HashSet::from_iter([BlockId(10)]),
        passable: hashbrown::HashSet::new(),
    }
}

fn templates(config: &AnnexConfig) -> Arc<MemoryTemplates> {
    let mut templates = MemoryTemplates::new();
    templates.insert(ModuleTemplate::new(
        config.connector_template.clone(),
        GridSize::new(3, 3, 5),
        vec![(GridVector::new(1, 0, 2), BlockState::of(CONNECTOR_BLOCK))],
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
    ));
    // Boss chamber with a floor hatch the stair chain descends from.
    templates.insert(ModuleTemplate::new(
        config.boss_template.clone(),
        GridSize::new(7, 5, 7),
        vec![(GridVector::new(3, 1, 3), BlockState::of(BOSS_BLOCK))],
        vec![
            Socket {
                role: SocketRole::Entrance,
                offset: GridVector::new(3, 0, 0),
                facing: Face6::NZ,
            },
            Socket {
                role: SocketRole::Bottom,
                offset: GridVector::new(3, 0, 3),
                facing: Face6::NZ,
            },
        ],
    ));
    templates.insert(ModuleTemplate::new(
        config.stair_template.clone(),
        GridSize::new(3, 8, 3),
        vec![(GridVector::new(1, 0, 1), BlockState::of(STAIR_BLOCK))],
        vec![
            Socket {
                role: SocketRole::Top,
                offset: GridVector::new(1, 7, 1),
                facing: Face6::NZ,
            },
            Socket {
                role: SocketRole::Bottom,
                offset: GridVector::new(1, 0, 1),
                facing: Face6::NZ,
            },
        ],
    ));
    templates.insert(ModuleTemplate::new(
        config.terminus_template.clone(),
        GridSize::new(5, 4, 5),
        vec![(GridVector::new(2, 0, 2), BlockState::of(VAULT_BLOCK))],
        vec![Socket {
            role: SocketRole::Top,
            offset: GridVector::new(2, 0, 4),
            facing: Face6::NZ,
        }],
    ));
    Arc::new(templates)
}

const MARKERS: [Cube; 3] = [Cube::new(0, 64, 0), Cube::new(10, 64, 0), Cube::new(0, 64, 10)];

fn maze_world(palette: &Palette) -> SparseWorld {
    let mut world = SparseWorld::new(palette.air);
    for marker in MARKERS {
        world
            .set_block(marker, BlockState::of(palette.dead_end_marker))
            .unwrap();
    }
    world
}

fn occurrence() -> StructureOccurrence {
    StructureOccurrence {
        origin: Cube::new(5, 64, 5),
        bounds: Some(GridAab::from_lower_size([-5, 60, -5], [25, 10, 25])),
    }
}

#[test]
fn full_chain_is_placed_and_reaches_target_depth() {
    let palette = palette();
    let config = AnnexConfig::default();
    let templates = templates(&config);
    let mut service = AnnexService::new(config, palette.clone(), templates);
    let mut world = maze_world(&palette);
    let dimension = DimensionId::from("overworld");

    service.tick(&mut world, &dimension, 0, &[occurrence()]);
    assert!(service.is_processed(&dimension, occurrence().origin));

    // The boss chamber was chained at maze level (Phase A), not isolated at
    // the distant fallback offset, and registered as a point of interest.
    let pois = service.points_of_interest(&dimension);
    assert_eq!(pois.len(), 1);
    let center = pois[0];
    assert_eq!(center.y, 66);
    assert!(center.x.abs() < 100 && center.z.abs() < 100);

    // The boss template's centerpiece block sits under the chamber's center.
    assert_eq!(
        world.block(Cube::new(center.x, 65, center.z)).unwrap().id,
        BOSS_BLOCK
    );

    // The stair shaft descends beneath the floor hatch: segments are 8 tall,
    // the first starts at Y=56, and the loop stops once another full segment
    // would overshoot the default target of Y=−4.
    for y in [56, 48, 40, 32, 24, 16, 8] {
        assert_eq!(
            world.block(Cube::new(center.x, y, center.z)).unwrap().id,
            STAIR_BLOCK,
            "expected stair segment block at y={y}"
        );
    }
    assert_eq!(
        world.block(Cube::new(center.x, 0, center.z)).unwrap().id,
        palette.air
    );

    // The vault caps the shaft just below the last segment.
    let vault_found = (-4..=4).any(|dx| {
        (-4..=4).any(|dz| {
            world
                .block(Cube::new(center.x + dx, 7, center.z + dz))
                .unwrap()
                .id
                == VAULT_BLOCK
        })
    });
    assert!(vault_found, "no vault block found at y=7 near the shaft");

    // Every discovered marker was cleared, whichever anchor was chosen.
    for marker in MARKERS {
        assert_eq!(world.block(marker).unwrap().id, palette.air);
    }
}

#[test]
fn reprocessing_makes_no_further_writes() {
    let palette = palette();
    let config = AnnexConfig::default();
    let templates = templates(&config);
    let mut service = AnnexService::new(config, palette.clone(), templates);
    let mut world = maze_world(&palette);
    let dimension = DimensionId::from("overworld");

    service.tick(&mut world, &dimension, 0, &[occurrence()]);
    let writes = world.write_count();
    assert!(writes > 0);

    // Same occurrence on later ticks, including ticks that flush the deferred
    // waterlogging re-runs: no block is written twice.
    for now in [1, 20, 60, 100, 1000] {
        service.tick(&mut world, &dimension, now, &[occurrence()]);
    }
    assert_eq!(world.write_count(), writes);
    assert_eq!(service.points_of_interest(&dimension).len(), 1);
}

#[test]
fn persisted_registry_survives_restart() {
    let palette = palette();
    let config = AnnexConfig::default();
    let templates = templates(&config);
    let mut service = AnnexService::new(config.clone(), palette.clone(), templates.clone());
    let mut world = maze_world(&palette);
    let dimension = DimensionId::from("overworld");

    service.tick(&mut world, &dimension, 0, &[occurrence()]);
    let writes = world.write_count();
    let json = serde_json::to_string(&service.to_snapshot()).unwrap();

    // A fresh service restored from the snapshot does not re-place anything.
    let mut restarted = AnnexService::new(config, palette.clone(), templates);
    restarted.restore_snapshot(serde_json::from_str(&json).unwrap());
    assert!(restarted.is_processed(&dimension, occurrence().origin));
    restarted.tick(&mut world, &dimension, 5000, &[occurrence()]);
    assert_eq!(world.write_count(), writes);
}

#[test]
fn deterministic_for_identical_worlds() {
    let palette = palette();
    let config = AnnexConfig::default();
    let templates = templates(&config);
    let dimension = DimensionId::from("overworld");

    let run = || {
        let mut service =
            AnnexService::new(config.clone(), palette.clone(), templates.clone());
        let mut world = maze_world(&palette);
        service.tick(&mut world, &dimension, 0, &[occurrence()]);
        service.points_of_interest(&dimension).to_vec()
    };
    assert_eq!(run(), run());
}
