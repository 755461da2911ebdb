//! The vertical corridor: a repeating stair-segment chain descending to a
//! target elevation, capped with a terminus module.

use crate::candidate::MissingSocket;
use crate::math::{Cube, Face6, GridCoordinate, Rotation};
use crate::placer::{Chain, PlacedModule};
use crate::space::{SetCubeError, VoxelWorld};
use crate::template::{ModuleTemplate, Socket, SocketRole};

/// A module position and rotation decided by planning, before any world write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlannedModule {
    /// Most negative corner of the placement.
    pub position: Cube,
    /// Rotation to place with.
    pub rotation: Rotation,
}

/// The fully-planned descent: stair segments top to bottom, then the terminus.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DescentPlan {
    /// Stair segments, in descending order.
    pub segments: Vec<PlannedModule>,
    /// The terminus capping the chain.
    pub terminus: PlannedModule,
}

/// Errors from planning a descent.
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum DescentError {
    /// {0}
    Socket(MissingSocket),
    /// template {template:?} has a vertical-facing {role:?} socket, which cannot be oriented
    UnorientableSocket {
        /// Name of the offending template.
        template: String,
        /// The socket whose facing should have been horizontal.
        role: SocketRole,
    },
}

impl core::error::Error for DescentError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            DescentError::Socket(e) => Some(e),
            DescentError::UnorientableSocket { .. } => None,
        }
    }
}

impl From<MissingSocket> for DescentError {
    fn from(e: MissingSocket) -> Self {
        DescentError::Socket(e)
    }
}

fn oriented_socket(
    template: &ModuleTemplate,
    role: SocketRole,
) -> Result<Socket, DescentError> {
    let socket = *template.socket(role).ok_or(MissingSocket {
        template: template.name().to_owned(),
        role,
    })?;
    if !socket.facing.is_horizontal() {
        return Err(DescentError::UnorientableSocket {
            template: template.name().to_owned(),
            role,
        });
    }
    Ok(socket)
}

/// Plan a descent from `top_anchor` (the cube the first segment's top socket
/// must occupy) down to `target_y`, entering with the given world heading.
///
/// Segments chain bottom socket to top socket, each descending by exactly its
/// own height, while `current_y − segment_height > target_y` still leaves room
/// for another (evaluated inclusively, so the final segment's own descent may
/// land exactly on `target_y`). The terminus's top socket is then aligned to
/// the last segment's bottom socket, with `socket_correction` subtracted from
/// its Y to compensate the known socket-height mismatch between the segment
/// and terminus templates.
///
/// `segment_cap` bounds the segment count so planning terminates for any
/// input. Pure; no world access.
pub fn plan_descent(
    segment: &ModuleTemplate,
    terminus: &ModuleTemplate,
    top_anchor: Cube,
    entry_heading: Face6,
    target_y: GridCoordinate,
    socket_correction: GridCoordinate,
    segment_cap: usize,
) -> Result<DescentPlan, DescentError> {
    let top = oriented_socket(segment, SocketRole::Top)?;
    let bottom = oriented_socket(segment, SocketRole::Bottom)?;
    let terminus_top = oriented_socket(terminus, SocketRole::Top)?;
    let segment_height = segment.height();

    let mut segments = Vec::new();
    let mut anchor = top_anchor;
    let mut heading = entry_heading;
    loop {
        // from_to cannot fail here: both facings were checked horizontal.
        let rotation = Rotation::from_to(top.facing, heading).unwrap();
        let position = anchor - rotation.transform_cell(segment.size(), top.offset);
        if position.y - segment_height < target_y {
            break;
        }
        if segments.len() >= segment_cap {
            log::warn!(
                "descent from {top_anchor:?} hit the {segment_cap}-segment cap before reaching y={target_y}"
            );
            break;
        }
        segments.push(PlannedModule { position, rotation });

        let bottom_world = position + rotation.transform_cell(segment.size(), bottom.offset);
        heading = rotation.transform(bottom.facing);
        anchor = bottom_world + Face6::NY.normal_vector();
    }

    let terminus_rotation = Rotation::from_to(terminus_top.facing, heading).unwrap();
    let mut terminus_position =
        anchor - terminus_rotation.transform_cell(terminus.size(), terminus_top.offset);
    // Vertical placement comes from the socket-height compensation, not from
    // cube adjacency: the terminus entry level sits `socket_correction` below
    // the foot of the shaft.
    terminus_position.y = (anchor.y + 1) - terminus_top.offset.y - socket_correction;

    Ok(DescentPlan {
        segments,
        terminus: PlannedModule {
            position: terminus_position,
            rotation: terminus_rotation,
        },
    })
}

/// Place a planned descent into the world, top to bottom, appending each
/// placed box to the chain's protected areas.
pub fn build_descent(
    world: &mut dyn VoxelWorld,
    plan: &DescentPlan,
    segment: &ModuleTemplate,
    terminus: &ModuleTemplate,
    chain: &mut Chain<'_>,
) -> Result<Vec<PlacedModule>, SetCubeError> {
    let mut placed = Vec::with_capacity(plan.segments.len() + 1);
    for planned in &plan.segments {
        placed.push(chain.place(world, segment, planned.position, planned.rotation)?);
    }
    placed.push(chain.place(world, terminus, plan.terminus.position, plan.terminus.rotation)?);
    Ok(placed)
}
