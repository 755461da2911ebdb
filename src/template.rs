//! Hand-authored module templates and their sockets.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::block::BlockState;
use crate::math::{Cube, Face6, GridAab, GridSize, GridVector, Rotation};

/// The role a [`Socket`] plays when chaining modules together.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, exhaust::Exhaust)]
#[allow(clippy::exhaustive_enums)]
pub enum SocketRole {
    /// Where the module is attached to the preceding module or anchor marker.
    Entrance,
    /// Where the next module in a horizontal chain attaches.
    Exit,
    /// Upward connection of a vertical (stair) module.
    Top,
    /// Downward connection of a vertical (stair) module.
    Bottom,
}

/// A named, directional connection point on a module.
///
/// The offset and facing are in the module's canonical (unrotated) frame and are
/// meaningless in world space until combined with a placement position and
/// [`Rotation`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Socket {
    /// What this socket is for.
    pub role: SocketRole,
    /// Cell position of the socket within the module, in `[0, size)`.
    pub offset: GridVector,
    /// Direction the connection leads, away from the module.
    pub facing: Face6,
}

/// A socket transformed into world space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorldSocket {
    /// The cube the socket occupies.
    pub cube: Cube,
    /// Direction the connection leads, in world space.
    pub facing: Face6,
}

/// An immutable, pre-authored block layout with declared sockets.
///
/// Blocks are stored sparsely; cells not listed are not written at placement
/// time, so modules may have irregular outlines within their bounding size.
#[derive(Clone)]
pub struct ModuleTemplate {
    name: String,
    size: GridSize,
    blocks: Vec<(GridVector, BlockState)>,
    sockets: Vec<Socket>,
}

impl ModuleTemplate {
    /// Construct a template.
    ///
    /// Panics if any block or socket offset lies outside `[0, size)`; that is an
    /// authoring error, not a runtime condition.
    #[track_caller]
    pub fn new(
        name: impl Into<String>,
        size: GridSize,
        blocks: Vec<(GridVector, BlockState)>,
        sockets: Vec<Socket>,
    ) -> Self {
        let name = name.into();
        let in_bounds = |offset: GridVector| {
            offset.x >= 0
                && (offset.x as u32) < size.width
                && offset.y >= 0
                && (offset.y as u32) < size.height
                && offset.z >= 0
                && (offset.z as u32) < size.depth
        };
        for (offset, _) in &blocks {
            assert!(in_bounds(*offset), "template {name:?}: block at {offset:?} outside {size:?}");
        }
        for socket in &sockets {
            assert!(
                in_bounds(socket.offset),
                "template {name:?}: socket at {:?} outside {size:?}",
                socket.offset
            );
        }
        Self {
            name,
            size,
            blocks,
            sockets,
        }
    }

    /// The template's name, as known to the [`TemplateSource`].
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical (unrotated) size.
    #[inline]
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Canonical height, as a signed coordinate delta.
    #[inline]
    pub fn height(&self) -> i32 {
        self.size.height as i32
    }

    /// All declared sockets.
    #[inline]
    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    /// The first socket with the given role, if any.
    pub fn socket(&self, role: SocketRole) -> Option<&Socket> {
        self.sockets.iter().find(|socket| socket.role == role)
    }

    /// The template's blocks, as (canonical offset, state) pairs.
    #[inline]
    pub fn blocks(&self) -> impl Iterator<Item = (GridVector, BlockState)> + '_ {
        self.blocks.iter().copied()
    }

    /// World bounding box of the module when placed at `position` with `rotation`.
    ///
    /// `position` is the most negative corner of the rotated box.
    pub fn bounds_at(&self, position: Cube, rotation: Rotation) -> GridAab {
        GridAab::from_lower_size(position.lower_bounds(), rotation.transform_size(self.size))
    }

    /// The given socket transformed into world space for a placement.
    pub fn world_socket(
        &self,
        role: SocketRole,
        position: Cube,
        rotation: Rotation,
    ) -> Option<WorldSocket> {
        let socket = self.socket(role)?;
        Some(WorldSocket {
            cube: position + rotation.transform_cell(self.size, socket.offset),
            facing: rotation.transform(socket.facing),
        })
    }
}

impl fmt::Debug for ModuleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleTemplate")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("blocks", &self.blocks.len())
            .field("sockets", &self.sockets)
            .finish()
    }
}

/// Error loading a named module template.
///
/// This is fatal for the structure instance being processed: a missing or
/// corrupt resource would fail identically on every retry.
#[derive(Clone, Debug, Eq, PartialEq, displaydoc::Display)]
#[displaydoc("template {name:?} failed to load: {reason}")]
pub struct TemplateLoadError {
    /// Name of the template that was requested.
    pub name: String,
    /// Host-provided description of the failure.
    pub reason: String,
}

impl core::error::Error for TemplateLoadError {}

/// Source of module templates, implemented by the host's resource loader.
pub trait TemplateSource: fmt::Debug {
    /// Load the template with the given name.
    fn load(&self, name: &str) -> Result<Arc<ModuleTemplate>, TemplateLoadError>;
}

/// A [`TemplateSource`] backed by a map, for tests and embedded content.
#[derive(Clone, Debug, Default)]
pub struct MemoryTemplates {
    templates: HashMap<String, Arc<ModuleTemplate>>,
}

impl MemoryTemplates {
    /// Construct an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, keyed by its own name.
    pub fn insert(&mut self, template: ModuleTemplate) {
        self.templates
            .insert(template.name().to_owned(), Arc::new(template));
    }
}

impl TemplateSource for MemoryTemplates {
    fn load(&self, name: &str) -> Result<Arc<ModuleTemplate>, TemplateLoadError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateLoadError {
                name: name.to_owned(),
                reason: String::from("no such template"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockId;
    use pretty_assertions::assert_eq;

    fn two_by_one_by_three() -> ModuleTemplate {
        ModuleTemplate::new(
            "t",
            GridSize::new(2, 1, 3),
            vec![(GridVector::new(0, 0, 0), BlockState::of(BlockId(1)))],
            vec![Socket {
                role: SocketRole::Entrance,
                offset: GridVector::new(0, 0, 2),
                facing: Face6::PZ,
            }],
        )
    }

    #[test]
    fn world_socket_identity_rotation() {
        let template = two_by_one_by_three();
        let socket = template
            .world_socket(SocketRole::Entrance, Cube::new(10, 0, 10), Rotation::R0)
            .unwrap();
        assert_eq!(
            socket,
            WorldSocket {
                cube: Cube::new(10, 0, 12),
                facing: Face6::PZ,
            }
        );
    }

    #[test]
    fn world_socket_quarter_rotation() {
        let template = two_by_one_by_three();
        // R90: canonical (0, 0, 2) in a 2×1×3 box maps to (depth-1-2, 0, 0) = (0, 0, 0),
        // and PZ maps to NX.
        let socket = template
            .world_socket(SocketRole::Entrance, Cube::new(10, 0, 10), Rotation::R90)
            .unwrap();
        assert_eq!(
            socket,
            WorldSocket {
                cube: Cube::new(10, 0, 10),
                facing: Face6::NX,
            }
        );
        assert_eq!(
            template.bounds_at(Cube::new(10, 0, 10), Rotation::R90),
            GridAab::from_lower_size([10, 0, 10], [3, 1, 2])
        );
    }

    #[test]
    fn missing_socket_is_none() {
        let template = two_by_one_by_three();
        assert!(template.socket(SocketRole::Bottom).is_none());
        assert!(
            template
                .world_socket(SocketRole::Bottom, Cube::ORIGIN, Rotation::R0)
                .is_none()
        );
    }

    #[test]
    #[should_panic = "outside"]
    fn out_of_bounds_block_panics() {
        let _ = ModuleTemplate::new(
            "bad",
            GridSize::new(1, 1, 1),
            vec![(GridVector::new(1, 0, 0), BlockState::of(BlockId(1)))],
            vec![],
        );
    }
}
