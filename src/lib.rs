//! Socket-based structure stitching for generated maze dungeons.
//!
//! This library extends a host world generator's maze structures with
//! hand-authored modules — a connector corridor, a boss chamber, and a
//! descending stair chain capped by a vault — so that every generated maze
//! guarantees a reachable boss encounter, without the maze's own generator
//! knowing anything about the extension content.
//!
//! The pipeline, leaves first: [`locate`] finds the sentinel markers the maze
//! generator leaves at its dead ends; [`solve`] and [`candidate`] enumerate
//! rotated placements against those markers; [`collision`] ranks them by
//! overlap with existing material; [`policy`] commits one through a
//! three-phase fallback that never fails to produce a boss chamber; [`placer`]
//! and [`corridor`] write the modules into the world; [`tracker`] guarantees
//! each structure occurrence is extended at most once.
//!
//! The host integrates by constructing one [`service::AnnexService`] per
//! world, handing it block access (a [`space::VoxelWorld`]) and a template
//! loader (a [`template::TemplateSource`]), and calling
//! [`AnnexService::tick`](service::AnnexService::tick) with the structure
//! occurrences intersecting loaded chunks from each dimension's periodic
//! callback.

pub mod block;
pub mod candidate;
pub mod collision;
pub mod corridor;
pub mod locate;
pub mod math;
pub mod placer;
pub mod policy;
pub mod service;
pub mod solve;
pub mod space;
pub mod template;
pub mod tracker;
