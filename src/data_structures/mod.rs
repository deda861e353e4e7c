//! Viewer data structures: scene graph, meshes, textures, and transforms.
//!
//! - `bounds` is the axis-aligned box used for framing
//! - `instance` holds per-node transformation data
//! - `model` contains the GPU mesh and material resources
//! - `scene_graph` is the CPU description of a loaded asset
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod bounds;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
