//! ortho-viewer
//!
//! A minimal glTF viewer: it opens a window, loads one animated asset in the
//! background, frames it in an orthographic camera, plays all of its clips
//! layered on top of each other and renders it every frame with damped orbit,
//! pan and zoom controls.
//!
//! High-level modules
//! - `animation`: clips, additive conversion, the mixer and the layering policy
//! - `camera`: orthographic frustum, camera and its GPU uniform
//! - `config`: every tunable of the viewer
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `controls`: damped orbit controls driven by mouse input
//! - `data_structures`: scene graph, bounds, meshes, instances, textures
//! - `flow`: the winit event loop and asset load task
//! - `pipelines`: render pipelines for opaque/cutout and blended materials
//! - `resources`: glTF loading into a scene graph and clips
//! - `render`: GPU upload of a scene and frame rendering
//! - `viewer`: window independent viewer state (bring-up, frame advance, resize)
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use config::{AdditiveReference, Cli, ViewerConfig};
pub use flow::{StopHandle, Viewer, ViewerEvent, run};
pub use viewer::{SceneState, ViewerState};
