//! Viewer state independent of the window and GPU.
//!
//! [`ViewerState`] owns the camera, its orbit controls, the frame clock and
//! the loaded scene. The event loop in [`crate::flow`] feeds it load results,
//! window sizes and frame ticks; everything it does is plain CPU work so it
//! can be driven without a surface.

use cgmath::{Point3, Vector3};
use instant::Instant;
use winit::event::WindowEvent;

use crate::{
    animation::{ActionId, AnimationMixer, layer_clips},
    camera::{OrthoFrustum, OrthographicCamera},
    config::ViewerConfig,
    controls::OrbitControls,
    data_structures::{bounds::Aabb, scene_graph::SceneGraph},
    resources::LoadedAsset,
};

/// Free running clock measuring the time between frames.
#[derive(Debug)]
pub struct Clock {
    last: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous call (or since the clock was created).
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct LoadedScene {
    pub graph: SceneGraph,
    pub mixer: AnimationMixer,
    /// Actions started by the layering, in clip order.
    pub actions: Vec<ActionId>,
}

#[derive(Debug, Default)]
pub enum SceneState {
    #[default]
    Loading,
    Loaded(LoadedScene),
    Failed,
}

/// Where the camera goes to see `bounds` whole: the pivot is the box center
/// and the camera sits on +Z at `margin` times the largest extent.
pub fn framing(bounds: &Aabb, margin: f32) -> (Point3<f32>, Point3<f32>) {
    let center = bounds.center();
    let size = bounds.size();
    let max_dim = size.x.max(size.y).max(size.z);
    (center, center + Vector3::new(0.0, 0.0, max_dim * margin))
}

pub struct ViewerState {
    pub config: ViewerConfig,
    pub camera: OrthographicCamera,
    pub controls: OrbitControls,
    pub clock: Clock,
    pub scene: SceneState,
    viewport: (u32, u32),
}

impl ViewerState {
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let frustum = OrthoFrustum::from_config(&config, width, height);
        let camera = OrthographicCamera::new(frustum);
        let controls = OrbitControls::new(&config);
        Self {
            config,
            camera,
            controls,
            clock: Clock::new(),
            scene: SceneState::Loading,
            viewport: (width, height),
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn loaded(&self) -> Option<&LoadedScene> {
        match &self.scene {
            SceneState::Loaded(scene) => Some(scene),
            _ => None,
        }
    }

    /// Brings up the scene from a finished load.
    ///
    /// On success the materials are switched to cutout mode, the camera is
    /// framed on the asset and all clips start playing. A failure is logged
    /// once and leaves the viewer rendering an empty scene.
    pub fn on_load_result(&mut self, result: anyhow::Result<LoadedAsset>) {
        if !matches!(self.scene, SceneState::Loading) {
            log::warn!("Ignoring a load result that arrived after bring-up.");
            return;
        }
        let LoadedAsset { mut graph, clips } = match result {
            Ok(asset) => asset,
            Err(e) => {
                log::error!("Failed to load {}: {:#}", self.config.asset.display(), e);
                self.scene = SceneState::Failed;
                return;
            }
        };

        let changed = graph.make_materials_cutout(self.config.alpha_cutoff);
        log::debug!("{} material(s) switched to cutout mode", changed);

        graph.update_world_transforms();
        let bounds = graph.bounding_box();
        let (center, position) = framing(&bounds, self.config.framing_margin);
        self.controls.target = center;
        self.camera.position = position;
        self.camera.target = center;
        self.camera.update_projection_matrix();
        self.controls.update(&mut self.camera);
        log::info!(
            "Framed bounds {:?}..{:?} from {:?}",
            bounds.min,
            bounds.max,
            self.camera.position
        );

        let mut mixer = AnimationMixer::new();
        let actions = layer_clips(&mut mixer, &clips, self.config.additive_reference);
        self.scene = SceneState::Loaded(LoadedScene {
            graph,
            mixer,
            actions,
        });
    }

    /// Advances animation and controls by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if let SceneState::Loaded(scene) = &mut self.scene {
            scene.mixer.update(dt, &mut scene.graph);
            scene.graph.update_world_transforms();
        }
        self.controls.update(&mut self.camera);
    }

    /// Advances by the time elapsed since the previous frame.
    pub fn tick(&mut self) {
        let dt = self.clock.delta();
        self.advance(dt);
    }

    /// Recomputes the frustum for a new window size.
    ///
    /// Returns `false` and keeps the old frustum if a dimension is zero.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.viewport = (width, height);
        self.camera.frustum.resize(width, height);
        self.camera.update_projection_matrix();
        true
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        self.controls
            .handle_window_event(event, &self.camera, self.viewport);
    }
}
