//! Viewer configuration.
//!
//! Every tunable the viewer uses lives in [`ViewerConfig`]. The defaults
//! reproduce the stock viewer: a 3x zoomed orthographic frustum of height 2,
//! damped orbit controls and cutout materials with a 0.5 alpha threshold.

use std::path::PathBuf;

use clap::Parser;

/// Which pose additive clips are expressed relative to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdditiveReference {
    /// Each layered clip is made additive against its own first frame.
    #[default]
    OwnFirstFrame,
    /// Layered clips are made additive against the first frame of the base clip.
    /// Tracks the base clip does not animate are left as they are.
    BaseClipFirstFrame,
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Path of the glTF/GLB asset to load.
    pub asset: PathBuf,
    /// Fixed zoom factor baked into the frustum bounds (higher shows less).
    pub zoom_factor: f32,
    /// Base height of the frustum before zoom.
    pub frustum_size: f32,
    pub near: f32,
    pub far: f32,
    pub damping_factor: f32,
    pub enable_pan: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Fragments with an alpha below this are discarded by cutout materials.
    pub alpha_cutoff: f32,
    /// Camera distance is the largest bounding box extent times this margin.
    pub framing_margin: f32,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub additive_reference: AdditiveReference,
    /// Requested MSAA sample count; falls back to 1 if the surface can't do it.
    pub msaa_samples: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "ortho-viewer".to_string(),
            width: 1280,
            height: 720,
            asset: PathBuf::from("assets").join("darki006.glb"),
            zoom_factor: 3.0,
            frustum_size: 2.0,
            near: 0.01,
            far: 100.0,
            damping_factor: 0.08,
            enable_pan: true,
            min_zoom: 0.5,
            max_zoom: 5.0,
            alpha_cutoff: 0.5,
            framing_margin: 1.2,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 3.0,
            additive_reference: AdditiveReference::OwnFirstFrame,
            msaa_samples: 4,
        }
    }
}

/// Command line of the `ortho-viewer` binary.
#[derive(Debug, Parser)]
#[command(name = "ortho-viewer", version, about = "Orthographic glTF viewer")]
pub struct Cli {
    /// glTF or GLB asset to show instead of the bundled one
    pub asset: Option<PathBuf>,
}

impl ViewerConfig {
    /// Overrides the defaults with whatever was given on the command line.
    pub fn with_cli(mut self, cli: Cli) -> Self {
        if let Some(asset) = cli.asset {
            self.asset = asset;
        }
        self
    }
}
