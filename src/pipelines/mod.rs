//! Render pipelines for model drawing.
//!
//! All model pipelines share one layout (material, camera, light bind groups)
//! and one shader. They differ only in blending and depth state, which is
//! captured by [`PipelineKey`]; [`PipelineCache`] builds each variant once.

pub mod basic;
pub mod light;
pub mod transparent;

use std::collections::HashMap;

use crate::data_structures::{model::PipelineKey, texture::Texture};

/// Depth state for a material: a disabled depth test always passes.
pub fn depth_state(key: PipelineKey) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: key.depth_write,
        depth_compare: if key.depth_test {
            wgpu::CompareFunction::LessEqual
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub struct PipelineCache {
    layout: wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
        material_layout: &wgpu::BindGroupLayout,
        camera_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[material_layout, camera_layout, light_layout],
            push_constant_ranges: &[],
        });
        Self {
            layout,
            color_format,
            sample_count,
            pipelines: HashMap::new(),
        }
    }

    /// Builds the pipeline for `key` unless it exists already.
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("Creating pipeline for {:?}", key);
        let (layout, format, samples) = (&self.layout, self.color_format, self.sample_count);
        let pipeline = if key.blended {
            transparent::mk_transparent_pipeline(device, layout, format, samples, key)
        } else {
            basic::mk_basic_pipeline(device, layout, format, samples, key)
        };
        self.pipelines.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }
}
