use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, PipelineKey, Vertex},
    },
    pipelines::{basic::mk_render_pipeline, depth_state},
};

/**
 * Pipeline for materials that stay alpha blended.
 *
 * Materials reach it only if they are not switched to cutout mode. The
 * surface is composited premultiplied, so colour is blended with source alpha
 * and alpha accumulates as `src + dst * (1 - src)`.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Transparent Model Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("model.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(depth_state(key)),
        sample_count,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
