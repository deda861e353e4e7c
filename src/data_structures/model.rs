//! GPU side of loaded meshes and materials.
//!
//! The CPU description of an asset lives in [`crate::data_structures::scene_graph`];
//! this module holds what it becomes once uploaded: vertex/index buffers per
//! primitive and a bind group per material.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::{scene_graph::MaterialDesc, texture::Texture};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-material shading parameters as laid out in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    base_color: [f32; 4],
    alpha_cutoff: f32,
    // 1.0 forces the output alpha to one
    opaque: f32,
    // 0.0 discards back faces in the fragment shader
    double_sided: f32,
    _padding: f32,
}

impl From<&MaterialDesc> for MaterialUniform {
    fn from(desc: &MaterialDesc) -> Self {
        Self {
            base_color: desc.base_color,
            alpha_cutoff: desc.alpha_test,
            opaque: if desc.transparent { 0.0 } else { 1.0 },
            double_sided: if desc.double_sided { 1.0 } else { 0.0 },
            _padding: 0.0,
        }
    }
}

/// Fixed-function state a material needs from its pipeline.
///
/// Face culling is not part of it: it depends on the handedness of each
/// instance and is done in the fragment shader.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct PipelineKey {
    pub blended: bool,
    pub depth_write: bool,
    pub depth_test: bool,
}

impl From<&MaterialDesc> for PipelineKey {
    fn from(desc: &MaterialDesc) -> Self {
        Self {
            blended: desc.transparent,
            depth_write: desc.depth_write,
            depth_test: desc.depth_test,
        }
    }
}

#[derive(Debug)]
pub struct Material {
    #[allow(unused)]
    pub name: String,
    #[allow(unused)]
    pub diffuse_texture: Texture,
    #[allow(unused)]
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub key: PipelineKey,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desc: &MaterialDesc,
        layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<Self> {
        let diffuse_texture = match &desc.base_color_texture {
            Some(image) => {
                Texture::from_rgba(device, queue, image, &desc.sampler, Some(&desc.name))?
            }
            None => Texture::create_white(device, queue),
        };
        let uniform = MaterialUniform::from(desc);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", desc.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let default_sampler;
        let sampler = match &diffuse_texture.sampler {
            Some(sampler) => sampler,
            None => {
                default_sampler =
                    crate::data_structures::texture::create_sampler(device, &desc.sampler);
                &default_sampler
            }
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
            label: Some(&desc.name),
        });

        Ok(Self {
            name: desc.name.clone(),
            diffuse_texture,
            uniform_buffer,
            bind_group,
            key: PipelineKey::from(desc),
        })
    }
}

/// One uploaded primitive.
#[derive(Debug)]
pub struct Mesh {
    #[allow(unused)]
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
        material: usize,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
            material,
        }
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}
