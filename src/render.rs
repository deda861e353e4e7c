//! Frame rendering.
//!
//! A loaded [`SceneGraph`] is uploaded once into a [`SceneRenderer`]: one GPU
//! material per material description, one vertex/index buffer pair per
//! primitive and one instance buffer per mesh node. Every frame the node world
//! transforms are written to the instance buffers and the scene is drawn in a
//! single pass:
//!
//! - opaque and cutout primitives first, in scene order
//! - alpha blended primitives afterwards, farthest node first
//!
//! Without a scene the pass only clears the surface to transparent.

use cgmath::{EuclideanSpace, Point3, Transform};
use wgpu::util::DeviceExt;

use crate::{
    camera::OrthographicCamera,
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, Material, Mesh},
        scene_graph::SceneGraph,
    },
};

/// GPU buffers of one mesh node.
struct NodeDraw {
    node: usize,
    mesh: usize,
    instance_buffer: wgpu::Buffer,
    /// World position of the node, used to order blended draws.
    origin: Point3<f32>,
}

/// Data for one instanced draw call.
struct Instanced<'a> {
    instance: &'a wgpu::Buffer,
    mesh: &'a Mesh,
    material: &'a Material,
}

pub struct SceneRenderer {
    materials: Vec<Material>,
    /// Uploaded primitives, indexed like `SceneGraph::meshes`.
    meshes: Vec<Vec<Mesh>>,
    nodes: Vec<NodeDraw>,
}

impl SceneRenderer {
    /// Uploads all meshes and materials of `graph` and builds the pipelines they need.
    pub fn upload(ctx: &mut Context, graph: &SceneGraph) -> anyhow::Result<Self> {
        let mut materials = Vec::with_capacity(graph.materials.len());
        for desc in &graph.materials {
            let material = Material::new(&ctx.device, &ctx.queue, desc, &ctx.material_layout)?;
            ctx.pipelines.prepare(&ctx.device, material.key);
            materials.push(material);
        }

        let meshes = graph
            .meshes
            .iter()
            .map(|mesh| {
                mesh.primitives
                    .iter()
                    .enumerate()
                    .map(|(idx, primitive)| {
                        Mesh::new(
                            &ctx.device,
                            &format!("{}[{}]", mesh.name, idx),
                            &primitive.vertices,
                            &primitive.indices,
                            primitive.material,
                        )
                    })
                    .collect()
            })
            .collect();

        let nodes = graph
            .mesh_nodes()
            .into_iter()
            .filter_map(|idx| {
                let node = &graph.nodes[idx];
                let mesh = node.mesh?;
                let instance_buffer =
                    ctx.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("Node {} Instance Buffer", idx)),
                            contents: bytemuck::cast_slice(&[node.world.to_raw()]),
                            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        });
                Some(NodeDraw {
                    node: idx,
                    mesh,
                    instance_buffer,
                    origin: Point3::from_vec(node.world.position),
                })
            })
            .collect::<Vec<_>>();

        log::info!(
            "Uploaded {} material(s), {} mesh(es) and {} mesh node(s); {} pipeline(s).",
            materials.len(),
            graph.meshes.len(),
            nodes.len(),
            ctx.pipelines.len()
        );
        Ok(Self {
            materials,
            meshes,
            nodes,
        })
    }

    /// Writes the current world transform of every mesh node.
    pub fn write_transforms(&mut self, queue: &wgpu::Queue, graph: &SceneGraph) {
        for draw in &mut self.nodes {
            let Some(node) = graph.nodes.get(draw.node) else {
                continue;
            };
            let raw: InstanceRaw = node.world.to_raw();
            draw.origin = Point3::from_vec(node.world.position);
            queue.write_buffer(&draw.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
        }
    }

    /// Opaque and blended draws, the latter sorted back to front for `camera`.
    fn batches(&self, camera: &OrthographicCamera) -> (Vec<Instanced<'_>>, Vec<Instanced<'_>>) {
        let view = camera.view_matrix();
        let mut opaque = Vec::new();
        let mut blended: Vec<(f32, Instanced<'_>)> = Vec::new();
        for draw in &self.nodes {
            let Some(meshes) = self.meshes.get(draw.mesh) else {
                continue;
            };
            // view space looks down -z, so smaller z is farther away
            let depth = view.transform_point(draw.origin).z;
            for mesh in meshes {
                let Some(material) = self.materials.get(mesh.material) else {
                    log::debug!("Mesh {} refers to missing material {}", mesh.name, mesh.material);
                    continue;
                };
                let instanced = Instanced {
                    instance: &draw.instance_buffer,
                    mesh,
                    material,
                };
                if material.key.blended {
                    blended.push((depth, instanced));
                } else {
                    opaque.push(instanced);
                }
            }
        }
        blended.sort_by(|a, b| a.0.total_cmp(&b.0));
        (opaque, blended.into_iter().map(|(_, draw)| draw).collect())
    }
}

/// Renders one frame: clears to transparent and draws `scene` if present.
pub fn render(
    ctx: &Context,
    scene: Option<&SceneRenderer>,
    camera: &OrthographicCamera,
) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

    let (target, resolve_target, store) = match &ctx.msaa_target {
        Some(msaa) => (&msaa.view, Some(&view), wgpu::StoreOp::Discard),
        None => (&view, None, wgpu::StoreOp::Store),
    };

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if let Some(scene) = scene {
            let (opaque, blended) = scene.batches(camera);
            for instanced in opaque.iter().chain(blended.iter()) {
                let Some(pipeline) = ctx.pipelines.get(&instanced.material.key) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_mesh_instanced(
                    instanced.mesh,
                    instanced.material,
                    0..1,
                    &ctx.camera.bind_group,
                    &ctx.light.bind_group,
                );
            }
        }
    }

    ctx.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}
