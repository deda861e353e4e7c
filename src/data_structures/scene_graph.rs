//! Scene graph of a loaded asset.
//!
//! The graph is an arena: nodes are addressed by their index, which is the
//! node index of the source glTF document so animation tracks can target
//! nodes directly. Each node keeps its authored rest pose, the local pose the
//! animation mixer writes to, and a world transform derived from its parents.
//!
//! Meshes and materials are plain CPU descriptions. They are uploaded to the
//! GPU by [`crate::render::SceneRenderer`].

use std::sync::Arc;

use log::warn;

use crate::data_structures::{bounds::Aabb, instance::Instance, model::ModelVertex};

/// Filtering and wrapping of a material's base colour texture.
///
/// Textures are uploaded without mipmaps, so only the base level filters of
/// the glTF sampler are honoured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerDesc {
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub address_mode_u: wgpu::AddressMode,
    pub address_mode_v: wgpu::AddressMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
        }
    }
}

/// How a surface is shaded and composited.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    /// Linear RGBA multiplier applied to the base colour texture.
    pub base_color: [f32; 4],
    pub base_color_texture: Option<Arc<image::RgbaImage>>,
    pub sampler: SamplerDesc,
    /// Alpha blended instead of opaque.
    pub transparent: bool,
    /// Fragments with alpha below this value are discarded; 0 disables the test.
    pub alpha_test: f32,
    pub depth_write: bool,
    pub depth_test: bool,
    pub double_sided: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            sampler: SamplerDesc::default(),
            transparent: false,
            alpha_test: 0.0,
            depth_write: true,
            depth_test: true,
            double_sided: false,
        }
    }
}

impl MaterialDesc {
    /// Switches the material from alpha blending to a depth-correct alpha test.
    pub fn make_cutout(&mut self, alpha_cutoff: f32) {
        self.transparent = false;
        self.alpha_test = alpha_cutoff;
        self.depth_write = true;
        self.depth_test = true;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Primitive {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: usize,
    /// Bounds in the owning node's local space.
    pub bounds: Aabb,
}

impl Primitive {
    pub fn new(vertices: Vec<ModelVertex>, indices: Vec<u32>, material: usize) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| v.position.into()));
        Self {
            vertices,
            indices,
            material,
            bounds,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    /// Pose as authored in the asset.
    pub rest: Instance,
    /// Current pose relative to the parent.
    pub local: Instance,
    /// Pose relative to the scene root; refreshed by `update_world_transforms`.
    pub world: Instance,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

impl SceneNode {
    pub fn new(name: Option<String>, rest: Instance) -> Self {
        Self {
            name,
            rest,
            local: rest,
            world: rest,
            mesh: None,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialDesc>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: SceneNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_child(&mut self, parent: usize, child: usize) {
        match self.nodes.get_mut(parent) {
            Some(node) => node.children.push(child),
            None => warn!("You tried to attach node {} to missing parent {}.", child, parent),
        }
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
    }

    /// Indices of all nodes reachable from the roots, parents before children.
    pub fn traverse(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            match visited.get_mut(idx) {
                Some(seen) if !*seen => *seen = true,
                Some(_) => {
                    warn!(
                        "Node {} is reachable more than once and is only visited the first time.",
                        idx
                    );
                    continue;
                }
                None => {
                    warn!("Node {} is referenced but does not exist.", idx);
                    continue;
                }
            }
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        order
    }

    /// Reachable nodes that carry a mesh.
    pub fn mesh_nodes(&self) -> Vec<usize> {
        self.traverse()
            .into_iter()
            .filter(|&idx| {
                self.nodes[idx]
                    .mesh
                    .is_some_and(|mesh| mesh < self.meshes.len())
            })
            .collect()
    }

    /// Recomputes every reachable node's world transform from its local one.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(usize, Instance)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Instance::default()))
            .collect();
        let mut visited = vec![false; self.nodes.len()];
        while let Some((idx, parent)) = stack.pop() {
            let Some(seen) = visited.get_mut(idx) else {
                continue;
            };
            if *seen {
                continue;
            }
            *seen = true;
            let node = &mut self.nodes[idx];
            node.world = &parent * &node.local;
            let world = node.world;
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
    }

    /// Puts every material used by a reachable mesh node into cutout mode.
    ///
    /// Returns the number of materials changed.
    pub fn make_materials_cutout(&mut self, alpha_cutoff: f32) -> usize {
        let mut used = vec![false; self.materials.len()];
        for idx in self.mesh_nodes() {
            if let Some(mesh) = self.nodes[idx].mesh.and_then(|m| self.meshes.get(m)) {
                for primitive in &mesh.primitives {
                    if let Some(flag) = used.get_mut(primitive.material) {
                        *flag = true;
                    }
                }
            }
        }
        let mut changed = 0;
        for (material, _) in self
            .materials
            .iter_mut()
            .zip(used)
            .filter(|(_, used)| *used)
        {
            material.make_cutout(alpha_cutoff);
            changed += 1;
        }
        changed
    }

    /// World-space bounds of all reachable geometry in its current pose.
    ///
    /// World transforms are derived on the fly, so this does not depend on
    /// `update_world_transforms` having run.
    pub fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        let mut stack: Vec<(usize, Instance)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Instance::default()))
            .collect();
        let mut visited = vec![false; self.nodes.len()];
        while let Some((idx, parent)) = stack.pop() {
            let Some(seen) = visited.get_mut(idx) else {
                continue;
            };
            if *seen {
                continue;
            }
            *seen = true;
            let node = &self.nodes[idx];
            let world = &parent * &node.local;
            if let Some(mesh) = node.mesh.and_then(|m| self.meshes.get(m)) {
                let matrix = world.to_matrix();
                for primitive in &mesh.primitives {
                    aabb.union(&primitive.bounds.transformed(&matrix));
                }
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
        aabb
    }
}
