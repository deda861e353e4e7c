use std::{
    io::{BufReader, Cursor},
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use cgmath::{Quaternion, Vector3};

use crate::{
    animation::AnimationClip,
    data_structures::{
        instance::Instance,
        scene_graph::{MaterialDesc, SamplerDesc, SceneGraph, SceneNode},
    },
    resources::texture::{decode_image, load_binary, resolve_uri},
};

/**
 * This module contains all logic for loading the scene graph, materials and
 * animation clips of a glTF/GLB asset.
 */
pub mod animation;
pub mod mesh;
pub mod texture;

/// Everything read from an asset file.
#[derive(Clone, Debug, Default)]
pub struct LoadedAsset {
    pub graph: SceneGraph,
    /// Clips in document order.
    pub clips: Vec<AnimationClip>,
}

/// Reads and parses a `.glb` or `.gltf` file.
///
/// External buffers and images are resolved relative to the file's directory.
pub async fn load_asset(path: impl AsRef<Path>) -> anyhow::Result<LoadedAsset> {
    let path = path.as_ref();
    let bytes = load_binary(path).await?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_gltf(&bytes, base_dir)
        .await
        .with_context(|| format!("failed to load asset {}", path.display()))
}

/// Parses glTF data that has already been read into memory.
pub async fn parse_gltf(bytes: &[u8], base_dir: &Path) -> anyhow::Result<LoadedAsset> {
    let gltf = gltf::Gltf::from_reader(BufReader::new(Cursor::new(bytes)))
        .context("invalid glTF document")?;

    // Load buffers
    let buffer_loads = gltf.buffers().map(|buffer| {
        let blob = gltf.blob.as_deref();
        async move {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => blob
                    .map(<[u8]>::to_vec)
                    .context("buffer refers to a missing GLB binary chunk")?,
                gltf::buffer::Source::Uri(uri) => load_binary(resolve_uri(base_dir, uri)?).await?,
            };
            if data.len() < buffer.length() {
                anyhow::bail!(
                    "buffer {} holds {} bytes but declares {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                );
            }
            Ok::<_, anyhow::Error>(data)
        }
    });
    let buffers: Vec<Vec<u8>> = futures::future::try_join_all(buffer_loads).await?;

    // Load images
    let image_loads = gltf.images().map(|image| {
        let buffers = &buffers;
        async move {
            let decoded = match image.source() {
                gltf::image::Source::View { view, mime_type } => {
                    let start = view.offset();
                    let end = start + view.length();
                    match buffers.get(view.buffer().index()).and_then(|b| b.get(start..end)) {
                        Some(bytes) => decode_image(bytes, Some(mime_type)),
                        None => Err(anyhow::anyhow!("image buffer view is out of range")),
                    }
                }
                gltf::image::Source::Uri { uri, mime_type } => match resolve_uri(base_dir, uri) {
                    Ok(path) => match load_binary(path).await {
                        Ok(bytes) => decode_image(&bytes, mime_type),
                        Err(e) => Err(e),
                    },
                    Err(e) => Err(e),
                },
            };
            match decoded {
                Ok(img) => Some(Arc::new(img)),
                Err(e) => {
                    log::warn!(
                        "Image {} could not be loaded and is ignored: {:#}",
                        image.index(),
                        e
                    );
                    None
                }
            }
        }
    });
    let images: Vec<Option<Arc<image::RgbaImage>>> = futures::future::join_all(image_loads).await;

    // Load materials; the extra last one is used by primitives without a material
    let mut graph = SceneGraph::new();
    graph.materials = gltf
        .materials()
        .map(|material| read_material(&material, &images))
        .collect();
    let default_material = graph.materials.len();
    graph.materials.push(MaterialDesc::default());

    graph.meshes = gltf
        .meshes()
        .map(|mesh| mesh::read_mesh(&mesh, &buffers, default_material))
        .collect();

    // Nodes keep their document index
    for node in gltf.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let rest = Instance {
            position: Vector3::from(translation),
            rotation: Quaternion::from(rotation),
            scale: Vector3::from(scale),
        };
        let mut scene_node = SceneNode::new(node.name().map(str::to_string), rest);
        scene_node.mesh = node.mesh().map(|mesh| mesh.index());
        scene_node.children = node.children().map(|child| child.index()).collect();
        graph.add_node(scene_node);
    }

    let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
    match scene {
        Some(scene) => graph.roots = scene.nodes().map(|node| node.index()).collect(),
        None => log::warn!("The asset contains no scene; nothing will be drawn."),
    }
    graph.update_world_transforms();

    let clips = animation::read_animations(&gltf.document, &buffers);

    log::info!(
        "Loaded {} node(s), {} mesh(es), {} material(s) and {} clip(s).",
        graph.nodes.len(),
        graph.meshes.len(),
        graph.materials.len(),
        clips.len()
    );
    Ok(LoadedAsset { graph, clips })
}

fn read_material(
    material: &gltf::Material,
    images: &[Option<Arc<image::RgbaImage>>],
) -> MaterialDesc {
    let pbr = material.pbr_metallic_roughness();
    let base_color_texture = pbr
        .base_color_texture()
        .and_then(|info| images.get(info.texture().source().index()).cloned().flatten());
    if pbr.base_color_texture().is_some_and(|info| info.tex_coord() != 0) {
        log::warn!(
            "Material {:?} samples its base colour from a second UV set; the first one is used.",
            material.name()
        );
    }

    let sampler = pbr
        .base_color_texture()
        .map(|info| read_sampler(&info.texture().sampler()))
        .unwrap_or_default();

    let mut desc = MaterialDesc {
        name: material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0))),
        base_color: pbr.base_color_factor(),
        base_color_texture,
        sampler,
        double_sided: material.double_sided(),
        ..Default::default()
    };
    match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => {}
        gltf::material::AlphaMode::Mask => desc.alpha_test = material.alpha_cutoff().unwrap_or(0.5),
        gltf::material::AlphaMode::Blend => {
            desc.transparent = true;
            desc.depth_write = false;
        }
    }
    desc
}

/// Maps a glTF sampler to the base level filters and wrap modes; mipmap
/// variants of the minification filter keep only their base filter.
fn read_sampler(sampler: &gltf::texture::Sampler) -> SamplerDesc {
    use gltf::texture::{MagFilter, MinFilter, WrappingMode};

    let wrap = |mode| match mode {
        WrappingMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrappingMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrappingMode::Repeat => wgpu::AddressMode::Repeat,
    };
    let defaults = SamplerDesc::default();
    SamplerDesc {
        mag_filter: match sampler.mag_filter() {
            Some(MagFilter::Nearest) => wgpu::FilterMode::Nearest,
            Some(MagFilter::Linear) => wgpu::FilterMode::Linear,
            None => defaults.mag_filter,
        },
        min_filter: match sampler.min_filter() {
            Some(
                MinFilter::Nearest
                | MinFilter::NearestMipmapNearest
                | MinFilter::NearestMipmapLinear,
            ) => wgpu::FilterMode::Nearest,
            Some(_) => wgpu::FilterMode::Linear,
            None => defaults.min_filter,
        },
        address_mode_u: wrap(sampler.wrap_s()),
        address_mode_v: wrap(sampler.wrap_t()),
    }
}
