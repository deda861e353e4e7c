use crate::data_structures::{
    model::ModelVertex,
    scene_graph::{MeshData, Primitive},
};

/// Reads the triangle primitives of a glTF mesh.
///
/// Primitives without a material use `default_material`. Primitives that are
/// not triangle lists or have no positions are skipped with a warning.
pub fn read_mesh(mesh: &gltf::Mesh, buffers: &[Vec<u8>], default_material: usize) -> MeshData {
    let name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Primitive {} of mesh {} uses {:?}; only triangle lists are drawn.",
                primitive.index(),
                name,
                primitive.mode()
            );
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let Some(positions) = reader.read_positions() else {
            log::warn!("Primitive {} of mesh {} has no positions.", primitive.index(), name);
            continue;
        };
        let mut vertices: Vec<ModelVertex> = positions
            .map(|position| ModelVertex {
                position,
                tex_coords: Default::default(),
                normal: Default::default(),
            })
            .collect();
        if let Some(normals) = reader.read_normals() {
            for (vertex, normal) in vertices.iter_mut().zip(normals) {
                vertex.normal = normal;
            }
        }
        if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
            for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
                vertex.tex_coords = tex_coord;
            }
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            log::warn!(
                "Primitive {} of mesh {} references vertex {} of {}; skipping it.",
                primitive.index(),
                name,
                bad,
                vertices.len()
            );
            continue;
        }

        let material = primitive.material().index().unwrap_or(default_material);
        primitives.push(Primitive::new(vertices, indices, material));
    }

    MeshData { name, primitives }
}
