mod common;

use cgmath::{Deg, Point3, Quaternion, Rotation3, Vector3};
use common::test_utils::{assert_close, assert_vec_close};
use ortho_viewer::data_structures::{
    bounds::Aabb,
    instance::Instance,
    model::ModelVertex,
    scene_graph::{MaterialDesc, MeshData, Primitive, SceneGraph, SceneNode},
};

fn vertex(position: [f32; 3]) -> ModelVertex {
    ModelVertex {
        position,
        ..Default::default()
    }
}

fn unit_square(material: usize) -> MeshData {
    MeshData {
        name: "square".to_string(),
        primitives: vec![Primitive::new(
            vec![
                vertex([0.0, 0.0, 0.0]),
                vertex([1.0, 0.0, 0.0]),
                vertex([1.0, 1.0, 0.0]),
                vertex([0.0, 1.0, 0.0]),
            ],
            vec![0, 1, 2, 0, 2, 3],
            material,
        )],
    }
}

#[test]
fn world_transforms_compose_parent_first() {
    let mut graph = SceneGraph::new();
    let parent = graph.add_node(SceneNode::new(
        Some("parent".into()),
        Instance {
            position: Vector3::new(0.0, 2.0, 0.0),
            rotation: Quaternion::from_angle_z(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        },
    ));
    let child = graph.add_node(SceneNode::new(
        Some("child".into()),
        Instance::from(Vector3::new(1.0, 0.0, 0.0)),
    ));
    graph.add_child(parent, child);
    graph.roots.push(parent);

    graph.update_world_transforms();

    // (1, 0, 0) scaled by 2 and turned a quarter around z lands on (0, 2, 0)
    assert_vec_close(graph.nodes[child].world.position, [0.0, 4.0, 0.0]);
    assert_vec_close(graph.nodes[child].world.scale, [2.0, 2.0, 2.0]);
    assert_eq!(graph.traverse(), [parent, child]);
}

#[test]
fn bounds_cover_transformed_geometry_only_of_reachable_nodes() {
    let mut graph = SceneGraph::new();
    graph.meshes.push(unit_square(0));
    graph.materials.push(MaterialDesc::default());

    let mut shown = SceneNode::new(None, Instance::from(Vector3::new(2.0, 0.0, 0.0)));
    shown.mesh = Some(0);
    let shown = graph.add_node(shown);
    let mut hidden = SceneNode::new(None, Instance::from(Vector3::new(50.0, 0.0, 0.0)));
    hidden.mesh = Some(0);
    graph.add_node(hidden);
    graph.roots.push(shown);

    let bounds = graph.bounding_box();
    assert_eq!(bounds, Aabb::new(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 0.0)));
    assert_eq!(graph.mesh_nodes(), [shown]);
}

#[test]
fn mirrored_nodes_keep_a_valid_box() {
    let mut graph = SceneGraph::new();
    graph.meshes.push(unit_square(0));
    let mut node = SceneNode::new(
        None,
        Instance {
            scale: Vector3::new(-1.0, 1.0, 1.0),
            ..Default::default()
        },
    );
    node.mesh = Some(0);
    let idx = graph.add_node(node);
    graph.roots.push(idx);

    let bounds = graph.bounding_box();
    assert_close(bounds.min.x, -1.0);
    assert_close(bounds.max.x, 0.0);
    assert!(!bounds.is_empty());
}

#[test]
fn repeated_and_dangling_references_are_skipped() {
    let mut graph = SceneGraph::new();
    let a = graph.add_node(SceneNode::new(Some("a".into()), Instance::new()));
    let b = graph.add_node(SceneNode::new(Some("b".into()), Instance::new()));
    graph.add_child(a, b);
    graph.add_child(b, a);
    graph.add_child(b, 42);
    graph.add_child(42, a);
    graph.roots.push(a);

    assert_eq!(graph.traverse(), [a, b]);
    graph.update_world_transforms();
    assert!(graph.bounding_box().is_empty());
}

#[test]
fn cutout_touches_materials_of_reachable_meshes() {
    let mut graph = SceneGraph::new();
    let blended = MaterialDesc {
        name: "glass".into(),
        transparent: true,
        depth_write: false,
        ..Default::default()
    };
    graph.materials = vec![blended.clone(), blended];
    graph.meshes = vec![unit_square(0), unit_square(1)];

    let mut used = SceneNode::new(None, Instance::new());
    used.mesh = Some(0);
    let used = graph.add_node(used);
    let mut orphan = SceneNode::new(None, Instance::new());
    orphan.mesh = Some(1);
    graph.add_node(orphan);
    graph.roots.push(used);

    assert_eq!(graph.make_materials_cutout(0.5), 1);
    assert!(!graph.materials[0].transparent);
    assert!(graph.materials[0].depth_write);
    assert_close(graph.materials[0].alpha_test, 0.5);
    assert!(graph.materials[1].transparent);
}
