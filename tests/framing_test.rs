mod common;

use std::path::Path;

use cgmath::Point3;
use common::test_utils::{assert_close, sample_glb, static_glb};
use ortho_viewer::{
    ViewerConfig, ViewerState,
    data_structures::bounds::Aabb,
    resources::{LoadedAsset, parse_gltf},
    viewer::framing,
};

async fn loaded_state(glb: Vec<u8>) -> ViewerState {
    let asset = parse_gltf(&glb, Path::new("")).await.expect("valid asset");
    let mut state = ViewerState::new(ViewerConfig::default(), 800, 600);
    state.on_load_result(Ok(asset));
    state
}

fn assert_point_close(actual: Point3<f32>, expected: [f32; 3]) {
    assert_close(actual.x, expected[0]);
    assert_close(actual.y, expected[1]);
    assert_close(actual.z, expected[2]);
}

#[test]
fn framing_centers_on_the_box_and_backs_off_by_the_margin() {
    let bounds = Aabb::new(Point3::new(-1.0, 0.0, -2.0), Point3::new(3.0, 1.0, 0.0));
    let (center, position) = framing(&bounds, 1.2);

    assert_point_close(center, [1.0, 0.5, -1.0]);
    assert_point_close(position, [1.0, 0.5, -1.0 + 4.0 * 1.2]);
}

#[test]
fn empty_bounds_frame_the_origin() {
    let (center, position) = framing(&Aabb::empty(), 1.2);
    assert_point_close(center, [0.0, 0.0, 0.0]);
    assert_point_close(position, [0.0, 0.0, 0.0]);
}

#[tokio::test]
async fn camera_is_framed_on_the_loaded_asset() {
    let state = loaded_state(sample_glb()).await;
    let scene = state.loaded().expect("scene should be loaded");

    let bounds = scene.graph.bounding_box();
    assert_point_close(bounds.min, [1.0, 0.0, 0.0]);
    assert_point_close(bounds.max, [3.0, 2.0, 0.0]);

    assert_point_close(state.controls.target, [2.0, 1.0, 0.0]);
    assert_point_close(state.camera.target, [2.0, 1.0, 0.0]);
    assert_point_close(state.camera.position, [2.0, 1.0, 2.4]);
}

#[tokio::test]
async fn asset_without_clips_is_framed_and_idle() {
    let mut state = loaded_state(static_glb()).await;
    {
        let scene = state.loaded().expect("scene should be loaded");
        assert_eq!(scene.mixer.actions().count(), 0);
    }
    // triangle spans 2 x 2, camera sits 2 * 1.2 in front of its center
    assert_point_close(state.controls.target, [0.0, 0.0, 0.0]);
    assert_point_close(state.camera.position, [0.0, 0.0, 2.4]);

    for _ in 0..10 {
        state.advance(1.0 / 60.0);
    }
    let scene = state.loaded().expect("scene should stay loaded");
    assert_eq!(scene.graph.nodes[0].local, scene.graph.nodes[0].rest);
}

#[tokio::test]
async fn blended_materials_are_switched_to_cutout() {
    let state = loaded_state(sample_glb()).await;
    let scene = state.loaded().expect("scene should be loaded");

    let leaves = &scene.graph.materials[0];
    assert_eq!(leaves.name, "leaves");
    assert!(!leaves.transparent);
    assert_close(leaves.alpha_test, 0.5);
    assert!(leaves.depth_write);
    assert!(leaves.depth_test);
    // sidedness is untouched by the conversion
    assert!(leaves.double_sided);
}

#[tokio::test]
async fn unused_materials_are_not_converted() {
    let mut asset: LoadedAsset =
        parse_gltf(&sample_glb(), Path::new("")).await.expect("valid asset");
    // detach the mesh so no node references the material
    asset.graph.nodes[1].mesh = None;
    let mut state = ViewerState::new(ViewerConfig::default(), 800, 600);
    state.on_load_result(Ok(asset));

    let scene = state.loaded().expect("scene should be loaded");
    assert!(scene.graph.materials[0].transparent);
    assert!(!scene.graph.materials[0].depth_write);
}

#[tokio::test]
async fn animation_moves_the_asset_after_framing() {
    let mut state = loaded_state(sample_glb()).await;
    let framed = state.camera.position;

    state.advance(0.5);

    let scene = state.loaded().expect("scene should be loaded");
    // idle moves the leaf to (0, 0.5, 0) relative to the root
    let leaf = &scene.graph.nodes[1];
    assert_close(leaf.local.position.y, 0.5);
    assert_close(leaf.world.position.x, 1.0);
    assert_close(leaf.world.position.y, 0.5);
    // framing is not repeated per frame
    assert_point_close(state.camera.position, [framed.x, framed.y, framed.z]);
}
