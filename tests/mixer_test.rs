mod common;

use std::sync::Arc;

use cgmath::{Quaternion, Vector3};
use common::test_utils::{
    assert_close, assert_quat_close, assert_vec_close, clip, rotation_track, translation_track,
    z_rotation,
};
use ortho_viewer::{
    AdditiveReference,
    animation::{
        ActionId, AnimationClip, AnimationMixer, BlendMode, DEFAULT_FPS, LoopMode, layer_clips,
        make_clip_additive,
    },
    data_structures::{
        instance::Instance,
        scene_graph::{SceneGraph, SceneNode},
    },
};

fn graph_at(rest: [f32; 3]) -> SceneGraph {
    let mut graph = SceneGraph::new();
    let idx = graph.add_node(SceneNode::new(None, Instance::from(Vector3::from(rest))));
    graph.roots.push(idx);
    graph
}

fn constant(name: &str, value: [f32; 3]) -> AnimationClip {
    AnimationClip::new(name, vec![translation_track(0, &[0.0, 1.0], &[value, value])])
}

fn play(mixer: &mut AnimationMixer, clip: AnimationClip, weight: f32) -> ActionId {
    let id = mixer.clip_action(Arc::new(clip));
    mixer
        .action_mut(id)
        .expect("action exists")
        .set_effective_weight(weight)
        .play();
    id
}

#[test]
fn additive_layer_alone_offsets_the_rest_pose() {
    let mut graph = graph_at([3.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let additive = make_clip_additive(&clip("walk", 0), 0, None, DEFAULT_FPS);
    let id = play(&mut mixer, additive, 1.0);
    mixer.action_mut(id).expect("action exists").blend_mode = BlendMode::Additive;

    mixer.update(0.5, &mut graph);

    assert_vec_close(graph.nodes[0].local.position, [3.5, 0.0, 0.0]);
}

#[test]
fn base_and_additive_layers_compose() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let base = AnimationClip::new(
        "base",
        vec![
            translation_track(0, &[0.0, 1.0], &[[2.0, 0.0, 0.0], [2.0, 0.0, 0.0]]),
            rotation_track(0, &[0.0, 1.0], &[z_rotation(30.0), z_rotation(30.0)]),
        ],
    );
    let layer = AnimationClip::new(
        "layer",
        vec![
            translation_track(0, &[0.0, 1.0], &[[5.0, 0.0, 0.0], [6.0, 0.0, 0.0]]),
            rotation_track(0, &[0.0, 1.0], &[z_rotation(10.0), z_rotation(50.0)]),
        ],
    );
    layer_clips(&mut mixer, &[base, layer], AdditiveReference::OwnFirstFrame);

    mixer.update(0.5, &mut graph);

    let node = &graph.nodes[0];
    assert_vec_close(node.local.position, [2.5, 0.0, 0.0]);
    // 30 degrees from the base plus half of the layer's 40 degree swing
    assert_quat_close(node.local.rotation, z_rotation(50.0));
}

#[test]
fn repeating_action_wraps_around_the_clip_duration() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let id = play(&mut mixer, clip("walk", 0), 1.0);

    mixer.update(1.25, &mut graph);

    let action = mixer.action(id).expect("action exists");
    assert_close(action.time(), 0.25);
    assert_eq!(action.loop_count(), 1);
    assert!(action.is_running());
    assert_vec_close(graph.nodes[0].local.position, [0.25, 0.0, 0.0]);
}

#[test]
fn once_action_disables_itself_at_the_end() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let id = play(&mut mixer, clip("walk", 0), 1.0);
    mixer
        .action_mut(id)
        .expect("action exists")
        .set_loop(LoopMode::Once, None);

    mixer.update(2.0, &mut graph);

    let action = mixer.action(id).expect("action exists");
    assert!(!action.is_running());
    assert_close(action.effective_weight(), 0.0);
}

#[test]
fn clamped_once_action_holds_the_last_frame() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let id = play(&mut mixer, clip("walk", 0), 1.0);
    let action = mixer.action_mut(id).expect("action exists");
    action.set_loop(LoopMode::Once, None);
    action.clamp_when_finished = true;

    mixer.update(2.0, &mut graph);

    let action = mixer.action(id).expect("action exists");
    assert_close(action.time(), 1.0);
    assert_close(action.effective_weight(), 1.0);
    assert_vec_close(graph.nodes[0].local.position, [1.0, 0.0, 0.0]);
}

#[test]
fn partial_weight_blends_towards_rest_pose() {
    let mut graph = graph_at([4.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    play(&mut mixer, constant("still", [0.0, 0.0, 0.0]), 0.25);

    mixer.update(0.1, &mut graph);

    assert_vec_close(graph.nodes[0].local.position, [3.0, 0.0, 0.0]);
}

#[test]
fn normal_actions_are_averaged_by_weight() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    play(&mut mixer, constant("left", [2.0, 0.0, 0.0]), 1.0);
    play(&mut mixer, constant("right", [4.0, 0.0, 0.0]), 1.0);

    mixer.update(0.1, &mut graph);

    assert_vec_close(graph.nodes[0].local.position, [3.0, 0.0, 0.0]);
}

#[test]
fn unanimated_properties_and_missing_nodes_are_left_alone() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let tilt = Quaternion::from(z_rotation(20.0));
    graph.nodes[0].local.rotation = tilt;
    let mut mixer = AnimationMixer::new();
    let stray = AnimationClip::new(
        "stray",
        vec![
            translation_track(0, &[0.0, 1.0], &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            translation_track(7, &[0.0, 1.0], &[[9.0, 9.0, 9.0], [9.0, 9.0, 9.0]]),
        ],
    );
    play(&mut mixer, stray, 1.0);

    mixer.update(0.5, &mut graph);

    assert_eq!(graph.nodes.len(), 1);
    assert_vec_close(graph.nodes[0].local.position, [0.5, 0.0, 0.0]);
    assert_eq!(graph.nodes[0].local.rotation, tilt);
}

#[test]
fn same_clip_reuses_its_action() {
    let mut mixer = AnimationMixer::new();
    let shared = Arc::new(clip("walk", 0));
    let first = mixer.clip_action(shared.clone());
    let second = mixer.clip_action(shared);
    let other = mixer.clip_action(Arc::new(clip("walk", 0)));

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(mixer.actions().count(), 2);
}

#[test]
fn stopped_actions_rewind_and_stop_contributing() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let id = play(&mut mixer, clip("walk", 0), 1.0);
    mixer.update(0.5, &mut graph);

    mixer.stop_all();
    graph.nodes[0].local.position = Vector3::new(9.0, 0.0, 0.0);
    mixer.update(0.25, &mut graph);

    let action = mixer.action(id).expect("action exists");
    assert_close(action.time(), 0.0);
    assert!(!action.is_running());
    assert_vec_close(graph.nodes[0].local.position, [9.0, 0.0, 0.0]);
    assert_close(mixer.time(), 0.75);
}

#[test]
fn seeking_moves_the_playhead() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let id = play(&mut mixer, clip("walk", 0), 1.0);

    mixer.action_mut(id).expect("action exists").set_time(0.25);
    mixer.update(0.25, &mut graph);

    assert_close(mixer.action(id).expect("action exists").time(), 0.5);
    assert_vec_close(graph.nodes[0].local.position, [0.5, 0.0, 0.0]);
}

#[test]
fn paused_actions_hold_their_pose_until_resumed() {
    let mut graph = graph_at([0.0, 0.0, 0.0]);
    let mut mixer = AnimationMixer::new();
    let id = play(&mut mixer, clip("walk", 0), 1.0);
    mixer.update(0.25, &mut graph);

    mixer.action_mut(id).expect("action exists").pause();
    mixer.update(0.5, &mut graph);
    let action = mixer.action(id).expect("action exists");
    assert!(!action.is_running());
    assert_close(action.time(), 0.25);
    assert_vec_close(graph.nodes[0].local.position, [0.25, 0.0, 0.0]);

    mixer.action_mut(id).expect("action exists").play();
    mixer.update(0.25, &mut graph);
    assert_vec_close(graph.nodes[0].local.position, [0.5, 0.0, 0.0]);
}
