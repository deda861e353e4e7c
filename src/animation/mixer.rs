//! Playback and blending of animation actions.
//!
//! Each frame the mixer advances every running action, samples its clip and
//! accumulates the samples per node property:
//!
//! - normal actions are blended by weight and, if their weights sum to less
//!   than one, blended towards the node's rest pose by the remainder
//! - additive actions are summed into a delta (starting at identity) which is
//!   then applied on top of the normal result

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::{InnerSpace, One, Quaternion, Vector3, Zero};

use crate::animation::{AnimationClip, BlendMode, Property, Value};
use crate::data_structures::scene_graph::SceneGraph;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once and stop at the end.
    Once,
    /// Wrap around at the end of the clip.
    #[default]
    Repeat,
}

/// Handle to an action owned by an [`AnimationMixer`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ActionId(usize);

/// Playback state of one clip.
#[derive(Clone, Debug)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,
    pub blend_mode: BlendMode,
    loop_mode: LoopMode,
    /// Number of plays; `None` repeats forever.
    repetitions: Option<u32>,
    pub enabled: bool,
    /// Keep the last frame instead of disabling the action when it finishes.
    pub clamp_when_finished: bool,
    pub time_scale: f32,
    weight: f32,
    time: f32,
    loop_count: u32,
    playing: bool,
    paused: bool,
}

impl AnimationAction {
    fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            blend_mode: clip.blend_mode,
            clip,
            loop_mode: LoopMode::Repeat,
            repetitions: None,
            enabled: true,
            clamp_when_finished: false,
            time_scale: 1.0,
            weight: 1.0,
            time: 0.0,
            loop_count: 0,
            playing: false,
            paused: false,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) -> &mut Self {
        self.time = time;
        self
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn repetitions(&self) -> Option<u32> {
        self.repetitions
    }

    pub fn set_loop(&mut self, mode: LoopMode, repetitions: Option<u32>) -> &mut Self {
        self.loop_mode = mode;
        self.repetitions = repetitions;
        self
    }

    /// Sets the weight, which also becomes the effective weight while enabled.
    pub fn set_effective_weight(&mut self, weight: f32) -> &mut Self {
        self.weight = weight;
        self
    }

    /// Weight the action contributes with; zero when disabled.
    pub fn effective_weight(&self) -> f32 {
        if self.enabled { self.weight } else { 0.0 }
    }

    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self.paused = false;
        self
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) -> &mut Self {
        self.playing = false;
        self.time = 0.0;
        self.loop_count = 0;
        self
    }

    pub fn pause(&mut self) -> &mut Self {
        self.paused = true;
        self
    }

    pub fn is_running(&self) -> bool {
        self.playing && self.enabled && !self.paused && self.time_scale != 0.0
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    fn advance(&mut self, dt: f32) {
        let delta = dt * self.time_scale;
        let duration = self.clip.duration;
        self.time += delta;

        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration || self.time < 0.0 {
                    self.time = self.time.clamp(0.0, duration);
                    self.finish();
                }
            }
            LoopMode::Repeat => {
                if self.time >= duration || self.time < 0.0 {
                    let loops = (self.time / duration).floor();
                    self.time -= duration * loops;
                    self.loop_count += loops.abs() as u32;
                    if self.repetitions.is_some_and(|reps| self.loop_count >= reps) {
                        self.time = if delta > 0.0 { duration } else { 0.0 };
                        self.finish();
                    }
                }
            }
        }
    }

    fn finish(&mut self) {
        if self.clamp_when_finished {
            self.paused = true;
        } else {
            self.enabled = false;
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Accumulator {
    normal: Option<Value>,
    normal_weight: f32,
    additive: Value,
    additive_weight: f32,
}

impl Accumulator {
    fn new(property: Property) -> Self {
        let additive = match property {
            Property::Rotation => Value::Rotation(Quaternion::one()),
            Property::Translation | Property::Scale => Value::Vector(Vector3::zero()),
        };
        Self {
            normal: None,
            normal_weight: 0.0,
            additive,
            additive_weight: 0.0,
        }
    }

    fn accumulate(&mut self, value: Value, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        match self.normal {
            None => {
                self.normal = Some(value);
                self.normal_weight = weight;
            }
            Some(current) => {
                self.normal_weight += weight;
                self.normal = Some(current.mix(value, weight / self.normal_weight));
            }
        }
    }

    fn accumulate_additive(&mut self, delta: Value, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        self.additive = match (self.additive, delta) {
            (Value::Vector(acc), Value::Vector(d)) => Value::Vector(acc + d * weight),
            (Value::Rotation(acc), Value::Rotation(d)) => {
                Value::Rotation(acc.slerp(acc * d, weight))
            }
            (acc, _) => acc,
        };
        self.additive_weight += weight;
    }

    fn resolve(&self, rest: Value) -> Value {
        let mut result = match self.normal {
            Some(normal) if self.normal_weight < 1.0 => normal.mix(rest, 1.0 - self.normal_weight),
            Some(normal) => normal,
            None => rest,
        };
        if self.additive_weight > 0.0 {
            result = match (result, self.additive) {
                (Value::Vector(v), Value::Vector(d)) => Value::Vector(v + d),
                (Value::Rotation(q), Value::Rotation(d)) => Value::Rotation(q * d),
                (v, _) => v,
            };
        }
        match result {
            Value::Rotation(q) => Value::Rotation(q.normalize()),
            v => v,
        }
    }
}

/// Owns actions and writes their blended result into a scene graph.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
    time: f32,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the action playing `clip`, creating it on first use.
    pub fn clip_action(&mut self, clip: Arc<AnimationClip>) -> ActionId {
        if let Some(idx) = self
            .actions
            .iter()
            .position(|action| Arc::ptr_eq(&action.clip, &clip))
        {
            return ActionId(idx);
        }
        self.actions.push(AnimationAction::new(clip));
        ActionId(self.actions.len() - 1)
    }

    pub fn action(&self, id: ActionId) -> Option<&AnimationAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut AnimationAction> {
        self.actions.get_mut(id.0)
    }

    pub fn actions(&self) -> impl Iterator<Item = (ActionId, &AnimationAction)> {
        self.actions
            .iter()
            .enumerate()
            .map(|(idx, action)| (ActionId(idx), action))
    }

    pub fn stop_all(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Total time the mixer has been advanced by.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances all running actions by `dt` seconds and poses `graph`.
    ///
    /// Only node properties animated by at least one contributing action are
    /// written; tracks addressing nodes the graph lacks are ignored.
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph) {
        self.time += dt;

        let mut accumulators: HashMap<(usize, Property), Accumulator> = HashMap::new();
        for action in self.actions.iter_mut().filter(|a| a.is_running()) {
            action.advance(dt);
            let weight = action.effective_weight();
            if weight <= 0.0 {
                continue;
            }
            for track in &action.clip.tracks {
                if track.node >= graph.nodes.len() {
                    continue;
                }
                let Some(value) = track.sample(action.time) else {
                    continue;
                };
                let acc = accumulators
                    .entry((track.node, track.property()))
                    .or_insert_with(|| Accumulator::new(track.property()));
                match action.blend_mode {
                    BlendMode::Normal => acc.accumulate(value, weight),
                    BlendMode::Additive => acc.accumulate_additive(value, weight),
                }
            }
        }

        for ((node, property), acc) in accumulators {
            let node = &mut graph.nodes[node];
            match (property, acc.resolve(rest_value(&node.rest, property))) {
                (Property::Translation, Value::Vector(v)) => node.local.position = v,
                (Property::Scale, Value::Vector(v)) => node.local.scale = v,
                (Property::Rotation, Value::Rotation(q)) => node.local.rotation = q,
                (property, value) => {
                    log::debug!("Ignoring {:?} value for {:?} track.", value, property)
                }
            }
        }
    }
}

fn rest_value(rest: &crate::data_structures::instance::Instance, property: Property) -> Value {
    match property {
        Property::Translation => Value::Vector(rest.position),
        Property::Rotation => Value::Rotation(rest.rotation),
        Property::Scale => Value::Vector(rest.scale),
    }
}
