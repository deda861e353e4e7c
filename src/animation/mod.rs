//! Keyframe animation: clips, sampling, additive conversion and mixing.
//!
//! A clip is a set of tracks; every track animates one property (translation,
//! rotation or scale) of one scene graph node. Clips are played through
//! actions owned by an [`AnimationMixer`], which blends all running actions
//! into the node poses every frame.

pub mod additive;
pub mod layering;
pub mod mixer;

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

pub use additive::{DEFAULT_FPS, make_clip_additive};
pub use layering::layer_clips;
pub use mixer::{ActionId, AnimationAction, AnimationMixer, LoopMode};

/// The node property a track writes to.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Property {
    Translation,
    Rotation,
    Scale,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
}

impl Keyframes {
    pub fn property(&self) -> Property {
        match self {
            Keyframes::Translation(_) => Property::Translation,
            Keyframes::Rotation(_) => Property::Rotation,
            Keyframes::Scale(_) => Property::Scale,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Keyframes::Translation(v) | Keyframes::Scale(v) => v.len(),
            Keyframes::Rotation(q) => q.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Keyframes::Translation(v) | Keyframes::Scale(v) => v.truncate(len),
            Keyframes::Rotation(q) => q.truncate(len),
        }
    }

    fn get(&self, idx: usize) -> Option<Value> {
        match self {
            Keyframes::Translation(v) | Keyframes::Scale(v) => {
                v.get(idx).copied().map(Value::Vector)
            }
            Keyframes::Rotation(q) => q.get(idx).copied().map(Value::Rotation),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// A sampled property value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Vector(Vector3<f32>),
    Rotation(Quaternion<f32>),
}

impl Value {
    /// Interpolates towards `other`; rotations use the shortest arc.
    ///
    /// Mismatched kinds return `self` unchanged.
    pub fn mix(self, other: Value, t: f32) -> Value {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => Value::Vector(a.lerp(b, t)),
            (Value::Rotation(a), Value::Rotation(b)) => Value::Rotation(a.slerp(b, t)),
            _ => self,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub node: usize,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

impl Track {
    /// Builds a track, dropping keys that have no matching timestamp (or vice versa).
    pub fn new(
        node: usize,
        mut timestamps: Vec<f32>,
        mut keyframes: Keyframes,
        interpolation: Interpolation,
    ) -> Self {
        let len = timestamps.len().min(keyframes.len());
        if timestamps.len() != keyframes.len() {
            log::warn!(
                "Track for node {} has {} timestamps but {} keyframes; keeping the first {}.",
                node,
                timestamps.len(),
                keyframes.len(),
                len
            );
        }
        timestamps.truncate(len);
        keyframes.truncate(len);
        Self {
            node,
            timestamps,
            keyframes,
            interpolation,
        }
    }

    pub fn property(&self) -> Property {
        self.keyframes.property()
    }

    /// Time of the last key, or zero for an empty track.
    pub fn end_time(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Samples the track at `time`; clamps to the first/last key outside the key range.
    pub fn sample(&self, time: f32) -> Option<Value> {
        let first = *self.timestamps.first()?;
        let last = self.end_time();
        if time <= first {
            return self.keyframes.get(0);
        }
        if time >= last {
            return self.keyframes.get(self.timestamps.len() - 1);
        }
        // first index with timestamp > time; at least 1 and at most len - 1 here
        let next = self.timestamps.partition_point(|&t| t <= time);
        let prev = next - 1;
        let a = self.keyframes.get(prev)?;
        match self.interpolation {
            Interpolation::Step => Some(a),
            Interpolation::Linear => {
                let b = self.keyframes.get(next)?;
                let span = self.timestamps[next] - self.timestamps[prev];
                let t = if span > 0.0 {
                    (time - self.timestamps[prev]) / span
                } else {
                    0.0
                };
                Some(match a.mix(b, t) {
                    Value::Rotation(q) => Value::Rotation(q.normalize()),
                    v => v,
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// The action's pose replaces (weighted) the current pose.
    #[default]
    Normal,
    /// The action's pose is a delta added on top of the current pose.
    Additive,
}

/// A named animation: tracks plus the blend mode actions default to.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
    pub blend_mode: BlendMode,
}

impl AnimationClip {
    /// Creates a normal clip whose duration is the last key time over all tracks.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::end_time).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn find_track(&self, node: usize, property: Property) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|track| track.node == node && track.property() == property)
    }
}
