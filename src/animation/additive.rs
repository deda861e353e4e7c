//! Conversion of absolute clips into additive delta clips.

use cgmath::{InnerSpace, Quaternion};

use crate::animation::{AnimationClip, BlendMode, Keyframes, Track, Value};

/// Frame rate used to turn a reference frame number into a time.
pub const DEFAULT_FPS: f32 = 30.0;

/// Returns an additive copy of `clip`.
///
/// Every track is re-expressed relative to the value the matching track of
/// `reference` has at `reference_frame`. Translations and scales become
/// `value - reference`, rotations become `conj(reference) * value`. Without an
/// explicit reference clip the clip is made relative to itself.
///
/// Tracks without a counterpart (same node and property) in the reference clip
/// are kept unchanged.
pub fn make_clip_additive(
    clip: &AnimationClip,
    reference_frame: u32,
    reference: Option<&AnimationClip>,
    fps: f32,
) -> AnimationClip {
    let reference = reference.unwrap_or(clip);
    let reference_time = if fps > 0.0 {
        reference_frame as f32 / fps
    } else {
        0.0
    };

    let tracks = clip
        .tracks
        .iter()
        .map(|track| {
            let base = reference
                .find_track(track.node, track.property())
                .and_then(|base| base.sample(reference_time));
            match base {
                Some(base) => subtract(track, base),
                None => {
                    log::debug!(
                        "Clip {:?}: no reference for the {:?} track of node {}.",
                        clip.name,
                        track.property(),
                        track.node
                    );
                    track.clone()
                }
            }
        })
        .collect();

    AnimationClip {
        name: clip.name.clone(),
        duration: clip.duration,
        tracks,
        blend_mode: BlendMode::Additive,
    }
}

fn subtract(track: &Track, base: Value) -> Track {
    let keyframes = match (&track.keyframes, base) {
        (Keyframes::Translation(values), Value::Vector(base)) => {
            Keyframes::Translation(values.iter().map(|v| *v - base).collect())
        }
        (Keyframes::Scale(values), Value::Vector(base)) => {
            Keyframes::Scale(values.iter().map(|v| *v - base).collect())
        }
        (Keyframes::Rotation(values), Value::Rotation(base)) => {
            let inverse: Quaternion<f32> = base.normalize().conjugate();
            Keyframes::Rotation(values.iter().map(|q| inverse * *q).collect())
        }
        (keyframes, _) => keyframes.clone(),
    };
    Track {
        node: track.node,
        timestamps: track.timestamps.clone(),
        keyframes,
        interpolation: track.interpolation,
    }
}
