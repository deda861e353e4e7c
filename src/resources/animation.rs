use crate::animation::{AnimationClip, Interpolation, Keyframes, Track};

/// Reads every animation of the document as a clip, in document order.
///
/// Only node translation, rotation and scale channels are kept. Cubic spline
/// samplers keep their key values and are interpolated linearly.
pub fn read_animations(document: &gltf::Document, buffers: &[Vec<u8>]) -> Vec<AnimationClip> {
    document
        .animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{}", animation.index()));
            let tracks = animation
                .channels()
                .filter_map(|channel| read_channel(&name, &channel, buffers))
                .collect();
            AnimationClip::new(name, tracks)
        })
        .collect()
}

fn read_channel(
    clip: &str,
    channel: &gltf::animation::Channel,
    buffers: &[Vec<u8>],
) -> Option<Track> {
    let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let node = channel.target().node().index();

    let Some(inputs) = reader.read_inputs() else {
        log::warn!("No key times found in channel {} of {}.", channel.index(), clip);
        return None;
    };
    let timestamps: Vec<f32> = inputs.collect();

    let (interpolation, cubic) = match channel.sampler().interpolation() {
        gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
        gltf::animation::Interpolation::Step => (Interpolation::Step, false),
        gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
    };

    let keyframes = match reader.read_outputs()? {
        gltf::animation::util::ReadOutputs::Translations(values) => {
            Keyframes::Translation(spline_values(values.map(Into::into).collect(), cubic))
        }
        gltf::animation::util::ReadOutputs::Rotations(values) => {
            Keyframes::Rotation(spline_values(values.into_f32().map(Into::into).collect(), cubic))
        }
        gltf::animation::util::ReadOutputs::Scales(values) => {
            Keyframes::Scale(spline_values(values.map(Into::into).collect(), cubic))
        }
        gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => {
            log::warn!(
                "Channel {} of {} animates morph target weights, which are not supported.",
                channel.index(),
                clip
            );
            return None;
        }
    };

    Some(Track::new(node, timestamps, keyframes, interpolation))
}

/// Cubic spline outputs store (in-tangent, value, out-tangent) per key; keep the values.
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|key| key[1]).collect()
    } else {
        values
    }
}
