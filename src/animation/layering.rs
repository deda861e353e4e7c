//! Plays all clips of an asset at once: the first clip as the base layer and
//! every further clip as an additive layer on top of it.

use std::sync::Arc;

use crate::animation::{
    ActionId, AnimationClip, AnimationMixer, BlendMode, DEFAULT_FPS, LoopMode, make_clip_additive,
};
use crate::config::AdditiveReference;

/// Starts one looping action per clip and returns their ids in clip order.
///
/// The first clip plays normally with weight 1. Every other clip is converted
/// to an additive clip (relative to frame 0 of the clip chosen by `reference`)
/// and also plays with weight 1. An empty clip list starts nothing.
pub fn layer_clips(
    mixer: &mut AnimationMixer,
    clips: &[AnimationClip],
    reference: AdditiveReference,
) -> Vec<ActionId> {
    let Some(base) = clips.first() else {
        return Vec::new();
    };

    let mut ids = Vec::with_capacity(clips.len());
    ids.push(start(mixer, Arc::new(base.clone()), BlendMode::Normal));

    for clip in &clips[1..] {
        let reference_clip = match reference {
            AdditiveReference::OwnFirstFrame => None,
            AdditiveReference::BaseClipFirstFrame => Some(base),
        };
        let additive = make_clip_additive(clip, 0, reference_clip, DEFAULT_FPS);
        ids.push(start(mixer, Arc::new(additive), BlendMode::Additive));
    }

    log::info!(
        "Playing {:?} as base layer with {} additive layer(s).",
        base.name,
        clips.len() - 1
    );
    ids
}

fn start(mixer: &mut AnimationMixer, clip: Arc<AnimationClip>, blend_mode: BlendMode) -> ActionId {
    let id = mixer.clip_action(clip);
    if let Some(action) = mixer.action_mut(id) {
        action.blend_mode = blend_mode;
        action.enabled = true;
        action
            .set_loop(LoopMode::Repeat, None)
            .set_effective_weight(1.0)
            .play();
    }
    id
}
