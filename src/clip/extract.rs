use indexmap::IndexMap;
use tracing::debug;

use super::channel::bone_name_of;
use super::types::{BoneTrack, Clip, Curve};

/// Groups a flat list of action curves into a clip, one track per bone.
///
/// Tracks appear in the order their bone is first seen. Curves whose path
/// does not address a pose bone are dropped. Source skeleton and track
/// names are recorded as metadata and `bone_count` is set.
pub fn clip_from_curves(
    name: impl Into<String>,
    source_skeleton_name: impl Into<String>,
    source_track_name: impl Into<String>,
    frame_range: (f64, f64),
    curves: impl IntoIterator<Item = Curve>,
) -> Clip {
    let mut tracks: IndexMap<String, BoneTrack> = IndexMap::new();

    for curve in curves {
        let Some(bone_name) = bone_name_of(&curve.channel_path) else {
            debug!(channel_path = %curve.channel_path, "skipping non-bone channel");
            continue;
        };
        tracks
            .entry(bone_name.to_string())
            .or_insert_with(|| BoneTrack::new(bone_name))
            .curves
            .push(curve);
    }

    let (frame_start, frame_end) = frame_range;
    let mut clip = Clip::new(name, frame_start, frame_end);
    clip.source_skeleton_name = source_skeleton_name.into();
    clip.source_track_name = source_track_name.into();
    for track in tracks.into_values() {
        clip.push_track(track);
    }
    clip
}
