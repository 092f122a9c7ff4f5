//! Keyframe animation captured from a skeleton.

pub mod channel;
pub mod extract;
pub mod types;

pub use channel::{bone_channel_path, bone_name_of, rewrite_bone};
pub use extract::clip_from_curves;
pub use types::{
    BoneTrack, Clip, Curve, Extrapolation, HandleType, Interpolation, Keyframe, Modifier,
};
