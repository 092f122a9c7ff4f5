use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::format::SCHEMA_VERSION;

// ─── Keyframes ────────────────────────────────────────────────────────────────

/// Interpolation mode from a keyframe to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interpolation {
    Constant,
    Linear,
    #[default]
    Bezier,
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
    Expo,
    Circ,
    Back,
    Bounce,
    Elastic,
}

/// How a Bézier handle is constrained relative to its keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandleType {
    Free,
    Aligned,
    Vector,
    #[default]
    Auto,
    AutoClamped,
}

/// Curve behaviour outside its first and last keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Extrapolation {
    #[default]
    Constant,
    Linear,
}

/// A sampled point with its tangent handles. Handles are `(frame, value)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: f64,
    pub value: f64,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub handle_left: (f64, f64),
    #[serde(default)]
    pub handle_right: (f64, f64),
    #[serde(default)]
    pub handle_left_type: HandleType,
    #[serde(default)]
    pub handle_right_type: HandleType,
}

impl Keyframe {
    /// Keyframe with default interpolation and zeroed `AUTO` handles.
    pub fn new(frame: f64, value: f64) -> Self {
        Self {
            frame,
            value,
            interpolation: Interpolation::default(),
            handle_left: (0.0, 0.0),
            handle_right: (0.0, 0.0),
            handle_left_type: HandleType::default(),
            handle_right_type: HandleType::default(),
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_handles(mut self, left: (f64, f64), right: (f64, f64)) -> Self {
        self.handle_left = left;
        self.handle_right = right;
        self
    }
}

// ─── Curves ───────────────────────────────────────────────────────────────────

/// Curve modifier reference. Only its kind and mute state are carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "mute", default)]
    pub muted: bool,
}

/// One animated scalar channel of a bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// `pose.bones["<bone>"].<property>`
    #[serde(rename = "data_path")]
    pub channel_path: String,
    /// Component of a vector property, `0` for X.
    #[serde(rename = "array_index")]
    pub component_index: i32,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub extrapolation: Extrapolation,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl Curve {
    pub fn new(channel_path: impl Into<String>, component_index: i32) -> Self {
        Self {
            channel_path: channel_path.into(),
            component_index,
            keyframes: Vec::new(),
            extrapolation: Extrapolation::default(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_keyframes(mut self, keyframes: Vec<Keyframe>) -> Self {
        self.keyframes = keyframes;
        self
    }

    /// `(channel_path, component_index)` identity of the curve.
    pub fn key(&self) -> (&str, i32) {
        (&self.channel_path, self.component_index)
    }
}

/// All curves recorded for a single bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    pub bone_name: String,
    #[serde(rename = "fcurves", default)]
    pub curves: Vec<Curve>,
}

impl BoneTrack {
    pub fn new(bone_name: impl Into<String>) -> Self {
        Self {
            bone_name: bone_name.into(),
            curves: Vec::new(),
        }
    }

    pub fn keyframe_count(&self) -> usize {
        self.curves.iter().map(|curve| curve.keyframes.len()).sum()
    }
}

// ─── Clip ─────────────────────────────────────────────────────────────────────

fn default_frame_start() -> f64 {
    1.0
}

fn default_frame_end() -> f64 {
    250.0
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Captured animation of one skeleton's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_frame_start")]
    pub frame_start: f64,
    #[serde(default = "default_frame_end")]
    pub frame_end: f64,
    #[serde(default)]
    pub bones: Vec<BoneTrack>,
    #[serde(rename = "source_armature", default)]
    pub source_skeleton_name: String,
    #[serde(rename = "source_action", default)]
    pub source_track_name: String,
    #[serde(default)]
    pub bone_count: usize,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Clip {
    pub fn new(name: impl Into<String>, frame_start: f64, frame_end: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            frame_start,
            frame_end,
            bones: Vec::new(),
            source_skeleton_name: String::new(),
            source_track_name: String::new(),
            bone_count: 0,
            version: default_version(),
        }
    }

    /// Appends a track and keeps `bone_count` in sync.
    pub fn push_track(&mut self, track: BoneTrack) {
        self.bones.push(track);
        self.bone_count = self.bones.len();
    }

    pub fn track(&self, bone_name: &str) -> Option<&BoneTrack> {
        self.bones.iter().find(|track| track.bone_name == bone_name)
    }

    pub fn bone_names(&self) -> Vec<&str> {
        self.bones.iter().map(|track| track.bone_name.as_str()).collect()
    }

    pub fn curve_count(&self) -> usize {
        self.bones.iter().map(|track| track.curves.len()).sum()
    }

    pub fn duration(&self) -> f64 {
        self.frame_end - self.frame_start
    }

    /// Structural checks performed before a clip is retargeted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName("clip"));
        }
        if self.bones.is_empty() {
            return Err(ValidationError::NoBones);
        }
        if !self.frame_start.is_finite()
            || !self.frame_end.is_finite()
            || self.frame_end <= self.frame_start
        {
            return Err(ValidationError::InvalidFrameRange {
                start: self.frame_start,
                end: self.frame_end,
            });
        }
        if self.bones.iter().all(|track| track.curves.is_empty()) {
            return Err(ValidationError::NoCurves);
        }

        for track in &self.bones {
            if track.bone_name.trim().is_empty() {
                return Err(ValidationError::EmptyBoneName("clip"));
            }
            let mut seen = HashSet::new();
            for curve in &track.curves {
                if !seen.insert(curve.key()) {
                    return Err(ValidationError::DuplicateCurve {
                        bone: track.bone_name.clone(),
                        channel_path: curve.channel_path.clone(),
                        component_index: curve.component_index,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn walk_clip() -> Clip {
        let mut clip = Clip::new("walk", 1.0, 24.0);
        let mut hips = BoneTrack::new("Hips");
        hips.curves.push(
            Curve::new(r#"pose.bones["Hips"].location"#, 0)
                .with_keyframes(vec![Keyframe::new(1.0, 0.0), Keyframe::new(24.0, 1.5)]),
        );
        clip.push_track(hips);
        clip
    }

    #[test]
    fn given_well_formed_clip_when_validating_then_it_passes() {
        let clip = walk_clip();
        assert_eq!(clip.bone_count, 1);
        assert_eq!(clip.curve_count(), 1);
        assert_eq!(clip.validate(), Ok(()));
    }

    #[test]
    fn given_reversed_frame_range_when_validating_then_range_error() {
        let mut clip = walk_clip();
        clip.frame_end = 0.0;
        assert_eq!(
            clip.validate(),
            Err(ValidationError::InvalidFrameRange {
                start: 1.0,
                end: 0.0
            })
        );
    }

    #[test]
    fn given_clip_without_tracks_when_validating_then_no_bones_error() {
        let clip = Clip::new("empty", 1.0, 10.0);
        assert_eq!(clip.validate(), Err(ValidationError::NoBones));
    }

    #[test]
    fn given_tracks_without_curves_when_validating_then_no_curves_error() {
        let mut clip = Clip::new("still", 1.0, 10.0);
        clip.push_track(BoneTrack::new("Hips"));
        assert_eq!(clip.validate(), Err(ValidationError::NoCurves));
    }

    #[test]
    fn given_duplicate_channel_when_validating_then_duplicate_curve_error() {
        let mut clip = walk_clip();
        let duplicate = clip.bones[0].curves[0].clone();
        clip.bones[0].curves.push(duplicate);

        let err = clip.validate().unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateCurve { component_index: 0, .. }));
    }

    #[test]
    fn given_minimal_json_when_deserializing_then_defaults_are_filled() {
        let json = r#"{
            "name": "idle",
            "bones": [{
                "bone_name": "Hips",
                "fcurves": [{
                    "data_path": "pose.bones[\"Hips\"].location",
                    "array_index": 2,
                    "keyframes": [{"frame": 1.0, "value": 0.25}]
                }]
            }]
        }"#;
        let clip: Clip = serde_json::from_str(json).expect("valid clip json");

        assert_eq!(clip.frame_start, 1.0);
        assert_eq!(clip.frame_end, 250.0);
        assert_eq!(clip.version, "1.0");
        let curve = &clip.bones[0].curves[0];
        assert_eq!(curve.extrapolation, Extrapolation::Constant);
        assert_eq!(curve.keyframes[0], Keyframe::new(1.0, 0.25));
    }

    #[test]
    fn given_enum_tokens_when_serializing_then_upper_case_names_are_written() {
        let keyframe = Keyframe {
            handle_left_type: HandleType::AutoClamped,
            ..Keyframe::new(3.0, 1.0).with_interpolation(Interpolation::Linear)
        };
        let json = serde_json::to_value(keyframe).expect("serializable");

        assert_eq!(json["interpolation"], "LINEAR");
        assert_eq!(json["handle_left_type"], "AUTO_CLAMPED");
        assert_eq!(json["handle_right_type"], "AUTO");
        assert_eq!(json["handle_left"], serde_json::json!([0.0, 0.0]));
    }

    #[test]
    fn given_unknown_interpolation_token_when_deserializing_then_error() {
        let json = r#"{"frame": 1.0, "value": 0.0, "interpolation": "SPLINE"}"#;
        assert!(serde_json::from_str::<Keyframe>(json).is_err());
    }

    #[test]
    fn given_modifier_when_serializing_then_type_and_mute_keys_are_used() {
        let modifier = Modifier {
            kind: "NOISE".to_string(),
            muted: true,
        };
        assert_eq!(
            serde_json::to_value(&modifier).expect("serializable"),
            serde_json::json!({"type": "NOISE", "mute": true})
        );
    }
}
