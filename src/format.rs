//! Versioned JSON documents for presets and clips.
//!
//! Every payload carries a top-level `version`. Loading parses the raw JSON,
//! runs it through [`migrate`] and only then maps it onto the typed model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clip::Clip;
use crate::error::{FormatError, Result};
use crate::mapping::{BoneMapping, BoneMappingPreset};
use crate::mapping::types::now_timestamp;

/// Schema version written by this crate and the only one it reads.
pub const SCHEMA_VERSION: &str = "1.0";

/// Brings a raw document up to [`SCHEMA_VERSION`].
///
/// A missing `version` is read as the current one. No older schema exists
/// yet, so any other value is rejected rather than guessed at.
pub fn migrate(document: Value) -> std::result::Result<Value, FormatError> {
    let version = match document.get("version") {
        None | Some(Value::Null) => SCHEMA_VERSION.to_string(),
        Some(Value::String(version)) => version.clone(),
        Some(other) => return Err(FormatError::UnsupportedVersion(other.to_string())),
    };

    match version.as_str() {
        SCHEMA_VERSION => Ok(document),
        _ => Err(FormatError::UnsupportedVersion(version)),
    }
}

fn parse(json: &str) -> std::result::Result<Value, FormatError> {
    let raw: Value = serde_json::from_str(json)?;
    migrate(raw)
}

// ─── Mapping documents ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct PresetDocument {
    name: String,
    source_armature_name: String,
    target_armature_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    mappings: Vec<BoneMapping>,
    #[serde(default)]
    metadata: PresetMetadata,
    #[serde(default = "default_version")]
    version: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PresetMetadata {
    #[serde(default)]
    created_date: String,
    #[serde(default)]
    modified_date: String,
    #[serde(default)]
    source_bone_count: usize,
    #[serde(default)]
    target_bone_count: usize,
    #[serde(default)]
    mapped_count: usize,
    #[serde(default)]
    auto_mapped_count: usize,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Pretty-printed mapping file.
pub fn preset_to_json(preset: &BoneMappingPreset) -> Result<String> {
    let document = PresetDocument {
        name: preset.name.clone(),
        source_armature_name: preset.source_skeleton_name.clone(),
        target_armature_name: preset.target_skeleton_name.clone(),
        description: preset.description.clone(),
        mappings: preset.mappings().cloned().collect(),
        metadata: PresetMetadata {
            created_date: preset.created_at.clone(),
            modified_date: preset.modified_at.clone(),
            source_bone_count: preset.source_bone_count,
            target_bone_count: preset.target_bone_count,
            mapped_count: preset.mapped_count(),
            auto_mapped_count: preset.auto_mapped_count(),
        },
        version: preset.version.clone(),
    };
    Ok(serde_json::to_string_pretty(&document).map_err(FormatError::from)?)
}

/// Parses a mapping file.
///
/// Stored `mapped_count` / `auto_mapped_count` are ignored and recomputed
/// from the mappings. Missing timestamps are filled with the current time.
/// Duplicate source bones, out-of-range confidences and blank names are
/// validation errors.
pub fn preset_from_json(json: &str) -> Result<BoneMappingPreset> {
    let document: PresetDocument =
        serde_json::from_value(parse(json)?).map_err(FormatError::from)?;
    let metadata = document.metadata;

    let mut header = BoneMappingPreset::new(
        document.name,
        document.source_armature_name,
        document.target_armature_name,
    )
    .with_description(document.description)
    .with_bone_counts(metadata.source_bone_count, metadata.target_bone_count);

    let created_at = if metadata.created_date.is_empty() {
        now_timestamp()
    } else {
        metadata.created_date
    };
    header.modified_at = if metadata.modified_date.is_empty() {
        created_at.clone()
    } else {
        metadata.modified_date
    };
    header.created_at = created_at;
    header.version = document.version;

    Ok(BoneMappingPreset::from_parts(header, document.mappings)?)
}

// ─── Clip documents ───────────────────────────────────────────────────────────

/// Pretty-printed clip file.
pub fn clip_to_json(clip: &Clip) -> Result<String> {
    Ok(serde_json::to_string_pretty(clip).map_err(FormatError::from)?)
}

/// Parses a clip file. Structural validation is left to [`Clip::validate`].
pub fn clip_from_json(json: &str) -> Result<Clip> {
    Ok(serde_json::from_value(parse(json)?).map_err(FormatError::from)?)
}

// ─── Stored documents ─────────────────────────────────────────────────────────

/// A named payload that can live in a [`crate::store::JsonLibrary`].
pub trait Document: Sized {
    /// Label used in messages and `NotFound` errors.
    const KIND: &'static str;

    fn name(&self) -> &str;

    fn to_json(&self) -> Result<String>;

    fn from_json(json: &str) -> Result<Self>;

    /// Hook run right before the document is written.
    fn prepare_for_save(&mut self) {}
}

impl Document for BoneMappingPreset {
    const KIND: &'static str = "bone mapping";

    fn name(&self) -> &str {
        &self.name
    }

    fn to_json(&self) -> Result<String> {
        preset_to_json(self)
    }

    fn from_json(json: &str) -> Result<Self> {
        preset_from_json(json)
    }

    fn prepare_for_save(&mut self) {
        self.touch();
    }
}

impl Document for Clip {
    const KIND: &'static str = "animation";

    fn name(&self) -> &str {
        &self.name
    }

    fn to_json(&self) -> Result<String> {
        clip_to_json(self)
    }

    fn from_json(json: &str) -> Result<Self> {
        clip_from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{
        BoneTrack, Curve, Extrapolation, HandleType, Interpolation, Keyframe, Modifier,
    };
    use crate::error::{Error, ValidationError};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_preset() -> BoneMappingPreset {
        let mut preset = BoneMappingPreset::new("mixamo_to_rigify", "Armature", "metarig")
            .with_description("humanoid")
            .with_bone_counts(3, 4);
        preset.add_mapping("mixamorig:Hips", "hips", 1.0).expect("valid mapping");
        preset.add_mapping("mixamorig:LeftArm", "upper_arm.L", 0.6875).expect("valid mapping");
        preset
    }

    #[test]
    fn given_preset_when_serializing_then_metadata_block_carries_counts() {
        let json = preset_to_json(&sample_preset()).expect("serializable");
        let value: Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["source_armature_name"], "Armature");
        assert_eq!(value["metadata"]["mapped_count"], 2);
        assert_eq!(value["metadata"]["auto_mapped_count"], 1);
        assert_eq!(value["metadata"]["target_bone_count"], 4);
        assert_eq!(value["mappings"][1]["confidence"], 0.6875);
        assert_eq!(value["version"], "1.0");
    }

    #[test]
    fn given_serialized_preset_when_parsing_then_equal_preset_is_returned() {
        let preset = sample_preset();
        let parsed = preset_from_json(&preset_to_json(&preset).expect("serializable"))
            .expect("parsable");
        assert_eq!(parsed, preset);
    }

    #[test]
    fn given_stale_counters_when_parsing_then_they_are_recomputed() {
        let json = json!({
            "name": "p",
            "source_armature_name": "a",
            "target_armature_name": "b",
            "mappings": [{"source_bone": "Hips", "target_bone": "hips", "confidence": 0.9}],
            "metadata": {"mapped_count": 40, "auto_mapped_count": 0},
            "version": "1.0"
        });
        let preset = preset_from_json(&json.to_string()).expect("parsable");

        assert_eq!(preset.mapped_count(), 1);
        assert_eq!(preset.auto_mapped_count(), 1);
        assert!(!preset.created_at.is_empty());
        assert_eq!(preset.modified_at, preset.created_at);
    }

    #[test]
    fn given_duplicate_source_bones_when_parsing_then_validation_error() {
        let json = json!({
            "name": "p",
            "source_armature_name": "a",
            "target_armature_name": "b",
            "mappings": [
                {"source_bone": "Hips", "target_bone": "hips"},
                {"source_bone": "Hips", "target_bone": "pelvis"}
            ]
        });
        let err = preset_from_json(&json.to_string()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::DuplicateSourceBone(ref bone)) if bone == "Hips"
        ));
    }

    #[test]
    fn given_confidence_above_one_when_parsing_then_validation_error() {
        let json = json!({
            "name": "p",
            "source_armature_name": "a",
            "target_armature_name": "b",
            "mappings": [{"source_bone": "Hips", "target_bone": "hips", "confidence": 7.5}]
        });
        let err = preset_from_json(&json.to_string()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::ConfidenceOutOfRange { confidence, .. })
                if confidence == 7.5
        ));
    }

    #[test]
    fn given_blank_names_when_parsing_then_validation_error() {
        let blank_armature = json!({
            "name": "p",
            "source_armature_name": " ",
            "target_armature_name": "b"
        });
        assert!(matches!(
            preset_from_json(&blank_armature.to_string()).unwrap_err(),
            Error::Validation(ValidationError::EmptySkeletonName("source"))
        ));

        let blank_bone = json!({
            "name": "p",
            "source_armature_name": "a",
            "target_armature_name": "b",
            "mappings": [{"source_bone": "Hips", "target_bone": ""}]
        });
        assert!(matches!(
            preset_from_json(&blank_bone.to_string()).unwrap_err(),
            Error::Validation(ValidationError::EmptyBoneName("target"))
        ));
    }

    #[test]
    fn given_unknown_version_when_parsing_then_unsupported_version_error() {
        let json = json!({"name": "walk", "version": "2.0"});
        let err = clip_from_json(&json.to_string()).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::UnsupportedVersion(ref version)) if version == "2.0"
        ));
    }

    #[test]
    fn given_numeric_version_when_migrating_then_it_is_rejected() {
        let err = migrate(json!({"version": 1})).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(ref version) if version == "1"));
    }

    #[test]
    fn given_missing_version_when_migrating_then_document_passes_through() {
        let document = json!({"name": "walk"});
        assert_eq!(migrate(document.clone()).expect("current version"), document);
    }

    #[test]
    fn given_malformed_json_when_parsing_then_format_error() {
        let err = clip_from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::Json(_))));
    }

    #[test]
    fn given_unknown_extrapolation_when_parsing_clip_then_format_error() {
        let json = json!({
            "name": "walk",
            "bones": [{
                "bone_name": "Hips",
                "fcurves": [{
                    "data_path": "pose.bones[\"Hips\"].location",
                    "array_index": 0,
                    "extrapolation": "CYCLIC"
                }]
            }]
        });
        let err = clip_from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::Json(_))));
    }

    #[test]
    fn given_zero_bone_clip_when_round_tripping_then_clip_is_unchanged() {
        let clip = Clip::new("empty", 1.0, 250.0);
        let parsed = clip_from_json(&clip_to_json(&clip).expect("serializable")).expect("parsable");
        assert_eq!(parsed, clip);
    }

    fn keyframe_strategy() -> impl Strategy<Value = Keyframe> {
        let interpolation = prop::sample::select(vec![
            Interpolation::Constant,
            Interpolation::Linear,
            Interpolation::Bezier,
            Interpolation::Sine,
            Interpolation::Quad,
            Interpolation::Cubic,
            Interpolation::Quart,
            Interpolation::Quint,
            Interpolation::Expo,
            Interpolation::Circ,
            Interpolation::Back,
            Interpolation::Bounce,
            Interpolation::Elastic,
        ]);
        let handle_type = prop::sample::select(vec![
            HandleType::Free,
            HandleType::Aligned,
            HandleType::Vector,
            HandleType::Auto,
            HandleType::AutoClamped,
        ]);
        (
            -1.0e6f64..1.0e6,
            prop::num::f64::NORMAL | prop::num::f64::ZERO,
            interpolation,
            (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6),
            (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6),
            handle_type.clone(),
            handle_type,
        )
            .prop_map(
                |(frame, value, interpolation, handle_left, handle_right, left_type, right_type)| {
                    Keyframe {
                        frame,
                        value,
                        interpolation,
                        handle_left,
                        handle_right,
                        handle_left_type: left_type,
                        handle_right_type: right_type,
                    }
                },
            )
    }

    fn curve_strategy() -> impl Strategy<Value = Curve> {
        (
            "[a-z_]{1,10}",
            0i32..4,
            prop::collection::vec(keyframe_strategy(), 0..6),
            prop::bool::ANY,
            prop::collection::vec(("[A-Z_]{1,8}", prop::bool::ANY), 0..2),
        )
            .prop_map(|(property, index, keyframes, linear, modifiers)| Curve {
                channel_path: format!("pose.bones[\"bone\"].{property}"),
                component_index: index,
                keyframes,
                extrapolation: if linear {
                    Extrapolation::Linear
                } else {
                    Extrapolation::Constant
                },
                modifiers: modifiers
                    .into_iter()
                    .map(|(kind, muted)| Modifier { kind, muted })
                    .collect(),
            })
    }

    fn clip_strategy() -> impl Strategy<Value = Clip> {
        (
            "\\PC{1,16}",
            "\\PC{0,16}",
            -1.0e4f64..1.0e4,
            0.001f64..1.0e4,
            prop::collection::vec(
                ("[A-Za-z:._]{1,12}", prop::collection::vec(curve_strategy(), 0..4)),
                0..4,
            ),
        )
            .prop_map(|(name, description, start, length, tracks)| {
                let mut clip = Clip::new(name, start, start + length);
                clip.description = description;
                clip.source_skeleton_name = "Armature".to_string();
                clip.source_track_name = "Action".to_string();
                for (bone_name, curves) in tracks {
                    clip.push_track(BoneTrack { bone_name, curves });
                }
                clip
            })
    }

    proptest! {
        #[test]
        fn clip_json_round_trip_is_lossless(clip in clip_strategy()) {
            let json = clip_to_json(&clip).expect("serializable");
            let parsed = clip_from_json(&json).expect("parsable");
            prop_assert_eq!(parsed, clip);
        }
    }
}
