//! Entry points used by hosts: create, auto-map, validate and apply.
//!
//! Every call takes owned or borrowed inputs and returns new values. Nothing
//! here keeps state between calls.

use tracing::info;

use crate::clip::Clip;
use crate::error::{Result, ValidationError};
use crate::mapping::{self, AutoMapOptions, AutoMapSummary, BoneMappingPreset, detect_convention};
use crate::retarget::{self, CoverageReport, Retargeted};
use crate::skeleton::{BoneList, SkeletonProvider};

/// Creates an empty preset for two bone lists.
///
/// Skeletons are recorded as `source` and `target`. An empty `name` becomes
/// `source_to_target`.
pub fn create_mapping<S: AsRef<str>, T: AsRef<str>>(
    source_bones: &[S],
    target_bones: &[T],
    name: &str,
) -> Result<BoneMappingPreset> {
    create_mapping_between(
        &BoneList::new("source", source_bones),
        &BoneList::new("target", target_bones),
        name,
        "",
    )
}

/// Creates an empty preset between two skeletons, recording their names and
/// bone counts. An empty `name` becomes `<source>_to_<target>`.
pub fn create_mapping_between(
    source: &impl SkeletonProvider,
    target: &impl SkeletonProvider,
    name: &str,
    description: &str,
) -> Result<BoneMappingPreset> {
    let source_bones = source.bone_names();
    let target_bones = target.bone_names();

    if source.skeleton_name().trim().is_empty() {
        return Err(ValidationError::EmptySkeletonName("source").into());
    }
    if target.skeleton_name().trim().is_empty() {
        return Err(ValidationError::EmptySkeletonName("target").into());
    }
    if source_bones.is_empty() {
        return Err(ValidationError::EmptySkeleton("source").into());
    }
    if target_bones.is_empty() {
        return Err(ValidationError::EmptySkeleton("target").into());
    }

    let name = match name.trim() {
        "" => format!("{}_to_{}", source.skeleton_name(), target.skeleton_name()),
        trimmed => trimmed.to_string(),
    };

    let preset = BoneMappingPreset::new(name, source.skeleton_name(), target.skeleton_name())
        .with_description(description.trim())
        .with_bone_counts(source_bones.len(), target_bones.len());

    info!(
        preset = %preset.name,
        source_bones = source_bones.len(),
        target_bones = target_bones.len(),
        source_convention = detect_convention(&source_bones).label(),
        target_convention = detect_convention(&target_bones).label(),
        "created bone mapping"
    );

    Ok(preset)
}

/// Runs the greedy auto-mapper on `preset` and returns the updated preset.
pub fn auto_map<S: AsRef<str>, T: AsRef<str>>(
    mut preset: BoneMappingPreset,
    source_bones: &[S],
    target_bones: &[T],
    options: AutoMapOptions,
) -> Result<(BoneMappingPreset, AutoMapSummary)> {
    let summary = mapping::auto_map(&mut preset, source_bones, target_bones, options)?;
    Ok((preset, summary))
}

/// Checks the preset and clip, then reports mapping coverage of the clip.
pub fn validate<S: AsRef<str>>(
    clip: &Clip,
    preset: &BoneMappingPreset,
    target_bone_names: &[S],
) -> Result<CoverageReport> {
    preset.validate()?;
    clip.validate()?;
    Ok(retarget::coverage_report(clip, preset, target_bone_names))
}

/// Retargets `clip` onto the target skeleton. See [`retarget::apply_mapping_into`].
pub fn apply_mapping<S: AsRef<str>>(
    clip: &Clip,
    preset: &BoneMappingPreset,
    target_bone_names: &[S],
) -> Result<Retargeted> {
    retarget::apply_mapping(clip, preset, target_bone_names)
}
