//! Transplants clip curves onto a differently named skeleton.

pub mod coverage;
pub mod sink;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clip::{Clip, rewrite_bone};
use crate::error::{Error, Result};
use crate::mapping::BoneMappingPreset;

pub use coverage::{CoverageReport, coverage_report};
pub use sink::{CurveSink, TargetAction};

/// Non-fatal per-track problem met while retargeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CoverageWarning {
    Unmapped { source: String },
    MissingTarget { source: String, target: String },
}

impl fmt::Display for CoverageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageWarning::Unmapped { source } => {
                write!(f, "No mapping for source bone: {source}")
            }
            CoverageWarning::MissingTarget { source, target } => {
                write!(f, "Target bone not found: {target} (mapped from {source})")
            }
        }
    }
}

/// Counters and warnings of one retargeting pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ApplyReport {
    pub applied_curve_count: usize,
    pub bones_applied: usize,
    pub bones_unmapped: usize,
    /// Mapped tracks whose target bone is absent.
    pub bones_skipped: usize,
    pub warnings: Vec<CoverageWarning>,
}

/// Result of [`apply_mapping`]: the new action plus what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Retargeted {
    pub action: TargetAction,
    pub applied_curve_count: usize,
    pub bones_applied: usize,
    pub bones_unmapped: usize,
    pub bones_skipped: usize,
    pub warnings: Vec<CoverageWarning>,
}

impl Retargeted {
    pub fn message(&self, clip: &Clip, preset: &BoneMappingPreset) -> String {
        let mut lines = vec![
            format!("Animation '{}' retargeted using mapping '{}'", clip.name, preset.name),
            format!("Curves created: {}", self.applied_curve_count),
            format!("Bones animated: {}", self.bones_applied),
            format!("Bones unmapped: {}", self.bones_unmapped),
            format!("Bones skipped: {}", self.bones_skipped),
            format!("Frame range: {}-{}", clip.frame_start, clip.frame_end),
        ];
        if self.bones_unmapped > 0 {
            lines.push(format!(
                "Warning: {} bones have no mapping defined",
                self.bones_unmapped
            ));
        }
        if self.bones_skipped > 0 {
            lines.push(format!(
                "Warning: {} target bones not found on the skeleton",
                self.bones_skipped
            ));
        }
        lines.join("\n")
    }
}

/// Retargets `clip` into a fresh [`TargetAction`] named `<clip>_<preset>`.
pub fn apply_mapping<S: AsRef<str>>(
    clip: &Clip,
    preset: &BoneMappingPreset,
    target_bone_names: &[S],
) -> Result<Retargeted> {
    let mut action = TargetAction::new(
        format!("{}_{}", clip.name, preset.name),
        clip.frame_start,
        clip.frame_end,
    );
    let report = apply_mapping_into(clip, preset, target_bone_names, &mut action)?;

    Ok(Retargeted {
        action,
        applied_curve_count: report.applied_curve_count,
        bones_applied: report.bones_applied,
        bones_unmapped: report.bones_unmapped,
        bones_skipped: report.bones_skipped,
        warnings: report.warnings,
    })
}

/// Retargets `clip` into an existing sink.
///
/// The preset and clip are validated before anything is written. Tracks
/// without a mapping, or whose target bone is absent, are skipped with a
/// warning. Every other curve is rewritten onto the target bone and replaces
/// the keyframes of the matching sink curve, so applying twice is the same as
/// applying once. Fails with [`Error::NothingApplied`] when no curve was
/// written.
pub fn apply_mapping_into<S, K>(
    clip: &Clip,
    preset: &BoneMappingPreset,
    target_bone_names: &[S],
    sink: &mut K,
) -> Result<ApplyReport>
where
    S: AsRef<str>,
    K: CurveSink + ?Sized,
{
    preset.validate()?;
    clip.validate()?;

    let targets: HashSet<&str> = target_bone_names.iter().map(|name| name.as_ref()).collect();
    let mut report = ApplyReport::default();

    for track in &clip.bones {
        let source_bone = track.bone_name.as_str();

        let Some(target_bone) = preset.lookup(source_bone) else {
            let warning = CoverageWarning::Unmapped {
                source: source_bone.to_string(),
            };
            warn!("{warning}");
            report.warnings.push(warning);
            report.bones_unmapped += 1;
            continue;
        };

        if !targets.contains(target_bone) {
            let warning = CoverageWarning::MissingTarget {
                source: source_bone.to_string(),
                target: target_bone.to_string(),
            };
            warn!("{warning}");
            report.warnings.push(warning);
            report.bones_skipped += 1;
            continue;
        }

        for source_curve in &track.curves {
            let channel_path = rewrite_bone(&source_curve.channel_path, source_bone, target_bone);
            let curve = sink.curve_mut(&channel_path, source_curve.component_index);
            curve.keyframes.clear();
            curve.keyframes.extend_from_slice(&source_curve.keyframes);
            curve.extrapolation = source_curve.extrapolation;
            curve.modifiers.clone_from(&source_curve.modifiers);

            debug!(
                channel_path = %channel_path,
                component_index = source_curve.component_index,
                keyframes = source_curve.keyframes.len(),
                "applied curve"
            );
            report.applied_curve_count += 1;
        }

        debug!(source_bone, target_bone, curves = track.curves.len(), "retargeted bone");
        report.bones_applied += 1;
    }

    if report.applied_curve_count == 0 {
        return Err(Error::NothingApplied {
            warnings: report.warnings,
        });
    }

    info!(
        clip = %clip.name,
        preset = %preset.name,
        curves = report.applied_curve_count,
        bones = report.bones_applied,
        unmapped = report.bones_unmapped,
        skipped = report.bones_skipped,
        "retargeting complete"
    );

    Ok(report)
}
