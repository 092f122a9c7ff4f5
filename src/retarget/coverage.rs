use std::collections::HashSet;

use serde::Serialize;

use crate::clip::Clip;
use crate::mapping::BoneMappingPreset;

/// How well a mapping covers the tracks of a clip on a given target skeleton.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    /// `(source, target)` pairs that will be retargeted.
    pub valid: Vec<(String, String)>,
    /// Source bones without a mapping.
    pub unmapped: Vec<String>,
    /// `(source, target)` pairs whose target bone is not on the skeleton.
    pub missing_target: Vec<(String, String)>,
    pub total_tracks: usize,
    pub coverage_pct: f64,
}

impl CoverageReport {
    pub fn is_valid(&self) -> bool {
        self.unmapped.is_empty() && self.missing_target.is_empty()
    }

    pub fn message(&self) -> String {
        let coverage = format!(
            "Coverage: {:.1}% ({}/{} bones)",
            self.coverage_pct,
            self.valid.len(),
            self.total_tracks
        );

        if self.is_valid() {
            return format!("Bone mapping is valid\n{coverage}");
        }

        let mut lines = vec!["Bone mapping validation issues:".to_string(), coverage];
        if !self.unmapped.is_empty() {
            lines.push(format!("Unmapped bones: {}", self.unmapped.len()));
        }
        if !self.missing_target.is_empty() {
            lines.push(format!("Missing target bones: {}", self.missing_target.len()));
        }
        lines.join("\n")
    }
}

/// Classifies every track of `clip` as valid, unmapped or missing its target.
pub fn coverage_report<S: AsRef<str>>(
    clip: &Clip,
    preset: &BoneMappingPreset,
    target_bone_names: &[S],
) -> CoverageReport {
    let targets: HashSet<&str> = target_bone_names.iter().map(|name| name.as_ref()).collect();

    let mut valid = Vec::new();
    let mut unmapped = Vec::new();
    let mut missing_target = Vec::new();

    for track in &clip.bones {
        let source = track.bone_name.clone();
        match preset.lookup(&track.bone_name) {
            None => unmapped.push(source),
            Some(target) if targets.contains(target) => valid.push((source, target.to_string())),
            Some(target) => missing_target.push((source, target.to_string())),
        }
    }

    let total_tracks = clip.bones.len();
    let coverage_pct = if total_tracks == 0 {
        0.0
    } else {
        100.0 * valid.len() as f64 / total_tracks as f64
    };

    CoverageReport {
        valid,
        unmapped,
        missing_target,
        total_tracks,
        coverage_pct,
    }
}
