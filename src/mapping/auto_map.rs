use serde::Serialize;
use tracing::{debug, info};

use super::naming::{Side, extract_side, normalize};
use super::similarity::similarity;
use super::types::{BoneMappingPreset, MANUAL_CONFIDENCE};
use crate::error::ValidationError;

// ─── Confidence scale ─────────────────────────────────────────────────────────

const EXACT_CONFIDENCE: f64 = MANUAL_CONFIDENCE;
const CASE_INSENSITIVE_CONFIDENCE: f64 = 0.95;
const NORMALIZED_CONFIDENCE: f64 = 0.9;
const SIMILARITY_FLOOR: f64 = 0.6;
const SIMILARITY_SPAN: f64 = 0.25;
const SUGGESTION_SPAN: f64 = 0.4;
const SIDE_MISMATCH_PENALTY: f64 = 0.5;
const MAX_SUGGESTIONS: usize = 5;

/// Tuning for [`auto_map`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoMapOptions {
    /// Minimum confidence a candidate needs to be accepted.
    pub threshold: f64,
    /// Keep every existing mapping and reserve the targets of manual ones.
    pub preserve_existing: bool,
}

impl Default for AutoMapOptions {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            preserve_existing: true,
        }
    }
}

/// Strategy that produced a match, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Exact,
    CaseInsensitive,
    Normalized,
    Similarity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneMatch<'a> {
    pub target: &'a str,
    pub confidence: f64,
    pub kind: MatchKind,
}

/// Outcome counters of one [`auto_map`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AutoMapSummary {
    pub mapped: usize,
    pub skipped: usize,
    pub unmapped: usize,
    /// Mappings held by the preset after the run.
    pub total_mappings: usize,
}

impl AutoMapSummary {
    pub fn message(&self) -> String {
        format!(
            "Auto-mapping complete:\nMapped: {} bones\nSkipped: {} bones (already mapped)\nUnmapped: {} bones\nTotal mappings: {}",
            self.mapped, self.skipped, self.unmapped, self.total_mappings
        )
    }
}

struct NameKey {
    normalized: String,
    base: String,
    side: Side,
}

impl NameKey {
    fn of(name: &str) -> Self {
        let normalized = normalize(name);
        let (base, side) = extract_side(&normalized);
        Self {
            normalized,
            base,
            side,
        }
    }

    /// Name similarity, halved when the two names sit on opposite sides.
    fn side_aware_similarity(&self, other: &NameKey) -> f64 {
        let score = similarity(&self.normalized, &other.normalized);
        if self.side.conflicts_with(other.side) {
            score * SIDE_MISMATCH_PENALTY
        } else {
            score
        }
    }
}

/// Finds the best target for `source_bone` among `candidates`.
///
/// Strategies are tried in order: exact name, case-insensitive name, equal
/// normalized base with compatible sides (first candidate wins), then the
/// highest side-aware similarity mapped into `[0.6, 0.85]`. The result is
/// dropped when its confidence is below `threshold`.
pub fn find_best_match<'a, S: AsRef<str>>(
    source_bone: &str,
    candidates: &'a [S],
    threshold: f64,
) -> Option<BoneMatch<'a>> {
    let best = best_candidate(source_bone, candidates)?;
    (best.confidence >= threshold).then_some(best)
}

fn best_candidate<'a, S: AsRef<str>>(
    source_bone: &str,
    candidates: &'a [S],
) -> Option<BoneMatch<'a>> {
    if candidates.is_empty() {
        return None;
    }

    if let Some(target) = candidates
        .iter()
        .map(|name| name.as_ref())
        .find(|candidate| *candidate == source_bone)
    {
        return Some(BoneMatch {
            target,
            confidence: EXACT_CONFIDENCE,
            kind: MatchKind::Exact,
        });
    }

    let source_lower = source_bone.to_lowercase();
    if let Some(target) = candidates
        .iter()
        .map(|name| name.as_ref())
        .find(|candidate| candidate.to_lowercase() == source_lower)
    {
        return Some(BoneMatch {
            target,
            confidence: CASE_INSENSITIVE_CONFIDENCE,
            kind: MatchKind::CaseInsensitive,
        });
    }

    let source_key = NameKey::of(source_bone);
    let candidate_keys: Vec<(&str, NameKey)> = candidates
        .iter()
        .map(|candidate| (candidate.as_ref(), NameKey::of(candidate.as_ref())))
        .collect();

    if let Some((target, _)) = candidate_keys.iter().find(|(_, key)| {
        key.base == source_key.base && key.side.is_compatible_with(source_key.side)
    }) {
        return Some(BoneMatch {
            target: *target,
            confidence: NORMALIZED_CONFIDENCE,
            kind: MatchKind::Normalized,
        });
    }

    let mut best: Option<BoneMatch<'a>> = None;
    for (target, key) in &candidate_keys {
        let confidence =
            SIMILARITY_FLOOR + source_key.side_aware_similarity(key) * SIMILARITY_SPAN;
        if best.is_none_or(|current| confidence > current.confidence) {
            best = Some(BoneMatch {
                target: *target,
                confidence,
                kind: MatchKind::Similarity,
            });
        }
    }
    best
}

/// Greedily maps `source_bones` onto `target_bones`, updating `preset`.
///
/// Sources are processed in the given order and the first source to claim a
/// target keeps it, so no target is assigned twice within a run. With
/// `preserve_existing`, sources that already have a mapping are skipped and
/// targets of manual mappings (confidence `1.0`) are withheld.
///
/// The threshold, the preset and both bone lists are checked before the
/// preset is touched; a blank bone name is an error.
pub fn auto_map<S: AsRef<str>, T: AsRef<str>>(
    preset: &mut BoneMappingPreset,
    source_bones: &[S],
    target_bones: &[T],
    options: AutoMapOptions,
) -> Result<AutoMapSummary, ValidationError> {
    if !(0.0..=1.0).contains(&options.threshold) {
        return Err(ValidationError::ThresholdOutOfRange(options.threshold));
    }
    preset.validate()?;
    if source_bones.iter().any(|name| name.as_ref().trim().is_empty()) {
        return Err(ValidationError::EmptyBoneName("source"));
    }
    if target_bones.iter().any(|name| name.as_ref().trim().is_empty()) {
        return Err(ValidationError::EmptyBoneName("target"));
    }

    let used_targets: Vec<String> = if options.preserve_existing {
        preset
            .mappings()
            .filter(|mapping| mapping.confidence >= MANUAL_CONFIDENCE)
            .map(|mapping| mapping.target_bone.clone())
            .collect()
    } else {
        Vec::new()
    };

    let mut available: Vec<String> = target_bones
        .iter()
        .map(|name| name.as_ref())
        .filter(|target| !used_targets.iter().any(|used| used == target))
        .map(ToOwned::to_owned)
        .collect();

    let mut summary = AutoMapSummary::default();

    for source_bone in source_bones.iter().map(|name| name.as_ref()) {
        if options.preserve_existing && preset.lookup(source_bone).is_some() {
            summary.skipped += 1;
            continue;
        }

        let Some(found) = find_best_match(source_bone, &available, options.threshold) else {
            debug!(source_bone, "no candidate above threshold");
            summary.unmapped += 1;
            continue;
        };

        let target = found.target.to_string();
        debug!(
            source_bone,
            target_bone = %target,
            confidence = found.confidence,
            kind = ?found.kind,
            "auto-mapped bone"
        );

        preset.add_mapping(source_bone, target.as_str(), found.confidence)?;
        available.retain(|candidate| *candidate != target);
        summary.mapped += 1;
    }

    preset.touch();
    summary.total_mappings = preset.mapped_count();

    info!(
        preset = %preset.name,
        mapped = summary.mapped,
        skipped = summary.skipped,
        unmapped = summary.unmapped,
        "auto-mapping complete"
    );

    Ok(summary)
}

/// Up to five candidate targets for a source bone, best first.
///
/// Scores use the wider `0.6 + 0.4 * similarity` scale with the same
/// opposite-side penalty. Ties keep the order of `target_bones`.
pub fn suggest_mappings<S: AsRef<str>>(
    source_bone: &str,
    target_bones: &[S],
    threshold: f64,
) -> Vec<(String, f64)> {
    let source_key = NameKey::of(source_bone);

    let mut suggestions: Vec<(String, f64)> = target_bones
        .iter()
        .map(|name| name.as_ref())
        .map(|target| {
            let score = source_key.side_aware_similarity(&NameKey::of(target));
            let confidence = SIMILARITY_FLOOR + score * SUGGESTION_SPAN;
            (target.to_string(), confidence)
        })
        .filter(|(_, confidence)| *confidence >= threshold)
        .collect();

    suggestions.sort_by(|a, b| b.1.total_cmp(&a.1));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
