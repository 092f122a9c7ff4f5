use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::format::SCHEMA_VERSION;

/// Confidence assigned to manual and exact matches.
pub const MANUAL_CONFIDENCE: f64 = 1.0;

/// A single source-to-target bone correspondence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneMapping {
    pub source_bone: String,
    pub target_bone: String,
    /// `1.0` for manual or exact matches, lower for auto-generated ones.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    MANUAL_CONFIDENCE
}

impl BoneMapping {
    pub fn new(
        source_bone: impl Into<String>,
        target_bone: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            source_bone: source_bone.into(),
            target_bone: target_bone.into(),
            confidence,
        }
    }

    pub fn manual(source_bone: impl Into<String>, target_bone: impl Into<String>) -> Self {
        Self::new(source_bone, target_bone, MANUAL_CONFIDENCE)
    }

    pub fn is_auto(&self) -> bool {
        self.confidence < MANUAL_CONFIDENCE
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.source_bone.trim().is_empty() {
            return Err(ValidationError::EmptyBoneName("source"));
        }
        if self.target_bone.trim().is_empty() {
            return Err(ValidationError::EmptyBoneName("target"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange {
                source_bone: self.source_bone.clone(),
                confidence: self.confidence,
            });
        }
        Ok(())
    }
}

/// Current local time as an ISO-8601 civil date-time.
pub(crate) fn now_timestamp() -> String {
    jiff::Zoned::now().datetime().to_string()
}

/// A complete mapping between two skeletons.
///
/// Mappings are kept in insertion order and keyed by source bone, so each
/// source bone maps to at most one target. Mapped and auto-mapped counts are
/// derived from the mappings on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneMappingPreset {
    pub name: String,
    pub source_skeleton_name: String,
    pub target_skeleton_name: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
    pub source_bone_count: usize,
    pub target_bone_count: usize,
    pub version: String,
    mappings: IndexMap<String, BoneMapping>,
}

impl BoneMappingPreset {
    /// Creates an empty preset stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        source_skeleton_name: impl Into<String>,
        target_skeleton_name: impl Into<String>,
    ) -> Self {
        let created_at = now_timestamp();
        Self {
            name: name.into(),
            source_skeleton_name: source_skeleton_name.into(),
            target_skeleton_name: target_skeleton_name.into(),
            description: String::new(),
            modified_at: created_at.clone(),
            created_at,
            source_bone_count: 0,
            target_bone_count: 0,
            version: SCHEMA_VERSION.to_string(),
            mappings: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_bone_counts(mut self, source_bone_count: usize, target_bone_count: usize) -> Self {
        self.source_bone_count = source_bone_count;
        self.target_bone_count = target_bone_count;
        self
    }

    /// Rebuilds a preset from persisted parts. Duplicate source bones and
    /// anything [`validate`](Self::validate) rejects are errors.
    pub(crate) fn from_parts(
        mut header: BoneMappingPreset,
        mappings: Vec<BoneMapping>,
    ) -> Result<Self, ValidationError> {
        header.mappings.clear();
        for mapping in mappings {
            if header.mappings.contains_key(&mapping.source_bone) {
                return Err(ValidationError::DuplicateSourceBone(mapping.source_bone));
            }
            header.mappings.insert(mapping.source_bone.clone(), mapping);
        }
        header.validate()?;
        Ok(header)
    }

    pub fn mappings(&self) -> impl Iterator<Item = &BoneMapping> {
        self.mappings.values()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn get(&self, source_bone: &str) -> Option<&BoneMapping> {
        self.mappings.get(source_bone)
    }

    /// Target bone mapped from `source_bone`.
    pub fn lookup(&self, source_bone: &str) -> Option<&str> {
        self.mappings
            .get(source_bone)
            .map(|mapping| mapping.target_bone.as_str())
    }

    /// First source bone mapped onto `target_bone`.
    pub fn reverse_lookup(&self, target_bone: &str) -> Option<&str> {
        self.mappings
            .values()
            .find(|mapping| mapping.target_bone == target_bone)
            .map(|mapping| mapping.source_bone.as_str())
    }

    /// Adds a mapping or replaces the existing one for the same source bone,
    /// keeping its position.
    pub fn add_mapping(
        &mut self,
        source_bone: impl Into<String>,
        target_bone: impl Into<String>,
        confidence: f64,
    ) -> Result<(), ValidationError> {
        let mapping = BoneMapping::new(source_bone, target_bone, confidence);
        mapping.validate()?;
        self.mappings.insert(mapping.source_bone.clone(), mapping);
        self.touch();
        Ok(())
    }

    pub fn remove_mapping(&mut self, source_bone: &str) -> Option<BoneMapping> {
        let removed = self.mappings.shift_remove(source_bone);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn mapped_count(&self) -> usize {
        self.mappings.len()
    }

    pub fn auto_mapped_count(&self) -> usize {
        self.mappings.values().filter(|mapping| mapping.is_auto()).count()
    }

    /// Refreshes the modification timestamp.
    pub fn touch(&mut self) {
        self.modified_at = now_timestamp();
    }

    /// Source → target table in mapping order.
    pub fn mapping_table(&self) -> IndexMap<String, String> {
        self.mappings
            .values()
            .map(|mapping| (mapping.source_bone.clone(), mapping.target_bone.clone()))
            .collect()
    }

    /// Target → source table. When several sources share a target the last
    /// one wins.
    pub fn reverse_mapping_table(&self) -> IndexMap<String, String> {
        self.mappings
            .values()
            .map(|mapping| (mapping.target_bone.clone(), mapping.source_bone.clone()))
            .collect()
    }

    pub fn unmapped_source_bones<S: AsRef<str>>(&self, all_source_bones: &[S]) -> Vec<String> {
        all_source_bones
            .iter()
            .map(|name| name.as_ref())
            .filter(|bone| !self.mappings.contains_key(*bone))
            .map(ToOwned::to_owned)
            .collect()
    }

    pub fn unmapped_target_bones<S: AsRef<str>>(&self, all_target_bones: &[S]) -> Vec<String> {
        all_target_bones
            .iter()
            .map(|name| name.as_ref())
            .filter(|bone| self.reverse_lookup(bone).is_none())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Checks names, bone names and confidence ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName("preset"));
        }
        if self.source_skeleton_name.trim().is_empty() {
            return Err(ValidationError::EmptySkeletonName("source"));
        }
        if self.target_skeleton_name.trim().is_empty() {
            return Err(ValidationError::EmptySkeletonName("target"));
        }
        for mapping in self.mappings.values() {
            mapping.validate()?;
        }
        Ok(())
    }

    /// Human-readable multi-line summary.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Mapping: {}", self.name),
            format!("Source: {}", self.source_skeleton_name),
            format!("Target: {}", self.target_skeleton_name),
            format!("Mappings: {}", self.mapped_count()),
        ];

        let auto_mapped = self.auto_mapped_count();
        if auto_mapped > 0 {
            lines.push(format!("Auto-mapped: {auto_mapped}"));
        }

        if !self.description.is_empty() {
            lines.push(format!("Description: {}", self.description));
        }

        lines.join("\n")
    }
}
