//! Bone-name correspondence between two skeletons.

pub mod auto_map;
pub mod naming;
pub mod similarity;
pub mod types;

pub use auto_map::{
    AutoMapOptions, AutoMapSummary, BoneMatch, MatchKind, auto_map, find_best_match,
    suggest_mappings,
};
pub use naming::{NamingConvention, Side, detect_convention, extract_side, normalize};
pub use similarity::{levenshtein, similarity};
pub use types::{BoneMapping, BoneMappingPreset, MANUAL_CONFIDENCE};
