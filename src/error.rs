use thiserror::Error;

use crate::retarget::CoverageWarning;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("invalid format: {0}")]
    Format(#[from] FormatError),

    #[error("no curves were applied ({} warnings)", .warnings.len())]
    NothingApplied { warnings: Vec<CoverageWarning> },

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Warnings collected before the failure, if any.
    pub fn warnings(&self) -> &[CoverageWarning] {
        match self {
            Error::NothingApplied { warnings } => warnings,
            _ => &[],
        }
    }
}

/// Structural problems detected before any mutation takes place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    #[error("{0} skeleton name cannot be empty")]
    EmptySkeletonName(&'static str),

    #[error("{0} skeleton has no bones")]
    EmptySkeleton(&'static str),

    #[error("duplicate source bone mapping: {0}")]
    DuplicateSourceBone(String),

    #[error("{0} bone name cannot be empty")]
    EmptyBoneName(&'static str),

    #[error("invalid confidence value for {source_bone}: {confidence}")]
    ConfidenceOutOfRange { source_bone: String, confidence: f64 },

    #[error("threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("clip must contain at least one animated bone")]
    NoBones,

    #[error("invalid frame range: end ({end}) must be after start ({start})")]
    InvalidFrameRange { start: f64, end: f64 },

    #[error("no animation curves found")]
    NoCurves,

    #[error("duplicate curve {channel_path}[{component_index}] on bone {bone}")]
    DuplicateCurve {
        bone: String,
        channel_path: String,
        component_index: i32,
    },
}

/// Problems with persisted payloads.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document version: {0}")]
    UnsupportedVersion(String),

    #[error("failed to read glTF skeleton: {0}")]
    Gltf(#[from] gltf::Error),
}
