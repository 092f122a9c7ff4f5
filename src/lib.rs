//! Bone-name mapping and keyframe animation retargeting between skeletons
//! whose bones follow different naming conventions.

pub mod clip;
pub mod engine;
pub mod error;
pub mod format;
pub mod logging;
pub mod mapping;
pub mod retarget;
pub mod settings;
pub mod skeleton;
pub mod store;

pub use error::{Error, FormatError, Result, ValidationError};
