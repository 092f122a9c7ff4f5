use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::mapping::AutoMapOptions;
use crate::store::ListingCache;

/// Persisted retargeting settings used by CLI workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetSettings {
    /// Minimum auto-mapping confidence.
    pub threshold: f64,
    pub preserve_existing: bool,
    pub mapping_dir: PathBuf,
    pub clip_dir: PathBuf,
    pub listing_ttl_ms: u64,
    pub log_level: LogLevel,
}

impl Default for RetargetSettings {
    fn default() -> Self {
        let options = AutoMapOptions::default();
        Self {
            threshold: options.threshold,
            preserve_existing: options.preserve_existing,
            mapping_dir: PathBuf::from("mappings"),
            clip_dir: PathBuf::from("animations"),
            listing_ttl_ms: 2000,
            log_level: LogLevel::Info,
        }
    }
}

impl RetargetSettings {
    pub fn auto_map_options(&self) -> AutoMapOptions {
        AutoMapOptions {
            threshold: self.threshold,
            preserve_existing: self.preserve_existing,
        }
    }

    pub fn listing_ttl(&self) -> Duration {
        Duration::from_millis(self.listing_ttl_ms)
    }

    pub fn listing_cache(&self) -> ListingCache {
        ListingCache::new(self.listing_ttl())
    }
}

/// Save retargeting settings to a JSON file.
pub fn save_settings(path: &Path, settings: &RetargetSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize retargeting settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save retargeting settings: {}", path.display()))?;
    Ok(())
}

/// Load retargeting settings from a JSON file. Missing keys take defaults.
pub fn load_settings(path: &Path) -> Result<RetargetSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load retargeting settings: {}", path.display()))?;
    let settings: RetargetSettings =
        serde_json::from_str(&content).context("failed to parse retargeting settings JSON")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn given_settings_when_saving_and_loading_then_values_match() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("crossrig.json");
        let settings = RetargetSettings {
            threshold: 0.75,
            preserve_existing: false,
            listing_ttl_ms: 500,
            log_level: LogLevel::Debug,
            ..RetargetSettings::default()
        };

        save_settings(&path, &settings).expect("saved");
        let loaded = load_settings(&path).expect("loaded");

        assert_eq!(loaded, settings);
        assert_eq!(loaded.listing_ttl(), Duration::from_millis(500));
        assert_eq!(
            loaded.auto_map_options(),
            AutoMapOptions {
                threshold: 0.75,
                preserve_existing: false
            }
        );
    }

    #[test]
    fn given_partial_file_when_loading_then_missing_keys_use_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("crossrig.json");
        fs::write(&path, r#"{"threshold": 0.8}"#).expect("fixture written");

        let loaded = load_settings(&path).expect("loaded");

        assert_eq!(loaded.threshold, 0.8);
        assert!(loaded.preserve_existing);
        assert_eq!(loaded.listing_cache().ttl(), Duration::from_secs(2));
    }

    #[test]
    fn given_missing_file_when_loading_then_error_names_the_path() {
        let err = load_settings(Path::new("/nonexistent/crossrig.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/crossrig.json"));
    }
}
