//! Directory-backed libraries of saved presets and clips.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::format::Document;

/// Default lifetime of a cached directory listing.
pub const DEFAULT_LISTING_TTL: Duration = Duration::from_secs(2);

const MAX_FILENAME_CHARS: usize = 100;
const FALLBACK_FILENAME: &str = "unnamed";

/// `(document name, file path)` pairs sorted by name.
pub type Listing = Vec<(String, PathBuf)>;

/// Turns a document name into a safe file stem.
///
/// Replaces `<>:"/\|?*` with `_`, trims spaces and dots from both ends and
/// keeps at most 100 characters.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();

    let trimmed: String = replaced
        .trim_matches(|c| c == ' ' || c == '.')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed
    }
}

// ─── Listing cache ────────────────────────────────────────────────────────────

/// Time-limited memo of the last directory listing.
#[derive(Debug, Clone)]
pub struct ListingCache {
    ttl: Duration,
    entry: Option<(Instant, Listing)>,
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new(DEFAULT_LISTING_TTL)
    }
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached listing while it is fresh, otherwise calls `loader`
    /// and caches what it returns. Loader errors leave the cache empty.
    pub fn get<E>(
        &mut self,
        loader: impl FnOnce() -> std::result::Result<Listing, E>,
    ) -> std::result::Result<Listing, E> {
        if let Some((loaded_at, listing)) = &self.entry {
            if loaded_at.elapsed() < self.ttl {
                return Ok(listing.clone());
            }
        }

        self.entry = None;
        let listing = loader()?;
        self.entry = Some((Instant::now(), listing.clone()));
        Ok(listing)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }
}

// ─── JSON library ─────────────────────────────────────────────────────────────

/// A directory of JSON documents of one kind.
#[derive(Debug)]
pub struct JsonLibrary<D: Document> {
    dir: PathBuf,
    cache: ListingCache,
    _document: PhantomData<D>,
}

impl<D: Document> JsonLibrary<D> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_cache(dir, ListingCache::default())
    }

    pub fn with_cache(dir: impl Into<PathBuf>, cache: ListingCache) -> Self {
        Self {
            dir: dir.into(),
            cache,
            _document: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<sanitized name>.json`
    pub fn default_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_filename(name)))
    }

    /// Writes `document` to `path`, or to its default path inside the library.
    pub fn save(&mut self, document: &mut D, path: Option<&Path>) -> Result<PathBuf> {
        document.prepare_for_save();

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_path(document.name()),
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, document.to_json()?)?;
        self.cache.invalidate();

        info!(kind = D::KIND, name = document.name(), path = %path.display(), "saved document");
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<D> {
        if !path.exists() {
            return Err(Error::NotFound {
                kind: D::KIND,
                name: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let document = D::from_json(&content)?;
        debug!(kind = D::KIND, name = document.name(), path = %path.display(), "loaded document");
        Ok(document)
    }

    /// Saved documents as `(name, path)`, served from the cache while fresh.
    ///
    /// Files whose name cannot be read are listed under their file stem.
    pub fn list(&mut self) -> Result<Listing> {
        let dir = self.dir.clone();
        self.cache.get(|| scan_directory(&dir))
    }

    pub fn delete(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(Error::NotFound {
                kind: D::KIND,
                name: path.display().to_string(),
            });
        }

        fs::remove_file(path)?;
        self.cache.invalidate();

        info!(kind = D::KIND, path = %path.display(), "deleted document");
        Ok(())
    }

    /// Drops the cached listing so the next [`list`](Self::list) rescans.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }
}

fn scan_directory(dir: &Path) -> Result<Listing> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut listing = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_none_or(|extension| extension != "json") {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .and_then(|value| value.get("name").and_then(Value::as_str).map(ToOwned::to_owned))
            .unwrap_or(stem);

        listing.push((name, path));
    }

    listing.sort();
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;
    use crate::mapping::BoneMappingPreset;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::cell::Cell;

    #[test]
    fn given_unsafe_name_when_sanitizing_then_forbidden_chars_are_replaced() {
        assert_eq!(sanitize_filename("walk: left/right?"), "walk_ left_right_");
        assert_eq!(sanitize_filename("  ..idle.. "), "idle");
        assert_eq!(sanitize_filename("..."), "unnamed");
        assert_eq!(sanitize_filename(&"a".repeat(150)).chars().count(), 100);
    }

    #[test]
    fn given_fresh_cache_when_getting_twice_then_loader_runs_once() {
        let mut cache = ListingCache::new(Duration::from_secs(60));
        let calls = Cell::new(0);
        let loader = || {
            calls.set(calls.get() + 1);
            Ok::<_, std::io::Error>(vec![("walk".to_string(), PathBuf::from("walk.json"))])
        };

        let first = cache.get(loader).expect("listing");
        let second = cache.get(loader).expect("listing");

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);

        cache.invalidate();
        cache.get(loader).expect("listing");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn given_zero_ttl_when_getting_then_loader_runs_every_time() {
        let mut cache = ListingCache::new(Duration::ZERO);
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache
                .get(|| {
                    calls.set(calls.get() + 1);
                    Ok::<_, std::io::Error>(Vec::new())
                })
                .expect("listing");
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn given_saved_preset_when_loading_then_equal_preset_is_returned() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut library: JsonLibrary<BoneMappingPreset> = JsonLibrary::new(dir.path());
        let mut preset = BoneMappingPreset::new("mixamo/rigify", "Armature", "metarig");
        preset.add_mapping("mixamorig:Hips", "hips", 0.9).expect("valid mapping");

        let path = library.save(&mut preset, None).expect("saved");
        let loaded = library.load(&path).expect("loaded");

        assert_eq!(path, dir.path().join("mixamo_rigify.json"));
        assert_eq!(loaded, preset);
    }

    #[test]
    fn given_saved_documents_when_listing_then_names_are_sorted_and_cache_refreshes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut library: JsonLibrary<Clip> = JsonLibrary::new(dir.path());

        library.save(&mut Clip::new("walk", 1.0, 24.0), None).expect("saved");
        assert_eq!(library.list().expect("listing").len(), 1);

        library.save(&mut Clip::new("idle", 1.0, 60.0), None).expect("saved");
        fs::write(dir.path().join("broken.json"), "{ nope").expect("fixture written");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("fixture written");
        library.invalidate();

        let names: Vec<String> = library
            .list()
            .expect("listing")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["broken", "idle", "walk"]);
    }

    #[test]
    fn given_saved_clip_when_deleting_then_file_is_gone_and_second_delete_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut library: JsonLibrary<Clip> = JsonLibrary::new(dir.path());
        let path = library.save(&mut Clip::new("walk", 1.0, 24.0), None).expect("saved");

        library.delete(&path).expect("deleted");

        assert!(!path.exists());
        assert!(library.list().expect("listing").is_empty());
        assert!(matches!(
            library.delete(&path).unwrap_err(),
            Error::NotFound { kind: "animation", .. }
        ));
    }

    #[test]
    fn given_missing_file_when_loading_then_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let library: JsonLibrary<Clip> = JsonLibrary::new(dir.path());
        let err = library.load(&dir.path().join("ghost.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    proptest! {
        #[test]
        fn sanitized_names_never_contain_forbidden_chars(name in "\\PC{0,120}") {
            let sanitized = sanitize_filename(&name);
            prop_assert!(!sanitized.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
            prop_assert!(sanitized.chars().count() <= MAX_FILENAME_CHARS);
        }
    }
}
