//! Disk-based enrichment cache keyed on recipe content.
//!
//! The cache is best-effort: read failures look like misses and write
//! failures are logged, so enrichment never fails because of the cache.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::recipe::Recipe;

/// Characters that cannot appear in a cache file name.
const FORBIDDEN_KEY_CHARS: &[char] = &[' ', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Disk-based cache of repaired enrichment payloads.
///
/// One file per entry: `{cache_dir}/{key}.json`. Entries whose recipe content
/// changed are orphaned rather than evicted.
#[derive(Debug, Clone)]
pub struct RecipeCache {
    cache_dir: PathBuf,
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub cached_entries: usize,
}

impl RecipeCache {
    /// Create a new cache with the given directory.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Get the default cache directory: ~/.tadka/cache
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".tadka").join("cache"))
            .unwrap_or_else(|| PathBuf::from("enriched_recipes/cache"))
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache key for a recipe under the given model identifier.
    ///
    /// Only title, ingredients, instructions and text take part, so two recipes
    /// that agree on those share an entry whatever their other fields say.
    pub fn key_for(recipe: &Recipe, model_id: &str) -> String {
        let raw = format!(
            "{}_{}_{}",
            recipe.title,
            content_fingerprint(recipe),
            model_id
        );
        sanitize_key(&raw)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Get a cached payload if one exists and decodes.
    pub fn get(&self, recipe: &Recipe, model_id: &str) -> Option<Value> {
        let path = self.entry_path(&Self::key_for(recipe, model_id));

        if !path.exists() {
            tracing::debug!(recipe = %recipe.title, model = model_id, "Enrichment cache miss");
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(payload) => {
                tracing::info!(recipe = %recipe.title, model = model_id, "Enrichment cache hit");
                Some(payload)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to decode cache entry");
                None
            }
        }
    }

    /// Store a payload. Returns false (after logging) if it could not be written.
    pub fn set(&self, recipe: &Recipe, model_id: &str, payload: &Value) -> bool {
        let path = self.entry_path(&Self::key_for(recipe, model_id));

        match self.write_entry(&path, payload) {
            Ok(()) => {
                tracing::info!(recipe = %recipe.title, model = model_id, "Cached enrichment payload");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write cache entry");
                false
            }
        }
    }

    fn write_entry(&self, path: &Path, payload: &Value) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(path, json)
    }

    /// Remove every cached entry. Returns false (after logging) on failure.
    pub fn clear(&self) -> bool {
        match self.remove_entries() {
            Ok(removed) => {
                tracing::info!(removed, "Enrichment cache cleared");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear enrichment cache");
                false
            }
        }
    }

    fn remove_entries(&self) -> std::io::Result<usize> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if is_entry_file(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        if let Ok(entries) = fs::read_dir(&self.cache_dir) {
            stats.cached_entries = entries
                .filter_map(|e| e.ok())
                .filter(|e| is_entry_file(&e.path()))
                .count();
        }

        stats
    }
}

fn is_entry_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "json")
}

/// Digest of the content-bearing recipe fields.
///
/// The fields are serialized as a JSON object with sorted keys, then hashed
/// with SHA-256; the first 16 bytes (32 hex chars) keep file names short.
pub fn content_fingerprint(recipe: &Recipe) -> String {
    let canonical = json!({
        "ingredients": recipe.ingredients,
        "instructions": recipe.instructions,
        "text": recipe.text,
        "title": recipe.title,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    let result = hasher.finalize();

    hex::encode(&result[..16])
}

fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| if FORBIDDEN_KEY_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
