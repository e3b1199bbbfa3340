//! Loading, enriching and saving collections of recipes.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::enrichment::Enricher;
use crate::recipe::Recipe;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} must contain a recipe object or an array of recipes")]
    UnexpectedShape { path: PathBuf },
}

/// A recipe that could not be enriched.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub title: String,
    pub error: String,
}

/// Result of enriching a batch of recipes.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub enriched: Vec<Recipe>,
    pub failures: Vec<BatchFailure>,
}

/// Load recipes from a JSON file holding an array or a single object.
///
/// Array items that are not valid recipes are skipped with a warning.
pub fn load_recipes(path: &Path) -> Result<Vec<Recipe>, BatchError> {
    let content = fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|source| BatchError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        _ => {
            return Err(BatchError::UnexpectedShape {
                path: path.to_path_buf(),
            })
        }
    };

    let total = items.len();
    let recipes: Vec<Recipe> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Recipe>(item) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping invalid recipe");
                None
            }
        })
        .collect();

    tracing::info!(
        path = %path.display(),
        loaded = recipes.len(),
        skipped = total - recipes.len(),
        "Loaded recipes"
    );

    Ok(recipes)
}

/// Write recipes as a pretty-printed JSON array, creating parent directories.
pub fn save_recipes(path: &Path, recipes: &[Recipe]) -> Result<(), BatchError> {
    let io_err = |source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(recipes).map_err(|source| BatchError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)?;

    tracing::info!(path = %path.display(), count = recipes.len(), "Saved recipes");
    Ok(())
}

/// Enrich recipes one at a time, continuing on failures.
pub async fn enrich_all(enricher: &Enricher, recipes: Vec<Recipe>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for mut recipe in recipes {
        match enricher.enrich_recipe(&mut recipe).await {
            Ok(_) => outcome.enriched.push(recipe),
            Err(e) => {
                tracing::error!(recipe = %recipe.title, error = %e, "Failed to enrich recipe");
                outcome.failures.push(BatchFailure {
                    title: recipe.title,
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}
