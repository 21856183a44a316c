//! Expansion of the configured asset globs into concrete files.

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Invalid asset pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Assets not found: {0}")]
    NotFound(String),
}

/// Expands a single pattern into the regular files it matches.
pub fn normalize_path(pattern: &str) -> Result<Vec<PathBuf>, AssetError> {
    let matched: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|source| AssetError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    if matched.is_empty() {
        return Err(AssetError::NotFound(pattern.to_string()));
    }
    Ok(matched)
}

/// Expands every pattern in order. Patterns that fail are logged and skipped;
/// a file matched by several patterns is kept once, at its first position.
pub fn plain_assets<S: AsRef<str>>(patterns: &[S]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut assets = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        match normalize_path(pattern) {
            Ok(paths) => {
                info!(pattern, matches = paths.len(), "Resolved asset pattern");
                for path in paths {
                    if seen.insert(path.clone()) {
                        assets.push(path);
                    }
                }
            }
            Err(e) => warn!(pattern, error = %e, "Skipping asset pattern"),
        }
    }

    assets
}
