//! Linter settings, loadable from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::markers::MarkerAnnotator;
use crate::pool::BatchPool;

/// Tunables. Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintConfig {
    pub cache_ttl_secs: u64,
    pub library_batch_size: usize,
    pub library_batch_pause_ms: u64,
    pub marker_offset: f64,
    pub marker_size: f64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            library_batch_size: 5,
            library_batch_pause_ms: 50,
            marker_offset: 8.0,
            marker_size: 12.0,
        }
    }
}

impl LintConfig {
    /// Read a config file. Missing, unreadable or malformed files fall back
    /// to defaults with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(?err, ?path, "failed to parse config; using defaults");
                Self::default()
            }),
            Err(err) => {
                tracing::warn!(?err, ?path, "failed to read config; using defaults");
                Self::default()
            }
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn batch_pool(&self) -> BatchPool {
        BatchPool::new(self.library_batch_size, Duration::from_millis(self.library_batch_pause_ms))
    }

    pub fn annotator(&self) -> MarkerAnnotator {
        MarkerAnnotator::new(self.marker_offset, self.marker_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_defaults() {
        let cfg: LintConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, LintConfig::default());
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.batch_pool(), BatchPool::new(5, Duration::from_millis(50)));
    }

    #[test]
    fn test_partial_override() {
        let cfg: LintConfig = serde_json::from_str(r#"{"libraryBatchSize": 2, "cacheTtlSecs": 10}"#).unwrap();
        assert_eq!(cfg.library_batch_size, 2);
        assert_eq!(cfg.cache_ttl_secs, 10);
        assert_eq!(cfg.marker_size, 12.0);
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let cfg = LintConfig::load(Path::new("/nonexistent/tokenlint/config.json"));
        assert_eq!(cfg, LintConfig::default());
    }
}
