// src/config.rs

use std::{env, path::PathBuf};
use tracing::{debug, warn};

use crate::error::ReportError;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const CHARTS_DIR_VAR: &str = "SHOPREPORT_CHARTS_DIR";
pub const EXPORTS_DIR_VAR: &str = "SHOPREPORT_EXPORTS_DIR";

/// Process configuration, read once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Connection string; `None` when unset or blank.
    pub database_url: Option<String>,
    pub charts_dir: PathBuf,
    pub exports_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            charts_dir: PathBuf::from("charts"),
            exports_dir: PathBuf::from("exports"),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("ignoring unreadable environment file: {}", e),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            database_url: non_blank(DATABASE_URL_VAR),
            charts_dir: non_blank(CHARTS_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.charts_dir),
            exports_dir: non_blank(EXPORTS_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.exports_dir),
        }
    }

    pub fn database_url(&self) -> Result<&str, ReportError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ReportError::Config(format!("{} is not set", DATABASE_URL_VAR)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = Config::from_lookup(lookup_from(&[]));
        assert_eq!(cfg, Config::default());
        assert!(matches!(cfg.database_url(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_blank_url_counts_as_unset() {
        let cfg = Config::from_lookup(lookup_from(&[(DATABASE_URL_VAR, "   ")]));
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "duckdb://memory"),
            (CHARTS_DIR_VAR, "out/img"),
            (EXPORTS_DIR_VAR, "out/xlsx"),
        ]));
        assert_eq!(cfg.database_url().unwrap(), "duckdb://memory");
        assert_eq!(cfg.charts_dir, PathBuf::from("out/img"));
        assert_eq!(cfg.exports_dir, PathBuf::from("out/xlsx"));
    }
}
