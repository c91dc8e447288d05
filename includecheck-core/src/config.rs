//! Configuration loading from includecheck.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Main configuration structure for includecheck.toml.
#[derive(Debug, Deserialize, Default)]
pub struct IncludeCheckConfig {
    /// Header-name patterns never to diagnose.
    pub ignore: Option<Vec<String>>,
    /// Extra directories to resolve includes against, relative to the
    /// directory containing includecheck.toml.
    pub search_paths: Option<Vec<String>>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

impl IncludeCheckConfig {
    /// The configured search directories, resolved against `root`.
    pub fn search_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .flatten()
            .map(|p| root.join(p))
            .collect()
    }
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

/// Loads configuration from includecheck.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<IncludeCheckConfig>> {
    let path = root.join("includecheck.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let cfg = toml::from_str(&content).context("Invalid includecheck.toml")?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let cfg: IncludeCheckConfig = toml::from_str(
            "ignore = [\"*Generated.h\"]\n[output]\nformat = \"json\"\n",
        )
        .unwrap();
        assert_eq!(cfg.ignore.unwrap(), vec!["*Generated.h"]);
        assert_eq!(cfg.output.unwrap().format.as_deref(), Some("json"));
    }

    #[test]
    fn test_search_paths_resolve_against_root() {
        let cfg: IncludeCheckConfig =
            toml::from_str("search_paths = [\"Vendor\", \"Shared/Headers\"]\n").unwrap();
        let dirs = cfg.search_dirs(Path::new("/proj"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/proj/Vendor"),
                PathBuf::from("/proj/Shared/Headers")
            ]
        );

        let empty = IncludeCheckConfig::default();
        assert!(empty.search_dirs(Path::new("/proj")).is_empty());
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = std::env::temp_dir().join("includecheck_no_config_here");
        fs::create_dir_all(&dir).unwrap();
        assert!(load_config(&dir).unwrap().is_none());
    }
}
