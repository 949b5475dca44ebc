//! Run configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for one normalization run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct NormalizeConfig {
    /// Root directory to process.
    pub root: PathBuf,

    /// Preview only, never touch the filesystem.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,

    /// Only rename names that contain non-ASCII codepoints.
    #[builder(default = "false")]
    #[serde(default)]
    pub all_files: bool,

    /// Write a backup ledger of executed renames.
    #[builder(default = "false")]
    #[serde(default)]
    pub backup: bool,

    /// Overwrite an existing target instead of picking a disambiguated name.
    #[builder(default = "false")]
    #[serde(default)]
    pub force: bool,

    /// Suppress per-item narration.
    #[builder(default = "false")]
    #[serde(default)]
    pub quiet: bool,

    /// Collect and report statistics only.
    #[builder(default = "false")]
    #[serde(default)]
    pub stats_only: bool,
}

impl NormalizeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl NormalizeConfig {
    /// Create a new config builder.
    pub fn builder() -> NormalizeConfigBuilder {
        NormalizeConfigBuilder::default()
    }

    /// Create a default config for a root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
            all_files: false,
            backup: false,
            force: false,
            quiet: false,
            stats_only: false,
        }
    }

    /// Whether the run must leave the filesystem untouched.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || self.stats_only
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = NormalizeConfig::builder()
            .root("/home/user")
            .backup(true)
            .force(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert!(config.backup);
        assert!(config.force);
        assert!(!config.dry_run);
        assert!(!config.all_files);
    }

    #[test]
    fn test_config_builder_requires_root() {
        assert!(NormalizeConfig::builder().build().is_err());
        assert!(NormalizeConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_stats_only_implies_dry_run() {
        let mut config = NormalizeConfig::new("/test");
        assert!(!config.is_dry_run());

        config.stats_only = true;
        assert!(config.is_dry_run());

        config.stats_only = false;
        config.dry_run = true;
        assert!(config.is_dry_run());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: NormalizeConfig = serde_json::from_str(r#"{"root": "/data"}"#).unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert!(!config.force);
        assert!(!config.stats_only);
    }
}
