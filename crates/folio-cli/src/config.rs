//! YAML configuration for the `folio` binary.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use folio_core::SiteDescriptor;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Values read from `--config`. Missing keys keep their defaults and
/// command-line flags win over anything set here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub theme: Option<String>,
    pub origin: Option<String>,
    pub log_level: String,
    pub standalone: bool,
    pub sanitize: bool,
    pub fold_escaped_newlines: bool,
    pub sites: Vec<SiteDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: None,
            origin: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            standalone: true,
            sanitize: true,
            fold_escaped_newlines: true,
            sites: Vec::new(),
        }
    }
}

impl Config {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("failed to parse config YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        debug!(path = %path.display(), sites = config.sites.len(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use folio_core::LinkCategory;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").expect("parse");
        assert!(config.standalone);
        assert!(config.sanitize);
        assert!(config.fold_escaped_newlines);
        assert_eq!(config.log_level, "warn");
        assert!(config.sites.is_empty());
    }

    #[test]
    fn sites_and_overrides_are_read() {
        let raw = "theme: dark\norigin: https://me.dev\nsanitize: false\nsites:\n  - domain: notes.example.org\n    category: blog\n    label: Notes\n";
        let config = Config::parse(raw).expect("parse");
        assert_eq!(config.theme.as_deref(), Some("dark"));
        assert_eq!(config.origin.as_deref(), Some("https://me.dev"));
        assert!(!config.sanitize);
        assert!(config.standalone);
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].category, LinkCategory::Blog);
        assert_eq!(config.sites[0].label, "Notes");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("colour: red\n").is_err());
    }
}
