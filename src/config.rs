//! Configuration management for midi-locator
//!
//! Handles loading and validating the YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::locator::Locator;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: Backend,
    /// YAML topology file for the `file` backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<PathBuf>,
    /// Short names for frequently used locators
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, Locator>,
}

/// Where the device table comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Topology file if configured, else the platform table
    #[default]
    Auto,
    /// Live CoreMIDI table (macOS)
    #[value(name = "coremidi")]
    CoreMidi,
    /// midir port scan
    Ports,
    /// Fabricated topology from a YAML file
    File,
}

impl AppConfig {
    /// Load configuration from file with validation.
    ///
    /// A relative `topology` path is taken relative to the config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        if let (Some(topology), Some(dir)) = (&config.topology, path.parent()) {
            if topology.is_relative() {
                config.topology = Some(dir.join(topology));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.backend == Backend::File && self.topology.is_none() {
            anyhow::bail!("The 'file' backend requires a 'topology' path");
        }

        for name in self.aliases.keys() {
            if name.is_empty() {
                anyhow::bail!("Alias names cannot be empty");
            }
        }

        Ok(())
    }

    /// Expand `input` if it names an alias, otherwise return it unchanged
    pub fn expand_alias(&self, input: &str) -> String {
        match self.aliases.get(input) {
            Some(locator) => {
                debug!("Alias '{}' -> {}", input, locator);
                locator.to_string()
            }
            None => input.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
backend: file
topology: studio.yaml
aliases:
  keys: "Keystation::Port 1"
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.topology, Some(dir.path().join("studio.yaml")));
        assert_eq!(config.aliases["keys"], Locator::new("Keystation", "Port 1"));
    }

    #[test]
    fn test_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{}}").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend, Backend::Auto);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_file_backend_requires_topology() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "backend: file").unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("topology"));
    }

    #[test]
    fn test_malformed_alias_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "aliases:\n  keys: \"no delimiter\"").unwrap();

        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_expand_alias() {
        let mut config = AppConfig::default();
        config
            .aliases
            .insert("keys".to_string(), Locator::new("Keystation", "Port 1"));

        assert_eq!(config.expand_alias("keys"), "Keystation::Port 1");
        assert_eq!(config.expand_alias("Pads::Port 2"), "Pads::Port 2");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = AppConfig {
            backend: Backend::Ports,
            ..AppConfig::default()
        };
        config
            .aliases
            .insert("pads".to_string(), Locator::new("Launchpad", "MIDI"));
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }
}
