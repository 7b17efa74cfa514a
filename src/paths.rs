//! Configuration file location.
//!
//! ## Lookup order
//!
//! 1. `MIDI_LOCATOR_CONFIG` environment variable
//! 2. `config.yaml` in the current working directory
//! 3. `config.yaml` under the user config directory
//!    (`~/.config/midi-locator` on Linux,
//!    `~/Library/Application Support/midi-locator` on macOS)
//!
//! The file does not need to exist; a missing file means defaults.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the user config directory
const APP_NAME: &str = "midi-locator";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "MIDI_LOCATOR_CONFIG";

const CONFIG_FILE: &str = "config.yaml";

/// How the config path was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Env,
    WorkingDir,
    UserConfigDir,
}

/// Application paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    pub source: ConfigSource,
}

impl AppPaths {
    /// Detect the config path from the process environment
    pub fn detect() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let paths = Self::detect_from(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            &cwd,
            dirs::config_dir(),
        );
        debug!(
            "Config path: {} ({:?})",
            paths.config.display(),
            paths.source
        );
        paths
    }

    fn detect_from(env: Option<PathBuf>, cwd: &Path, config_dir: Option<PathBuf>) -> Self {
        if let Some(config) = env.filter(|p| !p.as_os_str().is_empty()) {
            return Self {
                config,
                source: ConfigSource::Env,
            };
        }

        let cwd_config = cwd.join(CONFIG_FILE);
        if cwd_config.exists() {
            return Self {
                config: cwd_config,
                source: ConfigSource::WorkingDir,
            };
        }

        match config_dir {
            Some(dir) => Self {
                config: dir.join(APP_NAME).join(CONFIG_FILE),
                source: ConfigSource::UserConfigDir,
            },
            // No user config dir on this platform: fall back to the cwd
            None => Self {
                config: cwd_config,
                source: ConfigSource::WorkingDir,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_env_wins() {
        let cwd = tempdir().unwrap();
        std::fs::write(cwd.path().join(CONFIG_FILE), "{}").unwrap();

        let paths = AppPaths::detect_from(
            Some(PathBuf::from("/etc/midi.yaml")),
            cwd.path(),
            Some(PathBuf::from("/home/me/.config")),
        );
        assert_eq!(paths.config, PathBuf::from("/etc/midi.yaml"));
        assert_eq!(paths.source, ConfigSource::Env);
    }

    #[test]
    fn test_working_dir_config() {
        let cwd = tempdir().unwrap();
        std::fs::write(cwd.path().join(CONFIG_FILE), "{}").unwrap();

        let paths = AppPaths::detect_from(None, cwd.path(), Some(PathBuf::from("/cfg")));
        assert_eq!(paths.config, cwd.path().join(CONFIG_FILE));
        assert_eq!(paths.source, ConfigSource::WorkingDir);
    }

    #[test]
    fn test_user_config_dir() {
        let cwd = tempdir().unwrap();

        let paths = AppPaths::detect_from(
            Some(PathBuf::new()),
            cwd.path(),
            Some(PathBuf::from("/cfg")),
        );
        assert_eq!(paths.config, PathBuf::from("/cfg/midi-locator/config.yaml"));
        assert_eq!(paths.source, ConfigSource::UserConfigDir);
    }

    #[test]
    fn test_no_config_dir_falls_back_to_cwd() {
        let cwd = tempdir().unwrap();

        let paths = AppPaths::detect_from(None, cwd.path(), None);
        assert_eq!(paths.config, cwd.path().join(CONFIG_FILE));
    }
}
