//! Recording Configuration Module
//!
//! Loads recorder, replay and logging settings from TOML with
//! environment-specific overrides and `TXP_` environment variables.
//!
//! ```toml
//! [recorder]
//! enabled = true
//! directory = "${TXP_DATA}/recordings"
//! file_prefix = "scenario"
//!
//! [replay]
//! default_mode = "until-mutation"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every section and field is optional; missing values take the defaults
//! below. Environment variables use a double underscore between the section
//! and the field: `TXP_RECORDER__FILE_PREFIX=nightly`.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::protocol::limits;

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/recording.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "TXP";

/// Complete recording configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    /// Where and how transmissions are recorded
    pub recorder: RecorderSettings,

    /// How recordings are played back
    pub replay: ReplaySettings,

    /// Log output
    pub logging: LoggingSettings,
}

/// Recorder settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RecorderSettings {
    pub enabled: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Flush and fsync after every append
    pub sync_every_append: bool,
    pub max_entry_bytes: usize,
}

/// Replay settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReplaySettings {
    /// One of `all`, `until-mutation`, `until-login`, `skip-login`
    pub default_mode: String,
    /// Fail when recorded sequence numbers are not contiguous
    pub verify_sequence: bool,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("./recordings"),
            file_prefix: "transmissions".to_string(),
            sync_every_append: false,
            max_entry_bytes: limits::MAX_RECORDED_ENTRY_BYTES,
        }
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            default_mode: "all".to_string(),
            verify_sequence: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RecordingConfig {
    /// Load configuration from files with environment overrides
    ///
    /// An explicit `base_path` must exist. Without one, `config/recording.toml`
    /// is used when present and defaults apply otherwise. Environment files
    /// are looked up in an `environments/` directory next to the base file.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let mut builder = Config::builder().add_source(File::from(base.as_path()).required(required));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (TXP_ prefix)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let loaded: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        debug!(?loaded, "recording configuration loaded");
        Ok(loaded)
    }

    /// Parse configuration from a TOML string, without file or environment layering
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse recording configuration")
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let raw = self.recorder.directory.to_string_lossy().into_owned();
        let expanded =
            shellexpand::env(&raw).context("Failed to expand recorder directory")?;
        self.recorder.directory = PathBuf::from(expanded.as_ref());
        Ok(())
    }

    /// Path of a recording log inside the configured directory
    pub fn recording_path(&self, stem: &str) -> PathBuf {
        self.recorder.directory.join(format!(
            "{}-{}.{}",
            self.recorder.file_prefix,
            stem,
            crate::protocol::recording::LOG_EXTENSION
        ))
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(base_path: Option<&Path>, environment: Option<&str>) -> Result<RecordingConfig> {
    let mut config = RecordingConfig::load(base_path, environment)?;
    config.expand_env_vars()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("recording.toml");

        let config_content = r#"
[recorder]
enabled = true
directory = "/var/lib/txp"
file_prefix = "plant-a"

[replay]
default_mode = "until-login"
verify_sequence = false

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = RecordingConfig::load(Some(&config_path), None).unwrap();

        assert!(config.recorder.enabled);
        assert_eq!(config.recorder.directory, PathBuf::from("/var/lib/txp"));
        assert_eq!(config.recorder.file_prefix, "plant-a");
        assert_eq!(config.recorder.max_entry_bytes, limits::MAX_RECORDED_ENTRY_BYTES);
        assert_eq!(config.replay.default_mode, "until-login");
        assert!(!config.replay.verify_sequence);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config = RecordingConfig::from_toml_str("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(config.recorder, RecorderSettings::default());
        assert_eq!(config.replay, ReplaySettings::default());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_environment_override_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("recording.toml");
        fs::write(&config_path, "[recorder]\nenabled = false\nfile_prefix = \"base\"\n").unwrap();

        let env_dir = dir.path().join("environments");
        fs::create_dir_all(&env_dir).unwrap();
        fs::write(env_dir.join("production.toml"), "[recorder]\nenabled = true\n").unwrap();

        let config = RecordingConfig::load(Some(&config_path), Some("production")).unwrap();
        assert!(config.recorder.enabled);
        assert_eq!(config.recorder.file_prefix, "base");
    }

    #[test]
    fn test_explicit_base_path_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(RecordingConfig::load(Some(&missing), None).is_err());
    }

    #[test]
    fn test_recording_path() {
        let mut config = RecordingConfig::default();
        config.recorder.directory = PathBuf::from("/data");
        config.recorder.file_prefix = "plant".to_string();
        assert_eq!(
            config.recording_path("2024-03-01"),
            PathBuf::from("/data/plant-2024-03-01.txrec")
        );
    }

    #[test]
    fn test_expand_env_vars_leaves_plain_paths() {
        let mut config = RecordingConfig::default();
        config.recorder.directory = PathBuf::from("/plain/path");
        config.expand_env_vars().unwrap();
        assert_eq!(config.recorder.directory, PathBuf::from("/plain/path"));
    }
}
