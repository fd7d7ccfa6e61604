//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `minibar.toml` (or the path given with `--config`). Every section
//! has a sensible default so the file is optional. Environment variables
//! take precedence over file values. Sound files referenced by actions are
//! resolved relative to the configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use minibar_adapter_virtual::VirtualConfig;
use minibar_domain::error::{MiniBarError, NotFoundError};
use minibar_domain::event_action::{
    AudioFile, EventAction, PlayAudioAction, RunPumpAction,
};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Device backend selection.
    pub backend: BackendConfig,
    /// Named actions that can be triggered.
    pub actions: BTreeMap<String, ActionConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Which hardware backend the engine drives.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// `virtual` or `cpal`.
    pub kind: String,
    /// Simulated devices used by the `virtual` backend; the demo set when
    /// the section is absent.
    #[serde(rename = "virtual", default = "VirtualConfig::demo")]
    pub virtual_devices: VirtualConfig,
}

/// Known backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Virtual,
    Cpal,
}

/// A configured action, as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    PlayAudio {
        sound_device: String,
        /// Name shown in descriptions; defaults to the file name of `file_path`.
        #[serde(default)]
        file_name: Option<String>,
        file_path: PathBuf,
        #[serde(default = "full_power")]
        volume: u16,
        #[serde(default)]
        on_repeat: bool,
    },
    RunPump {
        pump_device: String,
        #[serde(default = "full_power")]
        power: u16,
        duration_ms: u64,
    },
}

fn full_power() -> u16 {
    100
}

impl ActionConfig {
    /// Build the domain action around the given sound file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBarError::Validation`] when the action is invalid.
    pub fn to_action(&self, file: AudioFile) -> Result<EventAction, MiniBarError> {
        match self {
            Self::PlayAudio {
                sound_device,
                file_name,
                file_path,
                volume,
                on_repeat,
            } => {
                let file_name = file_name.clone().unwrap_or_else(|| {
                    file_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                });
                Ok(PlayAudioAction::builder()
                    .sound_device(sound_device)
                    .file_name(file_name)
                    .file(file)
                    .volume(*volume)
                    .on_repeat(*on_repeat)
                    .build()?
                    .into())
            }
            Self::RunPump {
                pump_device,
                power,
                duration_ms,
            } => Ok(RunPumpAction::builder()
                .pump_device(pump_device)
                .power(*power)
                .duration_ms(*duration_ms)
                .build()?
                .into()),
        }
    }
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Self>(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// `RUST_LOG` wins over `MINIBAR_LOG`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("MINIBAR_BACKEND") {
            self.backend.kind = val;
        }
        if let Some(val) = var("MINIBAR_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.backend_kind()?;
        for speaker in &self.backend.virtual_devices.speakers {
            if speaker.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "virtual speaker name must not be empty".to_string(),
                ));
            }
        }
        for pump in &self.backend.virtual_devices.pumps {
            if pump.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "virtual pump name must not be empty".to_string(),
                ));
            }
        }
        for (name, action) in &self.actions {
            if let ActionConfig::PlayAudio { file_path, .. } = action
                && file_path.as_os_str().is_empty()
            {
                return Err(ConfigError::Validation(format!(
                    "action {name:?} has no file_path"
                )));
            }
            action
                .to_action(AudioFile::default())
                .map_err(|source| ConfigError::InvalidAction {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// The configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown kind, or for `cpal`
    /// when built without the `cpal` feature.
    pub fn backend_kind(&self) -> Result<BackendKind, ConfigError> {
        match self.backend.kind.as_str() {
            "virtual" => Ok(BackendKind::Virtual),
            "cpal" if cfg!(feature = "cpal") => Ok(BackendKind::Cpal),
            "cpal" => Err(ConfigError::Validation(
                "backend \"cpal\" requires building with the `cpal` feature".to_string(),
            )),
            other => Err(ConfigError::Validation(format!(
                "unknown backend {other:?}"
            ))),
        }
    }

    /// Resolve the action named `name`, reading its sound file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Action`] when no such action is configured and
    /// [`ConfigError::SoundFile`] when its sound file cannot be read.
    pub fn action(&self, name: &str) -> Result<EventAction, ConfigError> {
        let config = self.actions.get(name).ok_or_else(|| {
            MiniBarError::from(NotFoundError {
                entity: "action",
                id: name.to_string(),
            })
        })?;
        let file = match config {
            ActionConfig::PlayAudio { file_path, .. } => {
                let path = self.base_dir.join(file_path);
                let bytes = std::fs::read(&path)
                    .map_err(|source| ConfigError::SoundFile { path, source })?;
                AudioFile::new(bytes)
            }
            ActionConfig::RunPump { .. } => AudioFile::default(),
        };
        config
            .to_action(file)
            .map_err(|source| ConfigError::InvalidAction {
                name: name.to_string(),
                source,
            })
    }

    /// Path of the sound file used by the action named `name`, if any.
    #[must_use]
    pub fn sound_file(&self, name: &str) -> Option<PathBuf> {
        match self.actions.get(name)? {
            ActionConfig::PlayAudio { file_path, .. } => Some(self.base_dir.join(file_path)),
            ActionConfig::RunPump { .. } => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "minibard=info,minibar_app=info,minibar_adapter_virtual=info,minibar_adapter_audio=info"
                .to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: "virtual".to_string(),
            virtual_devices: VirtualConfig::demo(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// A configured action does not satisfy the domain invariants.
    #[error("invalid action {name:?}")]
    InvalidAction {
        name: String,
        #[source]
        source: MiniBarError,
    },
    /// Lookup of a configured action failed.
    #[error("action lookup failed")]
    Action(#[from] MiniBarError),
    /// A referenced sound file could not be read.
    #[error("failed to read sound file {path:?}")]
    SoundFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
