//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Phase durations (in seconds) and the number of pomodoros before a long break
//! - An optional explicit cycle overriding the generated one
//! - Notification preferences (bell, sound file)
//!
//! Configuration is stored at `~/.config/tomato/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::{validate_sequence, Phase, PhaseKind, PhaseSequence};

/// Schedule-specific configuration. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: i64,
    #[serde(default = "default_short_break")]
    pub short_break: i64,
    #[serde(default = "default_long_break")]
    pub long_break: i64,
    #[serde(default = "default_pomodoros_before_long_break")]
    pub pomodoros_before_long_break: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell at each phase boundary.
    #[serde(default = "default_true")]
    pub bell: bool,
    /// Sound played at each phase boundary by hosts that support audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<String>,
}

/// One entry of an explicit cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub kind: PhaseKind,
    pub duration: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tomato/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Explicit cycle, used instead of the one generated from `schedule`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_cycle: Option<Vec<PhaseConfig>>,
}

/// Validated settings handed to a [`CycleTimer`](crate::timer::CycleTimer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    pub phases: Vec<Phase>,
    pub notifications_enabled: bool,
    pub bell: bool,
    pub sound_file: Option<PathBuf>,
}

impl CycleSettings {
    pub fn sequence(&self) -> PhaseSequence {
        self.phases.iter().copied().collect()
    }

    /// Reject phases a [`CycleTimer`](crate::timer::CycleTimer) could not
    /// be built from.
    pub fn validate(&self) -> Result<()> {
        validate_sequence(&self.sequence())
    }
}

// Default functions
fn default_focus_duration() -> i64 {
    25 * 60
}
fn default_short_break() -> i64 {
    5 * 60
}
fn default_long_break() -> i64 {
    15 * 60
}
fn default_pomodoros_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            pomodoros_before_long_break: default_pomodoros_before_long_break(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
            sound_file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            notifications: NotificationsConfig::default(),
            custom_cycle: None,
        }
    }
}

fn seconds(key: &str, value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("duration must not be negative, got {value}"),
    })
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let new_value = match obj.get(part) {
                    Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    Some(serde_json::Value::Number(_)) => {
                        let n = value
                            .parse::<i64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                        serde_json::Value::Number(n.into())
                    }
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    Some(serde_json::Value::String(_)) => serde_json::Value::String(value.into()),
                    // Optional fields serialize as absent; accept JSON, else a plain string.
                    Some(serde_json::Value::Null) | None if Self::is_optional_key(key) => {
                        serde_json::from_str(value)
                            .unwrap_or_else(|_| serde_json::Value::String(value.into()))
                    }
                    _ => return Err(unknown()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn is_optional_key(key: &str) -> bool {
        matches!(key, "custom_cycle" | "notifications.sound_file")
    }

    /// Default location, `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&Self::path()?)?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "writing default config");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        Ok(self.save_to(&Self::path()?)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, typed after the current value.
    ///
    /// Does not persist; call [`Config::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// The configured cycle: `custom_cycle` if set, otherwise
    /// `pomodoros_before_long_break` focus phases, each followed by a short
    /// break except the last, which is followed by a long break.
    pub fn phases(&self) -> Result<Vec<Phase>, ConfigError> {
        if let Some(ref custom) = self.custom_cycle {
            return custom
                .iter()
                .enumerate()
                .map(|(i, p)| -> Result<Phase, ConfigError> {
                    let key = format!("custom_cycle[{i}].duration");
                    Ok(Phase::new(p.kind, seconds(&key, p.duration)?))
                })
                .collect();
        }

        let focus = seconds("schedule.focus_duration", self.schedule.focus_duration)?;
        let short_break = seconds("schedule.short_break", self.schedule.short_break)?;
        let long_break = seconds("schedule.long_break", self.schedule.long_break)?;
        let pomodoros = self.schedule.pomodoros_before_long_break;

        let mut phases = Vec::new();
        for i in 0..pomodoros {
            phases.push(Phase::new(PhaseKind::Focus, focus));
            if i + 1 == pomodoros {
                phases.push(Phase::new(PhaseKind::LongBreak, long_break));
            } else {
                phases.push(Phase::new(PhaseKind::ShortBreak, short_break));
            }
        }
        Ok(phases)
    }

    /// Validate and extract the settings a cycle is built from.
    pub fn settings(&self) -> Result<CycleSettings, ConfigError> {
        Ok(CycleSettings {
            phases: self.phases()?,
            notifications_enabled: self.notifications.enabled,
            bell: self.notifications.bell,
            sound_file: self.notifications.sound_file.as_ref().map(PathBuf::from),
        })
    }
}
