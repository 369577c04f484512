//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Pomodoro timer defaults
//! - Scheduler polling interval
//! - Manual session defaults
//!
//! Configuration is stored at `~/.config/redoubt/config.toml`. Missing
//! keys fall back to defaults, so hand-edited partial files stay valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::pomodoro::PomodoroConfig;

/// Pomodoro timer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroSection {
    #[serde(default = "default_work_min")]
    pub work_min: u32,
    #[serde(default = "default_short_break_min")]
    pub short_break_min: u32,
    #[serde(default = "default_long_break_min")]
    pub long_break_min: u32,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

/// Scheduler polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSection {
    /// Seconds between schedule evaluations.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Manual session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_duration_min")]
    pub default_duration_min: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/redoubt/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroSection,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub session: SessionSection,
}

// Default functions
fn default_work_min() -> u32 {
    25
}
fn default_short_break_min() -> u32 {
    5
}
fn default_long_break_min() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_duration_min() -> i64 {
    25
}
fn default_true() -> bool {
    true
}

impl Default for PomodoroSection {
    fn default() -> Self {
        Self {
            work_min: default_work_min(),
            short_break_min: default_short_break_min(),
            long_break_min: default_long_break_min(),
            sessions_until_long_break: default_sessions_until_long_break(),
            sound_enabled: default_true(),
        }
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            default_duration_min: default_duration_min(),
        }
    }
}

impl Config {
    /// Path of the configuration file.
    pub fn path() -> Result<PathBuf, std::io::Error> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file
    /// is missing.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Save the configuration.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Initial Pomodoro engine configuration from this file.
    pub fn pomodoro_config(&self) -> PomodoroConfig {
        PomodoroConfig {
            work_min: self.pomodoro.work_min,
            short_break_min: self.pomodoro.short_break_min,
            long_break_min: self.pomodoro.long_break_min,
            sessions_until_long_break: self.pomodoro.sessions_until_long_break.max(1),
            sound_enabled: self.pomodoro.sound_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let config = Config::default();
        assert_eq!(config.pomodoro.work_min, 25);
        assert_eq!(config.pomodoro.short_break_min, 5);
        assert_eq!(config.pomodoro.long_break_min, 15);
        assert_eq!(config.pomodoro.sessions_until_long_break, 4);
        assert_eq!(config.scheduler.poll_interval_secs, 30);
    }

    #[test]
    fn partial_toml_fills_missing_keys() {
        let config: Config = toml::from_str(
            "[pomodoro]\nwork_min = 50\n\n[scheduler]\npoll_interval_secs = 60\n",
        )
        .unwrap();
        assert_eq!(config.pomodoro.work_min, 50);
        assert_eq!(config.pomodoro.short_break_min, 5);
        assert_eq!(config.scheduler.poll_interval_secs, 60);
        assert_eq!(config.session.default_duration_min, 25);
    }

    #[test]
    fn zero_long_break_cadence_is_clamped() {
        let config: Config =
            toml::from_str("[pomodoro]\nsessions_until_long_break = 0\n").unwrap();
        assert_eq!(config.pomodoro_config().sessions_until_long_break, 1);
    }
}
