//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Sound on/off for start and end tones
//! - Detector sensitivity (acceleration and time thresholds)
//! - Last frequency challenge target
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result, ValidationError};
use crate::sensor::Sensitivity;

pub const DEFAULT_ACCELERATION_THRESHOLD: f64 = 1.4;
pub const DEFAULT_TIME_THRESHOLD: f64 = 0.45;
pub const ACCELERATION_RANGE: (f64, f64) = (0.1, 5.0);
pub const ACCELERATION_STEP: f64 = 0.1;
pub const TIME_RANGE: (f64, f64) = (0.01, 1.0);
pub const TIME_STEP: f64 = 0.01;
pub const FREQUENCY_TARGET_RANGE: (u32, u32) = (1, 30);
/// Stored thresholds keep two decimals.
pub const THRESHOLD_PRECISION: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityConfig {
    #[serde(default = "default_acceleration_threshold")]
    pub acceleration_threshold: f64,
    /// Seconds between two accepted shakes.
    #[serde(default = "default_time_threshold")]
    pub time_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "default_frequency_target")]
    pub frequency_target: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
}

fn default_true() -> bool {
    true
}
fn default_acceleration_threshold() -> f64 {
    DEFAULT_ACCELERATION_THRESHOLD
}
fn default_time_threshold() -> f64 {
    DEFAULT_TIME_THRESHOLD
}
fn default_frequency_target() -> u32 {
    1
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            acceleration_threshold: default_acceleration_threshold(),
            time_threshold: default_time_threshold(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            frequency_target: default_frequency_target(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sound: SoundConfig::default(),
            sensitivity: SensitivityConfig::default(),
            challenge: ChallengeConfig::default(),
        }
    }
}

/// Round away float noise left by repeated nudging.
fn round_to(value: f64, step: f64) -> f64 {
    let decimals = (1.0 / step).round();
    (value * decimals).round() / decimals
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value < min || value > max || !value.is_finite() {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        }
        .into());
    }
    Ok(())
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
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check every ranged value.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "sensitivity.acceleration_threshold",
            self.sensitivity.acceleration_threshold,
            ACCELERATION_RANGE,
        )?;
        check_range(
            "sensitivity.time_threshold",
            self.sensitivity.time_threshold,
            TIME_RANGE,
        )?;
        let (min, max) = FREQUENCY_TARGET_RANGE;
        check_range(
            "challenge.frequency_target",
            self.challenge.frequency_target as f64,
            (min as f64, max as f64),
        )?;
        Ok(())
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound.enabled
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.sound.enabled = !self.sound.enabled;
        self.sound.enabled
    }

    /// Detector tuning currently in effect.
    pub fn sensitivity(&self) -> Sensitivity {
        Sensitivity::new(
            self.sensitivity.acceleration_threshold as f32,
            self.sensitivity.time_threshold as f32,
        )
    }

    /// Restore the default thresholds.
    pub fn reset_sensitivity(&mut self) {
        self.sensitivity = SensitivityConfig::default();
    }

    /// Adopt a calibration suggestion, clamped into the adjustable range.
    pub fn apply_suggestion(&mut self, suggestion: Sensitivity) {
        let (amin, amax) = ACCELERATION_RANGE;
        let (tmin, tmax) = TIME_RANGE;
        let acceleration = (suggestion.acceleration_threshold as f64).clamp(amin, amax);
        let time = (suggestion.time_threshold as f64).clamp(tmin, tmax);
        self.sensitivity.acceleration_threshold = round_to(acceleration, THRESHOLD_PRECISION);
        self.sensitivity.time_threshold = round_to(time, THRESHOLD_PRECISION);
    }

    /// Move the acceleration threshold by whole steps of 0.1.
    pub fn nudge_acceleration(&mut self, steps: i32) -> f64 {
        let (min, max) = ACCELERATION_RANGE;
        let next = self.sensitivity.acceleration_threshold + steps as f64 * ACCELERATION_STEP;
        self.sensitivity.acceleration_threshold =
            round_to(next.clamp(min, max), THRESHOLD_PRECISION);
        self.sensitivity.acceleration_threshold
    }

    /// Move the time threshold by whole steps of 0.01 s.
    pub fn nudge_time(&mut self, steps: i32) -> f64 {
        let (min, max) = TIME_RANGE;
        let next = self.sensitivity.time_threshold + steps as f64 * TIME_STEP;
        self.sensitivity.time_threshold = round_to(next.clamp(min, max), THRESHOLD_PRECISION);
        self.sensitivity.time_threshold
    }

    /// Move the frequency target by whole shakes per second.
    pub fn nudge_frequency_target(&mut self, steps: i32) -> u32 {
        let (min, max) = FREQUENCY_TARGET_RANGE;
        let next = (self.challenge.frequency_target as i64 + steps as i64)
            .clamp(min as i64, max as i64);
        self.challenge.frequency_target = next as u32;
        self.challenge.frequency_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.sound.enabled);
        assert_eq!(parsed.sensitivity.acceleration_threshold, 1.4);
        assert_eq!(parsed.challenge.frequency_target, 1);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[sound]\nenabled = false\n").unwrap();
        assert!(!parsed.sound.enabled);
        assert_eq!(parsed.sensitivity.time_threshold, 0.45);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("sound.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("sensitivity.acceleration_threshold").as_deref(), Some("1.4"));
        assert_eq!(cfg.get("challenge.frequency_target").as_deref(), Some("1"));
        assert!(cfg.get("sound.missing_key").is_none());
        assert!(cfg.get("sound").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "sound.enabled", "false").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "sound.enabled").unwrap(),
            &serde_json::Value::Bool(false)
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "sound.volume", "3");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("sound.enabled", "loud").is_err());
        assert!(cfg.set("sensitivity.time_threshold", "fast").is_err());
    }

    #[test]
    fn set_accepts_integer_for_float_field() {
        let mut cfg = Config::default();
        cfg.set("sensitivity.acceleration_threshold", "2").unwrap();
        assert_eq!(cfg.sensitivity.acceleration_threshold, 2.0);
    }

    #[test]
    fn set_rejects_out_of_range_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("sensitivity.acceleration_threshold", "9.5").is_err());
        assert!(cfg.set("challenge.frequency_target", "0").is_err());
        assert_eq!(cfg.sensitivity.acceleration_threshold, 1.4);
        assert_eq!(cfg.challenge.frequency_target, 1);
    }

    #[test]
    fn nudges_clamp_to_range() {
        let mut cfg = Config::default();
        assert_eq!(cfg.nudge_acceleration(1), 1.5);
        assert_eq!(cfg.nudge_acceleration(-100), 0.1);
        assert_eq!(cfg.nudge_acceleration(100), 5.0);
        assert_eq!(cfg.nudge_time(-1), 0.44);
        assert_eq!(cfg.nudge_time(-100), 0.01);
        assert_eq!(cfg.nudge_time(200), 1.0);
        assert_eq!(cfg.nudge_frequency_target(-1), 1);
        assert_eq!(cfg.nudge_frequency_target(40), 30);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut cfg = Config::default();
        cfg.nudge_acceleration(5);
        cfg.nudge_time(5);
        cfg.reset_sensitivity();
        assert_eq!(cfg.sensitivity(), Sensitivity::default());
    }

    #[test]
    fn defaults_are_stored_without_float_noise() {
        let cfg = Config::default();
        assert_eq!(cfg.get("sensitivity.acceleration_threshold").as_deref(), Some("1.4"));
        assert_eq!(cfg.get("sensitivity.time_threshold").as_deref(), Some("0.45"));

        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        assert!(toml_str.contains("acceleration_threshold = 1.4\n"), "{toml_str}");
        assert!(toml_str.contains("time_threshold = 0.45\n"), "{toml_str}");

        assert_eq!(cfg.sensitivity(), Sensitivity::default());
    }

    #[test]
    fn apply_suggestion_rounds_to_hundredths() {
        let mut cfg = Config::default();
        cfg.apply_suggestion(Sensitivity::new(1.23456, 0.2749));
        assert_eq!(cfg.sensitivity.acceleration_threshold, 1.23);
        assert_eq!(cfg.sensitivity.time_threshold, 0.27);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(cfg.sound.enabled);
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.toggle_sound();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert!(!reloaded.sound.enabled);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sound = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
