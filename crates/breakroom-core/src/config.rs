//! Application configuration.
//!
//! Covers:
//! - The ordered tier ladder
//! - Idle threshold and merge window
//! - Warning ramp duration
//! - Exception rules and the automatic exception toggles
//!
//! `Config` is plain data; persistence lives in
//! [`crate::storage::ConfigStore`]. The session reads its copy once and
//! swaps it only on an explicit config-changed command.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::tier::{Tier, TierId};

/// Which input devices count as activity. Consumed by idle-source
/// implementations; the core only stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMonitoring {
    Keyboard,
    Mouse,
    Both,
}

/// When an app rule marks an exception active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Active while the app is the frontmost application.
    Focused,
    /// Active while the app is running at all.
    Opened,
}

impl TriggerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerMode::Focused => "focused",
            TriggerMode::Opened => "opened",
        }
    }
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "focused" => Ok(TriggerMode::Focused),
            "opened" => Ok(TriggerMode::Opened),
            other => Err(format!("unknown trigger mode: {other}")),
        }
    }
}

/// An application that defers breaks while focused or running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRule {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Platform application identifier (bundle id, executable name).
    pub app_id: String,
    /// Human-readable name, used in log reasons.
    pub app_name: String,
    pub trigger: TriggerMode,
}

impl ExceptionRule {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>, trigger: TriggerMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            app_id: app_id.into(),
            app_name: app_name.into(),
            trigger,
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tiers in priority order. Order matters for due-break selection.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<Tier>,
    /// Seconds without input before the user counts as idle.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_secs: u64,
    #[serde(default = "default_input_monitoring")]
    pub input_monitoring: InputMonitoring,
    /// Window in which an imminent longer break absorbs a shorter one.
    #[serde(default = "default_merge_window")]
    pub merge_window_secs: u64,
    /// How long the warning border ramps before the overlay appears.
    #[serde(default = "default_warning_duration")]
    pub warning_duration_secs: u64,
    #[serde(default)]
    pub exception_rules: Vec<ExceptionRule>,
    #[serde(default = "default_true")]
    pub auto_exception_microphone: bool,
    #[serde(default = "default_true")]
    pub auto_exception_screen_sharing: bool,
}

// Default functions
fn default_tiers() -> Vec<Tier> {
    vec![Tier::default_short(), Tier::default_long()]
}
fn default_idle_threshold() -> u64 {
    180
}
fn default_merge_window() -> u64 {
    300
}
fn default_warning_duration() -> u64 {
    30
}
fn default_input_monitoring() -> InputMonitoring {
    InputMonitoring::Keyboard
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            idle_threshold_secs: default_idle_threshold(),
            input_monitoring: default_input_monitoring(),
            merge_window_secs: default_merge_window(),
            warning_duration_secs: default_warning_duration(),
            exception_rules: Vec::new(),
            auto_exception_microphone: true,
            auto_exception_screen_sharing: true,
        }
    }
}

impl Config {
    pub fn tier(&self, id: TierId) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    pub fn tier_by_name(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn idle_threshold_ms(&self) -> u64 {
        self.idle_threshold_secs * 1000
    }

    pub fn merge_window_ms(&self) -> u64 {
        self.merge_window_secs * 1000
    }

    pub fn warning_duration_ms(&self) -> u64 {
        self.warning_duration_secs * 1000
    }

    /// Check structural invariants: unique tier ids, nonzero intervals
    /// and break durations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier.id) {
                return Err(ConfigError::InvalidValue {
                    key: "tiers".into(),
                    message: format!("duplicate tier id {}", tier.id),
                });
            }
            if tier.active_interval_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("tiers.{}.active_interval_secs", tier.name),
                    message: "must be positive".into(),
                });
            }
            if tier.break_duration_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("tiers.{}.break_duration_secs", tier.name),
                    message: "must be positive".into(),
                });
            }
        }
        Ok(())
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

    /// Set a config value by dot-separated key. Mutates in memory only;
    /// callers persist through [`crate::storage::ConfigStore`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed as the field's type, or the result fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

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
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(String::new()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: format!("cannot parse '{value}' as bool"),
                        })?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| ConfigError::InvalidValue {
                                    key: key.to_string(),
                                    message: format!("cannot parse '{value}' as number"),
                                })?
                        } else {
                            return Err(ConfigError::InvalidValue {
                                key: key.to_string(),
                                message: format!("cannot parse '{value}' as number"),
                            });
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }
}
