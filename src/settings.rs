//! Planner settings: display unit and daily target.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::fields::Unit;
use crate::task::format_number;

pub const DEFAULT_DAILY_TARGET: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub default_unit: Unit,
    #[serde(default = "default_daily_target")]
    pub daily_target: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_unit: Unit::Minutes,
            daily_target: DEFAULT_DAILY_TARGET,
        }
    }
}

fn default_daily_target() -> f64 {
    DEFAULT_DAILY_TARGET
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsPatch {
    pub default_unit: Option<Unit>,
    pub daily_target: Option<f64>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.default_unit.is_none() && self.daily_target.is_none()
    }

    /// The record `validate_settings` checks before a patch is applied.
    pub fn to_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(unit) = self.default_unit {
            map.insert("defaultUnit".into(), unit.as_str().into());
        }
        if let Some(target) = self.daily_target {
            // JSON has no NaN or Infinity; keep them visible to the validator.
            let value = if target.is_finite() {
                target.into()
            } else {
                serde_json::Value::String(format_number(target))
            };
            map.insert("dailyTarget".into(), value);
        }
        serde_json::Value::Object(map)
    }
}

impl Settings {
    /// Load from stored text. Each field is read on its own: a missing or
    /// invalid field takes its default without discarding the others.
    pub fn from_stored(text: Option<&str>) -> Self {
        let mut settings = Settings::default();
        let Some(text) = text else {
            return settings;
        };
        let record: Value = match serde_json::from_str(text) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Error parsing settings, using defaults");
                return settings;
            }
        };

        if let Some(unit) = record.get("defaultUnit") {
            match unit.as_str().and_then(Unit::parse) {
                Some(unit) => settings.default_unit = unit,
                None => warn!(value = %unit, "ignoring invalid stored unit"),
            }
        }
        if let Some(target) = record.get("dailyTarget") {
            match target.as_f64().filter(|t| t.is_finite() && *t >= 0.0) {
                Some(target) => settings.daily_target = target,
                None => warn!(value = %target, "ignoring invalid stored daily target"),
            }
        }
        settings
    }

    /// Shallow merge. A non-finite target cannot be stored and is ignored.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(unit) = patch.default_unit {
            self.default_unit = unit;
        }
        if let Some(target) = patch.daily_target.filter(|t| t.is_finite()) {
            self.daily_target = target;
        }
    }
}
