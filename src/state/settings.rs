//! User preferences

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Collaborators;
use crate::services::StorageKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub temperature_unit: TemperatureUnit,
    pub measurement_system: MeasurementSystem,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub default_alarm_sound: String,
    pub user_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Fahrenheit,
            measurement_system: MeasurementSystem::Metric,
            notifications_enabled: true,
            sound_enabled: true,
            default_alarm_sound: "default".to_string(),
            user_name: "Baker".to_string(),
        }
    }
}

/// Holds the current settings and mirrors the alert toggles into the
/// shared switches the engines consult
#[derive(Debug)]
pub struct SettingsBook {
    settings: Settings,
    collab: Collaborators,
}

impl SettingsBook {
    pub fn new(collab: Collaborators) -> Self {
        let book = Self {
            settings: Settings::default(),
            collab,
        };
        book.sync_switches();
        book
    }

    pub fn load(collab: Collaborators) -> Self {
        let settings = collab.load(StorageKey::Settings).unwrap_or_default();
        let book = Self { settings, collab };
        book.sync_switches();
        book
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Replace all settings at once
    pub fn update(&mut self, settings: Settings) -> Settings {
        info!(
            "Settings updated (sound: {}, notifications: {})",
            settings.sound_enabled, settings.notifications_enabled
        );
        self.settings = settings;
        self.sync_switches();
        self.collab.persist(StorageKey::Settings, &self.settings);
        self.settings.clone()
    }

    fn sync_switches(&self) {
        self.collab.switches.set(
            self.settings.sound_enabled,
            self.settings.notifications_enabled,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"userName":"Ana"}"#).unwrap();
        assert_eq!(settings.user_name, "Ana");
        assert_eq!(settings.temperature_unit, TemperatureUnit::Fahrenheit);
        assert!(settings.sound_enabled);
    }

    #[test]
    fn update_flips_the_shared_switches() {
        let collab = Collaborators::in_memory();
        let mut book = SettingsBook::new(collab.clone());
        assert!(collab.switches.sound_enabled());

        book.update(Settings {
            sound_enabled: false,
            notifications_enabled: false,
            ..Settings::default()
        });
        assert!(!collab.switches.sound_enabled());
        assert!(!collab.switches.notifications_enabled());

        let reloaded = SettingsBook::load(collab.clone());
        assert!(!reloaded.get().sound_enabled);
    }
}
