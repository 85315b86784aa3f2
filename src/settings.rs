//! Notification settings persisted as a small JSON document.
//!
//! The document is deliberately re-read on every use (each scheduler tick,
//! each admin page load) so changes take effect within one polling interval
//! without restarting anything. A missing or malformed file falls back to
//! defaults; the failure is logged and swallowed.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// 24-hour "HH:MM" local time at which the daily reminder becomes due.
    pub time: String,
    pub timezone: TimezoneCode,
    /// Toast display duration in seconds.
    pub duration: u32,
    /// Toggles the menstruation field on the entry form.
    pub gender: String,
    /// When true, suppress repeat toasts after the first one of a given
    /// local day. Off by default: the service historically re-notified on
    /// every qualifying tick while the conditions held.
    #[serde(default)]
    pub notify_once_per_day: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            time: "15:00".into(),
            timezone: TimezoneCode::Est,
            duration: 10,
            gender: "female".into(),
            notify_once_per_day: false,
        }
    }
}

/// Fixed-offset US timezone codes. No DST adjustment; the approximation is
/// acceptable for a daily reminder.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TimezoneCode {
    #[serde(rename = "EST")]
    Est,
    #[serde(rename = "CST")]
    Cst,
    #[serde(rename = "MST")]
    Mst,
    #[serde(rename = "PST")]
    Pst,
}

// Lenient on input: a code outside the offset table degrades to EST without
// invalidating the rest of the document.
impl<'de> serde::Deserialize<'de> for TimezoneCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TimezoneCode::from_code(&raw))
    }
}

impl TimezoneCode {
    pub fn from_code(raw: &str) -> Self {
        match raw {
            "EST" => TimezoneCode::Est,
            "CST" => TimezoneCode::Cst,
            "MST" => TimezoneCode::Mst,
            "PST" => TimezoneCode::Pst,
            _ => TimezoneCode::Est,
        }
    }

    pub fn utc_offset_hours(self) -> i32 {
        match self {
            TimezoneCode::Est => -5,
            TimezoneCode::Cst => -6,
            TimezoneCode::Mst => -7,
            TimezoneCode::Pst => -8,
        }
    }

    pub fn fixed_offset(self) -> FixedOffset {
        // In range for all four codes, so the unwrap cannot fire.
        FixedOffset::east_opt(self.utc_offset_hours() * 3600).unwrap()
    }
}

/// Handle to the settings document, shared by the HTTP layer and the
/// reminder scheduler.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document fresh. Any failure falls back to defaults.
    pub fn load(&self) -> NotificationSettings {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(error = %e, path = %self.path.display(),
                        "Malformed notification settings, using defaults");
                    NotificationSettings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                NotificationSettings::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(),
                    "Failed to read notification settings, using defaults");
                NotificationSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &NotificationSettings) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("does_not_exist.json"));
        assert_eq!(store.load(), NotificationSettings::default());
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not valid json").unwrap();
        let store = SettingsStore::new(path);
        assert_eq!(store.load(), NotificationSettings::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = NotificationSettings {
            enabled: false,
            time: "08:30".into(),
            timezone: TimezoneCode::Pst,
            duration: 5,
            gender: "male".into(),
            notify_once_per_day: true,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_timezone_codes_serialize_as_short_codes() {
        let json = serde_json::to_value(TimezoneCode::Cst).unwrap();
        assert_eq!(json, serde_json::json!("CST"));
        let back: TimezoneCode = serde_json::from_value(serde_json::json!("PST")).unwrap();
        assert_eq!(back, TimezoneCode::Pst);
    }

    #[test]
    fn test_document_without_suppression_key_still_parses() {
        // Documents written before notify_once_per_day existed.
        let raw = r#"{"enabled":true,"time":"15:00","timezone":"EST","duration":10,"gender":"female"}"#;
        let settings: NotificationSettings = serde_json::from_str(raw).unwrap();
        assert!(!settings.notify_once_per_day);
    }

    #[test]
    fn test_unknown_timezone_degrades_to_est_keeping_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"enabled":false,"time":"08:30","timezone":"AKST","duration":5,"gender":"male"}"#,
        )
        .unwrap();
        let loaded = SettingsStore::new(path).load();
        // Only the timezone falls back; the user's other choices survive.
        assert!(!loaded.enabled);
        assert_eq!(loaded.time, "08:30");
        assert_eq!(loaded.timezone, TimezoneCode::Est);
        assert_eq!(loaded.duration, 5);
        assert_eq!(loaded.gender, "male");
    }

    #[test]
    fn test_from_code_maps_known_and_unknown() {
        assert_eq!(TimezoneCode::from_code("MST"), TimezoneCode::Mst);
        assert_eq!(TimezoneCode::from_code("AKST"), TimezoneCode::Est);
        assert_eq!(TimezoneCode::from_code(""), TimezoneCode::Est);
    }

    #[test]
    fn test_offsets() {
        assert_eq!(TimezoneCode::Est.utc_offset_hours(), -5);
        assert_eq!(TimezoneCode::Cst.utc_offset_hours(), -6);
        assert_eq!(TimezoneCode::Mst.utc_offset_hours(), -7);
        assert_eq!(TimezoneCode::Pst.utc_offset_hours(), -8);
    }
}
