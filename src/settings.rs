use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::{
    models::TeacherId,
    preferences::{PriorityPolicy, DEFAULT_PRIORITY_CAP},
    repository::{CredentialStore, Credentials},
    viewport::{ViewKind, WeekStart},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarSettings {
    pub default_view: ViewKind,
    pub week_start: WeekStart,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            default_view: ViewKind::Month,
            week_start: WeekStart::Sunday,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionSettings {
    pub priority_policy: PriorityPolicy,
    pub priority_cap: u32,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            priority_policy: PriorityPolicy::Reject,
            priority_cap: DEFAULT_PRIORITY_CAP,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    pub teacher_id: TeacherId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    calendar: CalendarSettings,
    submission: SubmissionSettings,
    credentials: Option<StoredCredentials>,
}

/// `settings.json` in the data directory. Unreadable files fall back to defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn calendar(&self) -> CalendarSettings {
        self.read(|data| data.calendar.clone())
    }

    pub fn submission(&self) -> SubmissionSettings {
        self.read(|data| data.submission.clone())
    }

    pub fn update_calendar(&self, settings: CalendarSettings) -> Result<()> {
        self.write(|data| data.calendar = settings)
    }

    pub fn update_submission(&self, settings: SubmissionSettings) -> Result<()> {
        self.write(|data| data.submission = settings)
    }

    pub fn sign_in(&self, teacher_id: TeacherId, token: Option<String>) -> Result<()> {
        self.write(|data| data.credentials = Some(StoredCredentials { teacher_id, token }))
    }

    pub fn sign_out(&self) -> Result<()> {
        self.write(|data| data.credentials = None)
    }

    fn read<T>(&self, f: impl FnOnce(&UserSettings) -> T) -> T {
        match self.data.read() {
            Ok(guard) => f(&*guard),
            Err(poisoned) => f(&*poisoned.into_inner()),
        }
    }

    fn write(&self, f: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut updated = guard.clone();
        f(&mut updated);
        self.persist(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl CredentialStore for SettingsStore {
    fn current(&self) -> Option<Credentials> {
        self.read(|data| {
            data.credentials.as_ref().map(|stored| Credentials {
                teacher_id: stored.teacher_id,
                token: stored.token.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("vigil-settings-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn defaults_when_file_is_missing() {
        let store = SettingsStore::new(temp_path()).unwrap();
        assert_eq!(store.calendar(), CalendarSettings::default());
        assert_eq!(store.submission().priority_policy, PriorityPolicy::Reject);
        assert_eq!(store.submission().priority_cap, 5);
        assert!(store.current().is_none());
    }

    #[test]
    fn credentials_persist_across_reopen() {
        let path = temp_path();
        {
            let store = SettingsStore::new(path.clone()).unwrap();
            store.sign_in(3, Some("token-3".into())).unwrap();
            store
                .update_calendar(CalendarSettings {
                    default_view: ViewKind::Week,
                    week_start: WeekStart::Monday,
                })
                .unwrap();
        }

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(
            reopened.current(),
            Some(Credentials {
                teacher_id: 3,
                token: Some("token-3".into())
            })
        );
        assert_eq!(reopened.calendar().week_start, WeekStart::Monday);

        reopened.sign_out().unwrap();
        assert!(reopened.current().is_none());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_path();
        fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.calendar(), CalendarSettings::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_path();
        fs::write(&path, r#"{"submission": {"priorityPolicy": "clamp", "priorityCap": 3}}"#).unwrap();
        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.submission().priority_policy, PriorityPolicy::Clamp);
        assert_eq!(store.submission().priority_cap, 3);
        assert_eq!(store.calendar().default_view, ViewKind::Month);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn failed_write_leaves_settings_untouched() {
        let path = std::env::temp_dir()
            .join(format!("vigil-missing-{}", uuid::Uuid::new_v4()))
            .join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        assert!(store.sign_in(3, None).is_err());
        assert!(store.current().is_none());

        let monday = CalendarSettings {
            default_view: ViewKind::Day,
            week_start: WeekStart::Monday,
        };
        assert!(store.update_calendar(monday).is_err());
        assert_eq!(store.calendar(), CalendarSettings::default());
        assert!(!path.exists());
    }
}
