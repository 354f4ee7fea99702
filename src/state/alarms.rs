//! Alarm engine
//!
//! Alarms are matched against the local wall clock once per check
//! interval. Matching is by minute, and an alarm records the minute it last
//! fired, so a checker that runs several times inside one minute fires each
//! alarm at most once.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    alarm_state::{truncate_to_minute, Alarm, AlarmId, AlarmRepeat, AlarmTime},
    Collaborators,
};
use crate::{
    error::{CompanionError, Result},
    services::StorageKey,
};

const FIRED_TITLE: &str = "⏰ Alarm!";
const DEFAULT_SOUND: &str = "default";
const DEFAULT_SNOOZE_MINUTES: u32 = 5;

/// One-tap alarm that goes off a fixed number of minutes from now
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AlarmPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub minutes: i64,
    pub icon: &'static str,
}

pub const ALARM_PRESETS: &[AlarmPreset] = &[
    AlarmPreset { id: "preset-preheat", label: "Preheat oven", minutes: 10, icon: "🔥" },
    AlarmPreset { id: "preset-butter", label: "Take butter out", minutes: 30, icon: "🧈" },
    AlarmPreset { id: "preset-cookies", label: "Check cookies", minutes: 8, icon: "🍪" },
    AlarmPreset { id: "preset-proofing", label: "Bread proofing", minutes: 45, icon: "🍞" },
    AlarmPreset { id: "preset-cooldown", label: "Cake cooldown", minutes: 20, icon: "🎂" },
    AlarmPreset { id: "preset-eggs", label: "Room temp eggs", minutes: 20, icon: "🥚" },
    AlarmPreset { id: "preset-rest", label: "Dough rest", minutes: 15, icon: "⏱️" },
    AlarmPreset { id: "preset-chill", label: "Chill dough", minutes: 30, icon: "❄️" },
];

/// Fields a client supplies to create or edit an alarm
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDraft {
    #[serde(default)]
    pub label: String,
    pub time: String,
    #[serde(default = "AlarmDraft::default_repeat")]
    pub repeat: AlarmRepeat,
    #[serde(default)]
    pub days: Vec<u8>,
    pub sound: Option<String>,
    pub snooze_enabled: Option<bool>,
    pub snooze_duration: Option<u32>,
}

impl AlarmDraft {
    fn default_repeat() -> AlarmRepeat {
        AlarmRepeat::Once
    }

    pub fn new(time: &str, repeat: AlarmRepeat) -> Self {
        Self {
            label: String::new(),
            time: time.to_string(),
            repeat,
            days: Vec::new(),
            sound: None,
            snooze_enabled: None,
            snooze_duration: None,
        }
    }

    fn into_alarm(self, id: AlarmId) -> Result<Alarm> {
        let time: AlarmTime = self.time.parse()?;

        if let Some(day) = self.days.iter().find(|d| **d > 6) {
            return Err(CompanionError::InvalidAlarm(format!(
                "weekday {} is out of range 0-6",
                day
            )));
        }
        let days: BTreeSet<u8> = match self.repeat {
            AlarmRepeat::Custom if self.days.is_empty() => {
                return Err(CompanionError::InvalidAlarm(
                    "custom repeat needs at least one weekday".to_string(),
                ))
            }
            AlarmRepeat::Custom => self.days.into_iter().collect(),
            _ => BTreeSet::new(),
        };
        let snooze_duration = self.snooze_duration.unwrap_or(DEFAULT_SNOOZE_MINUTES);
        if snooze_duration == 0 {
            return Err(CompanionError::InvalidAlarm(
                "snooze duration must be at least one minute".to_string(),
            ));
        }

        Ok(Alarm {
            id,
            label: self.label.trim().to_string(),
            time,
            enabled: true,
            repeat: self.repeat,
            days,
            sound: self.sound.unwrap_or_else(|| DEFAULT_SOUND.to_string()),
            snooze_enabled: self.snooze_enabled.unwrap_or(true),
            snooze_duration,
            created_at: Utc::now(),
            last_fired: None,
        })
    }
}

/// Reported for every alarm that fires
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmFiring {
    pub id: AlarmId,
    pub label: String,
    pub time: AlarmTime,
    pub sound: String,
}

#[derive(Debug)]
pub struct AlarmBook {
    alarms: IndexMap<AlarmId, Alarm>,
    /// Fired alarms waiting for the user to dismiss or snooze them
    pending: Vec<AlarmId>,
    collab: Collaborators,
}

impl AlarmBook {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            alarms: IndexMap::new(),
            pending: Vec::new(),
            collab,
        }
    }

    pub fn load(collab: Collaborators) -> Self {
        let saved: Vec<Alarm> = collab.load(StorageKey::Alarms).unwrap_or_default();
        let mut book = Self::new(collab);
        book.alarms = saved.into_iter().map(|a| (a.id, a)).collect();
        info!("Loaded {} alarms", book.alarms.len());
        book
    }

    pub fn list(&self) -> Vec<Alarm> {
        self.alarms.values().cloned().collect()
    }

    pub fn get(&self, id: AlarmId) -> Result<&Alarm> {
        self.alarms
            .get(&id)
            .ok_or_else(|| CompanionError::not_found("alarm", id))
    }

    pub fn enabled_count(&self) -> usize {
        self.alarms.values().filter(|a| a.enabled).count()
    }

    pub fn create(&mut self, draft: AlarmDraft) -> Result<Alarm> {
        let alarm = draft.into_alarm(Uuid::new_v4())?;
        info!(
            "Created alarm {} at {} ({})",
            alarm.id,
            alarm.time,
            alarm.describe_repeat()
        );
        Ok(self.insert(alarm))
    }

    /// One-time alarm `preset.minutes` from `now`
    pub fn create_from_preset(&mut self, preset_id: &str, now: NaiveDateTime) -> Result<Alarm> {
        let preset = ALARM_PRESETS
            .iter()
            .find(|p| p.id == preset_id)
            .ok_or_else(|| CompanionError::not_found("alarm preset", preset_id))?;
        let time = AlarmTime::of(&(now + Duration::minutes(preset.minutes)));
        let mut draft = AlarmDraft::new(&time.to_string(), AlarmRepeat::Once);
        draft.label = preset.label.to_string();
        self.create(draft)
    }

    /// Replace an alarm's schedule and details. The edited alarm is enabled.
    pub fn update(&mut self, id: AlarmId, draft: AlarmDraft) -> Result<Alarm> {
        let existing = self.get(id)?;
        let created_at = existing.created_at;
        let last_fired = existing.last_fired;

        let mut alarm = draft.into_alarm(id)?;
        alarm.created_at = created_at;
        alarm.last_fired = last_fired;
        info!("Updated alarm {} to {} ({})", id, alarm.time, alarm.describe_repeat());
        Ok(self.insert(alarm))
    }

    pub fn toggle(&mut self, id: AlarmId) -> Result<Alarm> {
        let alarm = self
            .alarms
            .get_mut(&id)
            .ok_or_else(|| CompanionError::not_found("alarm", id))?;
        alarm.enabled = !alarm.enabled;
        let alarm = alarm.clone();
        info!("Alarm {} enabled={}", id, alarm.enabled);
        self.save();
        Ok(alarm)
    }

    pub fn delete(&mut self, id: AlarmId) -> Result<Alarm> {
        let alarm = self
            .alarms
            .shift_remove(&id)
            .ok_or_else(|| CompanionError::not_found("alarm", id))?;
        self.pending.retain(|p| *p != id);
        info!("Deleted alarm {}", id);
        self.save();
        Ok(alarm)
    }

    /// Fire every alarm due in the minute containing `now`.
    ///
    /// The collection is saved before anything is presented, so a `once`
    /// alarm is already disabled on disk when its notification goes out.
    pub fn check(&mut self, now: NaiveDateTime) -> Vec<AlarmFiring> {
        let minute = truncate_to_minute(&now);
        let mut fired = Vec::new();

        for alarm in self.alarms.values_mut() {
            if !alarm.is_due(&now) {
                continue;
            }
            alarm.last_fired = Some(minute);
            if alarm.repeat == AlarmRepeat::Once {
                alarm.enabled = false;
            }
            fired.push(AlarmFiring {
                id: alarm.id,
                label: alarm.display_label().to_string(),
                time: alarm.time,
                sound: alarm.sound.clone(),
            });
        }

        if fired.is_empty() {
            debug!("No alarms due at {}", AlarmTime::of(&now));
            return fired;
        }

        self.save();

        for firing in &fired {
            info!("Alarm {} ({}) fired at {}", firing.id, firing.label, firing.time);
            self.collab.notify(FIRED_TITLE, &firing.label);
            self.collab.alert();
            if !self.pending.contains(&firing.id) {
                self.pending.push(firing.id);
            }
        }
        fired
    }

    /// Alarms that fired and still await acknowledgment
    pub fn pending(&self) -> Vec<Alarm> {
        self.pending
            .iter()
            .filter_map(|id| self.alarms.get(id).cloned())
            .collect()
    }

    /// Acknowledge a fired alarm. Returns false if it was not pending.
    pub fn dismiss(&mut self, id: AlarmId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| *p != id);
        before != self.pending.len()
    }

    /// Create a new one-time alarm `minutes` from `now` in place of `id`.
    /// The original alarm is left exactly as it was. `None` uses the alarm's
    /// own snooze duration.
    pub fn snooze(&mut self, id: AlarmId, minutes: Option<i64>, now: NaiveDateTime) -> Result<Alarm> {
        let original = self.get(id)?;
        if !original.snooze_enabled {
            return Err(CompanionError::InvalidAlarm(format!(
                "snooze is disabled for alarm {}",
                id
            )));
        }
        let minutes = minutes.unwrap_or(original.snooze_duration as i64);
        if minutes <= 0 {
            return Err(CompanionError::InvalidDuration(format!(
                "snooze must be at least one minute, got {}",
                minutes
            )));
        }
        let ring_at = Duration::try_minutes(minutes)
            .and_then(|delay| now.checked_add_signed(delay))
            .ok_or_else(|| {
                CompanionError::InvalidDuration(format!("snooze of {} minutes is out of range", minutes))
            })?;

        let snoozed = Alarm {
            id: Uuid::new_v4(),
            label: format!("{} (snoozed)", original.display_label()),
            time: AlarmTime::of(&ring_at),
            enabled: true,
            repeat: AlarmRepeat::Once,
            days: BTreeSet::new(),
            sound: original.sound.clone(),
            snooze_enabled: original.snooze_enabled,
            snooze_duration: original.snooze_duration,
            created_at: Utc::now(),
            last_fired: None,
        };
        info!("Snoozed alarm {} for {} min, new alarm {} at {}", id, minutes, snoozed.id, snoozed.time);
        self.dismiss(id);
        Ok(self.insert(snoozed))
    }

    fn insert(&mut self, alarm: Alarm) -> Alarm {
        self.alarms.insert(alarm.id, alarm.clone());
        self.save();
        alarm
    }

    fn save(&self) {
        let snapshot: Vec<&Alarm> = self.alarms.values().collect();
        self.collab.persist(StorageKey::Alarms, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{store, MemoryStore, Notifier, SilentAlertSound};
    use crate::services::testing::RecordingNotifier;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        // March 2026: the 2nd is a Monday, the 7th a Saturday
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn weekday_alarm_scenario() {
        let (collab, notifier, sound) = Collaborators::recording();
        let mut book = AlarmBook::new(collab);
        let alarm = book.create(AlarmDraft::new("07:00", AlarmRepeat::Weekdays)).unwrap();

        assert!(book.check(at(7, 7, 0, 5)).is_empty());

        let fired = book.check(at(2, 7, 0, 5));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, alarm.id);

        assert!(book.check(at(2, 7, 0, 35)).is_empty());
        assert_eq!(notifier.delivered().len(), 1);
        assert_eq!(sound.plays(), 1);
        assert!(book.get(alarm.id).unwrap().enabled);
    }

    #[test]
    fn daily_alarm_fires_once_per_matching_minute() {
        let (collab, notifier, _) = Collaborators::recording();
        let mut book = AlarmBook::new(collab);
        let mut draft = AlarmDraft::new("06:30", AlarmRepeat::Daily);
        draft.label = "Feed starter".into();
        book.create(draft).unwrap();

        assert_eq!(book.check(at(3, 6, 30, 1)).len(), 1);
        assert_eq!(book.check(at(3, 6, 30, 31)).len(), 0);
        assert_eq!(book.check(at(4, 6, 30, 1)).len(), 1);

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].title, "⏰ Alarm!");
        assert_eq!(delivered[0].body, "Feed starter");
    }

    #[test]
    fn once_alarms_disable_themselves_before_presenting() {
        let store = Arc::new(MemoryStore::new());
        let collab = Collaborators::new(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
            Arc::new(SilentAlertSound),
        );
        let mut book = AlarmBook::new(collab);
        let alarm = book.create(AlarmDraft::new("08:15", AlarmRepeat::Once)).unwrap();

        assert_eq!(book.check(at(5, 8, 15, 0)).len(), 1);
        let saved: Vec<Alarm> = store::load(store.as_ref(), StorageKey::Alarms).unwrap().unwrap();
        assert!(!saved[0].enabled);

        assert!(book.check(at(6, 8, 15, 0)).is_empty());
        assert_eq!(book.pending().len(), 1);
        assert_eq!(book.pending()[0].id, alarm.id);
    }

    #[test]
    fn snooze_creates_a_new_once_alarm() {
        let mut book = AlarmBook::new(Collaborators::in_memory());
        let mut draft = AlarmDraft::new("07:00", AlarmRepeat::Daily);
        draft.label = "Bake bread".into();
        let original = book.create(draft).unwrap();
        book.check(at(2, 7, 0, 20));

        let snoozed = book.snooze(original.id, Some(10), at(2, 7, 0, 20)).unwrap();
        assert_eq!(snoozed.time.to_string(), "07:10");
        assert_eq!(snoozed.repeat, AlarmRepeat::Once);
        assert_eq!(snoozed.label, "Bake bread (snoozed)");
        assert_ne!(snoozed.id, original.id);

        let untouched = book.get(original.id).unwrap();
        assert_eq!(untouched.time.to_string(), "07:00");
        assert_eq!(untouched.repeat, AlarmRepeat::Daily);
        assert!(book.pending().is_empty());
        assert_eq!(book.list().len(), 2);

        assert_eq!(book.check(at(2, 7, 10, 0)).len(), 1);
    }

    #[test]
    fn snooze_wraps_past_midnight_and_uses_default_duration() {
        let mut book = AlarmBook::new(Collaborators::in_memory());
        let original = book.create(AlarmDraft::new("23:58", AlarmRepeat::Once)).unwrap();
        let snoozed = book.snooze(original.id, None, at(2, 23, 58, 40)).unwrap();
        assert_eq!(snoozed.time.to_string(), "00:03");
        assert!(book.snooze(original.id, Some(0), at(2, 23, 58, 40)).is_err());
    }

    #[test]
    fn oversized_snooze_is_rejected_without_touching_the_book() {
        let mut book = AlarmBook::new(Collaborators::in_memory());
        let original = book.create(AlarmDraft::new("07:00", AlarmRepeat::Daily)).unwrap();
        for minutes in [10_000_000_000_000_000, i64::MAX] {
            assert!(matches!(
                book.snooze(original.id, Some(minutes), at(2, 7, 0, 0)),
                Err(CompanionError::InvalidDuration(_))
            ));
        }
        assert_eq!(book.list().len(), 1);

        let snoozed = book.snooze(original.id, Some(3 * 24 * 60 + 5), at(2, 7, 0, 0)).unwrap();
        assert_eq!(snoozed.time.to_string(), "07:05");
    }

    #[test]
    fn drafts_are_validated() {
        let mut book = AlarmBook::new(Collaborators::in_memory());
        assert!(book.create(AlarmDraft::new("25:00", AlarmRepeat::Daily)).is_err());

        let mut custom = AlarmDraft::new("07:00", AlarmRepeat::Custom);
        assert!(book.create(custom.clone()).is_err());
        custom.days = vec![1, 9];
        assert!(book.create(custom.clone()).is_err());
        custom.days = vec![1, 3, 1];
        let alarm = book.create(custom).unwrap();
        assert_eq!(alarm.days.len(), 2);
    }

    #[test]
    fn presets_schedule_relative_to_now() {
        let mut book = AlarmBook::new(Collaborators::in_memory());
        let alarm = book.create_from_preset("preset-proofing", at(2, 13, 30, 0)).unwrap();
        assert_eq!(alarm.time.to_string(), "14:15");
        assert_eq!(alarm.label, "Bread proofing");
        assert_eq!(alarm.repeat, AlarmRepeat::Once);
        assert!(book.create_from_preset("preset-nope", at(2, 13, 30, 0)).is_err());
    }

    #[test]
    fn disabled_alarms_never_fire_and_toggle_flips() {
        let mut book = AlarmBook::new(Collaborators::in_memory());
        let alarm = book.create(AlarmDraft::new("09:00", AlarmRepeat::Daily)).unwrap();
        assert!(!book.toggle(alarm.id).unwrap().enabled);
        assert!(book.check(at(2, 9, 0, 0)).is_empty());
        assert!(book.toggle(alarm.id).unwrap().enabled);
        assert_eq!(book.enabled_count(), 1);
    }

    #[test]
    fn sound_switch_gates_the_alert() {
        let (collab, _, sound) = Collaborators::recording();
        collab.switches.set(false, true);
        let mut book = AlarmBook::new(collab);
        book.create(AlarmDraft::new("09:00", AlarmRepeat::Daily)).unwrap();
        assert_eq!(book.check(at(2, 9, 0, 0)).len(), 1);
        assert_eq!(sound.plays(), 0);
    }

    #[test]
    fn denied_permission_still_fires_silently() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let collab = Collaborators::new(
            Arc::new(MemoryStore::new()),
            notifier.clone() as Arc<dyn Notifier>,
            Arc::new(SilentAlertSound),
        );
        let mut book = AlarmBook::new(collab);
        book.create(AlarmDraft::new("09:00", AlarmRepeat::Daily)).unwrap();
        assert_eq!(book.check(at(2, 9, 0, 0)).len(), 1);
        assert!(notifier.delivered().is_empty());
        assert_eq!(book.pending().len(), 1);
    }

    #[test]
    fn last_fired_survives_a_reload() {
        let collab = Collaborators::in_memory();
        let mut book = AlarmBook::new(collab.clone());
        book.create(AlarmDraft::new("09:00", AlarmRepeat::Daily)).unwrap();
        assert_eq!(book.check(at(2, 9, 0, 0)).len(), 1);

        let mut reloaded = AlarmBook::load(collab);
        assert!(reloaded.check(at(2, 9, 0, 30)).is_empty());
    }
}
