//! Alarm entity, wall-clock time and repeat schedules

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CompanionError;

pub type AlarmId = Uuid;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A 24-hour wall-clock minute, serialized as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, CompanionError> {
        if hour > 23 || minute > 59 {
            return Err(CompanionError::InvalidAlarm(format!(
                "{}:{} is not a valid time of day",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    /// The minute `now` falls in
    pub fn of(now: &NaiveDateTime) -> Self {
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for AlarmTime {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CompanionError::InvalidAlarm(format!("expected HH:MM, got {:?}", s));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = CompanionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AlarmTime> for String {
    fn from(time: AlarmTime) -> Self {
        time.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmRepeat {
    Once,
    Daily,
    Weekdays,
    Weekends,
    Custom,
}

impl AlarmRepeat {
    /// Whether the schedule allows firing on `weekday` (0 = Sunday)
    pub fn includes(&self, weekday: u8, custom_days: &BTreeSet<u8>) -> bool {
        match self {
            AlarmRepeat::Once | AlarmRepeat::Daily => true,
            AlarmRepeat::Weekdays => (1..=5).contains(&weekday),
            AlarmRepeat::Weekends => weekday == 0 || weekday == 6,
            AlarmRepeat::Custom => custom_days.contains(&weekday),
        }
    }
}

/// A wall-clock alarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: AlarmId,
    pub label: String,
    pub time: AlarmTime,
    pub enabled: bool,
    pub repeat: AlarmRepeat,
    /// Weekdays for `custom` schedules, 0 = Sunday
    #[serde(default)]
    pub days: BTreeSet<u8>,
    pub sound: String,
    pub snooze_enabled: bool,
    /// Minutes
    pub snooze_duration: u32,
    pub created_at: DateTime<Utc>,
    /// Minute of the most recent firing, local wall clock
    #[serde(default)]
    pub last_fired: Option<NaiveDateTime>,
}

impl Alarm {
    /// Whether the alarm should fire in the minute containing `now`.
    /// An alarm that already fired in this minute is never due again.
    pub fn is_due(&self, now: &NaiveDateTime) -> bool {
        if !self.enabled || self.time != AlarmTime::of(now) {
            return false;
        }
        let weekday = now.weekday().num_days_from_sunday() as u8;
        if !self.repeat.includes(weekday, &self.days) {
            return false;
        }
        self.last_fired != Some(truncate_to_minute(now))
    }

    /// Human label for the repeat schedule
    pub fn describe_repeat(&self) -> String {
        match self.repeat {
            AlarmRepeat::Once => "Once".to_string(),
            AlarmRepeat::Daily => "Every day".to_string(),
            AlarmRepeat::Weekdays => "Weekdays".to_string(),
            AlarmRepeat::Weekends => "Weekends".to_string(),
            AlarmRepeat::Custom => self
                .days
                .iter()
                .filter_map(|d| DAY_NAMES.get(*d as usize))
                .copied()
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            "Alarm"
        } else {
            &self.label
        }
    }
}

pub fn truncate_to_minute(now: &NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(*now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        // March 2026: the 2nd is a Monday, the 7th a Saturday
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn alarm(time: &str, repeat: AlarmRepeat, days: &[u8]) -> Alarm {
        Alarm {
            id: Uuid::new_v4(),
            label: String::new(),
            time: time.parse().unwrap(),
            enabled: true,
            repeat,
            days: days.iter().copied().collect(),
            sound: "default".into(),
            snooze_enabled: true,
            snooze_duration: 5,
            created_at: Utc::now(),
            last_fired: None,
        }
    }

    #[test]
    fn parses_and_prints_wall_clock_times() {
        let time: AlarmTime = "7:05".parse().unwrap();
        assert_eq!(time.to_string(), "07:05");
        assert!("24:00".parse::<AlarmTime>().is_err());
        assert!("12:60".parse::<AlarmTime>().is_err());
        assert!("1200".parse::<AlarmTime>().is_err());
        assert!("12:5".parse::<AlarmTime>().is_err());

        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"07:05\"");
        assert!(serde_json::from_str::<AlarmTime>("\"25:00\"").is_err());
    }

    #[test]
    fn repeat_schedules_pick_the_right_days() {
        let weekdays = alarm("07:00", AlarmRepeat::Weekdays, &[]);
        assert!(weekdays.is_due(&at(2, 7, 0, 10)));
        assert!(!weekdays.is_due(&at(7, 7, 0, 10)));

        let weekends = alarm("07:00", AlarmRepeat::Weekends, &[]);
        assert!(weekends.is_due(&at(7, 7, 0, 0)));
        assert!(weekends.is_due(&at(8, 7, 0, 0)));
        assert!(!weekends.is_due(&at(4, 7, 0, 0)));

        let custom = alarm("07:00", AlarmRepeat::Custom, &[3]);
        assert!(custom.is_due(&at(4, 7, 0, 0)));
        assert!(!custom.is_due(&at(5, 7, 0, 0)));
    }

    #[test]
    fn matching_is_per_minute() {
        let daily = alarm("07:00", AlarmRepeat::Daily, &[]);
        assert!(daily.is_due(&at(2, 7, 0, 59)));
        assert!(!daily.is_due(&at(2, 7, 1, 0)));
        assert!(!daily.is_due(&at(2, 6, 59, 59)));
    }

    #[test]
    fn last_fired_blocks_the_same_minute_only() {
        let mut daily = alarm("07:00", AlarmRepeat::Daily, &[]);
        daily.last_fired = Some(at(2, 7, 0, 0));
        assert!(!daily.is_due(&at(2, 7, 0, 30)));
        assert!(daily.is_due(&at(3, 7, 0, 30)));
    }

    #[test]
    fn describes_repeat_schedules() {
        assert_eq!(alarm("07:00", AlarmRepeat::Daily, &[]).describe_repeat(), "Every day");
        assert_eq!(
            alarm("07:00", AlarmRepeat::Custom, &[6, 0, 3]).describe_repeat(),
            "Sun, Wed, Sat"
        );
        assert_eq!(alarm("07:00", AlarmRepeat::Once, &[]).display_label(), "Alarm");
    }
}
