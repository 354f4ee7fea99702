//! Countdown timer entity and its state transitions
//!
//! Remaining time is derived from the instant the timer last started
//! running, not from counting ticks, so a daemon that was suspended for a
//! while still reports the right value on the next read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::ScheduleHandle;

pub type TimerId = Uuid;

/// Where a timer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// A single countdown timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub label: String,
    /// Total seconds, the reset target
    pub duration: u64,
    /// Seconds left as of the last transition or tick
    pub remaining: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Reference instant of the current running stretch
    #[serde(default)]
    running_since: Option<DateTime<Utc>>,
    /// `remaining` at `running_since`
    #[serde(default)]
    remaining_at_start: u64,
    #[serde(skip)]
    pub(crate) notification: Option<ScheduleHandle>,
}

impl Timer {
    /// Create an idle timer. `duration` must already be validated as positive.
    pub(crate) fn new(label: &str, duration: u64, now: DateTime<Utc>) -> Self {
        let label = label.trim();
        Self {
            id: Uuid::new_v4(),
            label: if label.is_empty() { "Timer".to_string() } else { label.to_string() },
            duration,
            remaining: duration,
            is_running: false,
            is_paused: false,
            created_at: now,
            started_at: None,
            running_since: None,
            remaining_at_start: duration,
            notification: None,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        match (self.is_running, self.is_paused) {
            (true, true) => TimerPhase::Paused,
            (true, false) => TimerPhase::Running,
            (false, _) if self.remaining == 0 => TimerPhase::Finished,
            (false, _) => TimerPhase::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() == TimerPhase::Running
    }

    /// Seconds left at `now`, recomputed from the running reference instant
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        match (self.phase(), self.running_since) {
            (TimerPhase::Running, Some(since)) => {
                let elapsed = (now - since).num_seconds().max(0) as u64;
                self.remaining_at_start.saturating_sub(elapsed)
            }
            _ => self.remaining,
        }
    }

    /// Idle or Paused into Running. Returns false if the transition does not
    /// apply.
    pub(crate) fn begin_running(&mut self, now: DateTime<Utc>) -> bool {
        match self.phase() {
            TimerPhase::Idle => {
                self.started_at = Some(now);
            }
            TimerPhase::Paused => {}
            TimerPhase::Running | TimerPhase::Finished => return false,
        }
        self.is_running = true;
        self.is_paused = false;
        self.running_since = Some(now);
        self.remaining_at_start = self.remaining;
        true
    }

    /// Running into Paused, freezing the remaining seconds. A pause that lands
    /// on or after the deadline is refused so the next tick can complete the
    /// timer.
    pub(crate) fn freeze(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase() != TimerPhase::Running {
            return false;
        }
        let remaining = self.remaining_at(now);
        if remaining == 0 {
            return false;
        }
        self.remaining = remaining;
        self.is_paused = true;
        self.running_since = None;
        true
    }

    /// Bring `remaining` up to date. Returns true when this call moved the
    /// timer into Finished.
    pub(crate) fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase() != TimerPhase::Running {
            return false;
        }
        self.remaining = self.remaining_at(now);
        if self.remaining > 0 {
            return false;
        }
        self.is_running = false;
        self.is_paused = false;
        self.running_since = None;
        true
    }

    /// Any phase back to Idle with a full countdown
    pub(crate) fn rewind(&mut self) {
        self.remaining = self.duration;
        self.remaining_at_start = self.duration;
        self.is_running = false;
        self.is_paused = false;
        self.running_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn new_timer_is_idle_with_full_countdown() {
        let timer = Timer::new("  ", 90, t0());
        assert_eq!(timer.label, "Timer");
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.remaining, 90);
    }

    #[test]
    fn remaining_is_recomputed_from_the_reference_instant() {
        let mut timer = Timer::new("Cookies", 600, t0());
        assert!(timer.begin_running(t0()));
        assert_eq!(timer.remaining_at(t0() + Duration::milliseconds(999)), 600);
        assert_eq!(timer.remaining_at(t0() + Duration::seconds(61)), 539);
        assert_eq!(timer.remaining_at(t0() + Duration::hours(3)), 0);
        // clock stepping backwards never inflates the countdown
        assert_eq!(timer.remaining_at(t0() - Duration::seconds(30)), 600);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut timer = Timer::new("Bread", 100, t0());
        timer.begin_running(t0());
        assert!(timer.freeze(t0() + Duration::seconds(40)));
        assert_eq!(timer.phase(), TimerPhase::Paused);
        assert_eq!(timer.remaining_at(t0() + Duration::seconds(500)), 60);

        assert!(timer.begin_running(t0() + Duration::seconds(500)));
        assert_eq!(timer.remaining_at(t0() + Duration::seconds(510)), 50);
        assert_eq!(timer.started_at, Some(t0()));
    }

    #[test]
    fn finished_timers_do_not_restart_until_rewound() {
        let mut timer = Timer::new("Eggs", 5, t0());
        timer.begin_running(t0());
        assert!(timer.advance(t0() + Duration::seconds(5)));
        assert_eq!(timer.phase(), TimerPhase::Finished);
        assert!(!timer.advance(t0() + Duration::seconds(6)));
        assert!(!timer.begin_running(t0() + Duration::seconds(7)));

        timer.rewind();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.remaining, 5);
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let timer = Timer::new("Scones", 60, t0());
        let json = serde_json::to_value(&timer).unwrap();
        assert_eq!(json["isRunning"], false);
        assert_eq!(json["remaining"], 60);
        assert!(json.get("notification").is_none());
    }
}
