//! Timer engine
//!
//! Owns every countdown timer, keyed by a stable id. A single tick fans out
//! to all running timers at once; paused, finished and deleted timers are
//! simply not visited, so nothing can be decremented twice or brought back
//! by a late tick.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    timer_state::{Timer, TimerId, TimerPhase},
    Collaborators,
};
use crate::{
    error::{CompanionError, Result},
    services::{ScheduleHandle, StorageKey},
    utils::format_time,
};

const COMPLETE_TITLE: &str = "⏱️ Timer Complete!";

/// Longest countdown a timer accepts, in seconds
pub const MAX_TIMER_SECONDS: i64 = 100 * 3600;

/// Quick-start timer preset
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimerPreset {
    pub key: &'static str,
    pub label: &'static str,
    pub minutes: u64,
    pub icon: &'static str,
}

pub const TIMER_PRESETS: &[TimerPreset] = &[
    TimerPreset { key: "quick-check", label: "Quick Check", minutes: 5, icon: "👀" },
    TimerPreset { key: "cookies", label: "Cookies", minutes: 10, icon: "🍪" },
    TimerPreset { key: "cake-layer", label: "Cake Layer", minutes: 25, icon: "🎂" },
    TimerPreset { key: "bread-rise", label: "Bread Rise", minutes: 60, icon: "🍞" },
];

/// Emitted once when a timer reaches zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerCompletion {
    pub id: TimerId,
    pub label: String,
}

/// Read-only view of a timer at a given instant
#[derive(Debug, Clone, Serialize)]
pub struct TimerView {
    pub id: TimerId,
    pub label: String,
    pub phase: TimerPhase,
    pub duration: u64,
    pub remaining: u64,
    pub display: String,
}

impl TimerView {
    fn of(timer: &Timer, now: DateTime<Utc>) -> Self {
        let remaining = timer.remaining_at(now);
        Self {
            id: timer.id,
            label: timer.label.clone(),
            phase: timer.phase(),
            duration: timer.duration,
            remaining,
            display: format_time(remaining.saturating_mul(1000)),
        }
    }
}

#[derive(Debug)]
pub struct TimerBoard {
    timers: IndexMap<TimerId, Timer>,
    collab: Collaborators,
}

impl TimerBoard {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            timers: IndexMap::new(),
            collab,
        }
    }

    /// Restore saved timers. Running timers keep running from their recorded
    /// reference instant and get their completion notification rescheduled.
    pub fn load(collab: Collaborators, now: DateTime<Utc>) -> Self {
        let saved: Vec<Timer> = collab.load(StorageKey::Timers).unwrap_or_default();
        let mut board = Self::new(collab);
        for mut timer in saved {
            if timer.phase() == TimerPhase::Running {
                let remaining = timer.remaining_at(now);
                if remaining > 0 {
                    timer.notification = board.schedule_completion(&timer, remaining);
                }
            }
            board.timers.insert(timer.id, timer);
        }
        info!("Loaded {} timers", board.timers.len());
        board
    }

    pub fn list(&self) -> Vec<Timer> {
        self.timers.values().cloned().collect()
    }

    pub fn views(&self, now: DateTime<Utc>) -> Vec<TimerView> {
        self.timers.values().map(|t| TimerView::of(t, now)).collect()
    }

    pub fn view(&self, id: TimerId, now: DateTime<Utc>) -> Result<TimerView> {
        self.get(id).map(|t| TimerView::of(t, now))
    }

    pub fn get(&self, id: TimerId) -> Result<&Timer> {
        self.timers
            .get(&id)
            .ok_or_else(|| CompanionError::not_found("timer", id))
    }

    pub fn running_count(&self) -> usize {
        self.timers.values().filter(|t| t.is_active()).count()
    }

    pub fn create(&mut self, label: &str, duration_seconds: i64, now: DateTime<Utc>) -> Result<Timer> {
        if duration_seconds <= 0 {
            return Err(CompanionError::InvalidDuration(format!(
                "timer duration must be a positive number of seconds, got {}",
                duration_seconds
            )));
        }
        if duration_seconds > MAX_TIMER_SECONDS {
            return Err(CompanionError::InvalidDuration(format!(
                "timer duration is limited to {} seconds, got {}",
                MAX_TIMER_SECONDS, duration_seconds
            )));
        }
        let timer = Timer::new(label, duration_seconds as u64, now);
        info!("Created timer {} ({}, {}s)", timer.id, timer.label, timer.duration);
        self.timers.insert(timer.id, timer.clone());
        self.save();
        Ok(timer)
    }

    pub fn create_from_preset(&mut self, key: &str, now: DateTime<Utc>) -> Result<Timer> {
        let preset = TIMER_PRESETS
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| CompanionError::not_found("timer preset", key))?;
        self.create(preset.label, (preset.minutes * 60) as i64, now)
    }

    /// Idle or Paused into Running
    pub fn start(&mut self, id: TimerId, now: DateTime<Utc>) -> Result<Timer> {
        self.transition(id, "start", |board, timer| {
            if !timer.begin_running(now) {
                return false;
            }
            timer.notification = board.schedule_completion(timer, timer.remaining);
            true
        })
    }

    /// Running into Paused
    pub fn pause(&mut self, id: TimerId, now: DateTime<Utc>) -> Result<Timer> {
        self.transition(id, "pause", |board, timer| {
            if !timer.freeze(now) {
                return false;
            }
            board.collab.cancel(timer.notification.take());
            true
        })
    }

    /// Paused into Running
    pub fn resume(&mut self, id: TimerId, now: DateTime<Utc>) -> Result<Timer> {
        if self.get(id)?.phase() != TimerPhase::Paused {
            debug!("Ignoring resume of timer {} that is not paused", id);
            return self.get(id).cloned();
        }
        self.start(id, now)
    }

    /// Any phase back to Idle
    pub fn reset(&mut self, id: TimerId) -> Result<Timer> {
        self.transition(id, "reset", |board, timer| {
            board.collab.cancel(timer.notification.take());
            timer.rewind();
            true
        })
    }

    pub fn delete(&mut self, id: TimerId) -> Result<Timer> {
        let mut timer = self
            .timers
            .shift_remove(&id)
            .ok_or_else(|| CompanionError::not_found("timer", id))?;
        self.collab.cancel(timer.notification.take());
        info!("Deleted timer {} ({})", id, timer.label);
        self.save();
        Ok(timer)
    }

    /// Advance every running timer to `now`. Each timer that reaches zero on
    /// this tick is reported exactly once. A timer with a scheduled
    /// notification leaves it to fire; one without (finished while the
    /// daemon was down, or started with notifications off) is notified here.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerCompletion> {
        let mut completed = Vec::new();
        let mut unscheduled = Vec::new();
        for timer in self.timers.values_mut() {
            if timer.advance(now) {
                if timer.notification.take().is_none() {
                    unscheduled.push(timer.id);
                }
                completed.push(TimerCompletion {
                    id: timer.id,
                    label: timer.label.clone(),
                });
            }
        }

        if !completed.is_empty() {
            for done in &completed {
                info!("Timer {} ({}) complete", done.id, done.label);
                if unscheduled.contains(&done.id) {
                    self.collab
                        .notify(COMPLETE_TITLE, &format!("{} has finished!", done.label));
                }
                self.collab.alert();
            }
            self.save();
        }
        completed
    }

    fn transition<F>(&mut self, id: TimerId, action: &str, apply: F) -> Result<Timer>
    where
        F: FnOnce(&Self, &mut Timer) -> bool,
    {
        let mut timer = self.get(id)?.clone();
        if !apply(self, &mut timer) {
            debug!("Ignoring {} of timer {} in phase {:?}", action, id, timer.phase());
            return self.get(id).cloned();
        }
        info!("Timer {} ({}) {} -> {:?}", id, timer.label, action, timer.phase());
        self.timers.insert(id, timer.clone());
        self.save();
        Ok(timer)
    }

    fn schedule_completion(&self, timer: &Timer, delay: u64) -> Option<ScheduleHandle> {
        self.collab.schedule(
            &timer.id.to_string(),
            COMPLETE_TITLE,
            &format!("{} has finished!", timer.label),
            delay,
        )
    }

    fn save(&self) {
        let snapshot: Vec<&Timer> = self.timers.values().collect();
        self.collab.persist(StorageKey::Timers, &snapshot);
    }
}
