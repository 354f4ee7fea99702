//! Stopwatch engine
//!
//! Elapsed time is a frozen baseline plus the length of the current running
//! stretch. Pausing folds the stretch into the baseline, so any number of
//! pause/resume cycles adds up to exactly the time spent running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::Collaborators;
use crate::{
    services::StorageKey,
    utils::format_time_with_milliseconds,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchPhase {
    Stopped,
    Running,
    Paused,
}

/// A lap captured from a running stopwatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub id: Uuid,
    /// Cumulative elapsed milliseconds at capture
    pub time: u64,
    /// Milliseconds since the previous split (or since zero)
    pub lap_time: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopwatchState {
    pub is_running: bool,
    pub is_paused: bool,
    /// Milliseconds accumulated before the current running stretch
    pub elapsed_time: u64,
    pub splits: Vec<Split>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default)]
    resumed_at: Option<DateTime<Utc>>,
}

impl StopwatchState {
    pub fn phase(&self) -> StopwatchPhase {
        match (self.is_running, self.is_paused) {
            (false, _) => StopwatchPhase::Stopped,
            (true, false) => StopwatchPhase::Running,
            (true, true) => StopwatchPhase::Paused,
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> u64 {
        match (self.phase(), self.resumed_at) {
            (StopwatchPhase::Running, Some(since)) => {
                self.elapsed_time + (now - since).num_milliseconds().max(0) as u64
            }
            _ => self.elapsed_time,
        }
    }
}

/// What the fast tick publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopwatchReading {
    pub phase: StopwatchPhase,
    pub elapsed: u64,
    pub display: String,
    pub splits: usize,
}

impl StopwatchReading {
    pub fn stopped() -> Self {
        Self {
            phase: StopwatchPhase::Stopped,
            elapsed: 0,
            display: format_time_with_milliseconds(0),
            splits: 0,
        }
    }
}

#[derive(Debug)]
pub struct Stopwatch {
    state: StopwatchState,
    collab: Collaborators,
}

impl Stopwatch {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            state: StopwatchState::default(),
            collab,
        }
    }

    pub fn load(collab: Collaborators) -> Self {
        let state = collab.load(StorageKey::Stopwatch).unwrap_or_default();
        Self { state, collab }
    }

    pub fn state(&self) -> &StopwatchState {
        &self.state
    }

    pub fn phase(&self) -> StopwatchPhase {
        self.state.phase()
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> u64 {
        self.state.elapsed(now)
    }

    pub fn splits(&self) -> &[Split] {
        &self.state.splits
    }

    pub fn reading(&self, now: DateTime<Utc>) -> StopwatchReading {
        let elapsed = self.elapsed(now);
        StopwatchReading {
            phase: self.phase(),
            elapsed,
            display: format_time_with_milliseconds(elapsed),
            splits: self.state.splits.len(),
        }
    }

    /// Stopped into Running
    pub fn start(&mut self, now: DateTime<Utc>) -> StopwatchPhase {
        if self.phase() != StopwatchPhase::Stopped {
            debug!("Ignoring stopwatch start while {:?}", self.phase());
            return self.phase();
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        self.state.started_at = Some(now);
        self.state.resumed_at = Some(now);
        self.commit("start")
    }

    /// Running into Paused
    pub fn pause(&mut self, now: DateTime<Utc>) -> StopwatchPhase {
        if self.phase() != StopwatchPhase::Running {
            debug!("Ignoring stopwatch pause while {:?}", self.phase());
            return self.phase();
        }
        self.state.elapsed_time = self.state.elapsed(now);
        self.state.is_paused = true;
        self.state.paused_at = Some(now);
        self.state.resumed_at = None;
        self.commit("pause")
    }

    /// Paused into Running
    pub fn resume(&mut self, now: DateTime<Utc>) -> StopwatchPhase {
        if self.phase() != StopwatchPhase::Paused {
            debug!("Ignoring stopwatch resume while {:?}", self.phase());
            return self.phase();
        }
        self.state.is_paused = false;
        self.state.paused_at = None;
        self.state.resumed_at = Some(now);
        self.commit("resume")
    }

    /// Any phase back to Stopped with no time and no splits
    pub fn reset(&mut self) -> StopwatchPhase {
        self.state = StopwatchState::default();
        self.commit("reset")
    }

    /// Capture a lap. Only a running stopwatch records splits.
    pub fn record_split(&mut self, now: DateTime<Utc>) -> Option<Split> {
        if self.phase() != StopwatchPhase::Running {
            debug!("Ignoring split while {:?}", self.phase());
            return None;
        }
        let previous = self.state.splits.last().map(|s| s.time).unwrap_or(0);
        let time = self.state.elapsed(now).max(previous);
        let split = Split {
            id: Uuid::new_v4(),
            time,
            lap_time: time - previous,
            timestamp: now,
        };
        self.state.splits.push(split.clone());
        info!(
            "Split #{} at {} (lap {})",
            self.state.splits.len(),
            format_time_with_milliseconds(split.time),
            format_time_with_milliseconds(split.lap_time)
        );
        self.save();
        Some(split)
    }

    /// Plain-text lap table for copying elsewhere
    pub fn splits_report(&self) -> String {
        self.state
            .splits
            .iter()
            .enumerate()
            .map(|(i, split)| {
                format!(
                    "#{}  {}  {}",
                    i + 1,
                    format_time_with_milliseconds(split.lap_time),
                    format_time_with_milliseconds(split.time)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn commit(&self, action: &str) -> StopwatchPhase {
        info!("Stopwatch {} -> {:?}", action, self.phase());
        self.save();
        self.phase()
    }

    fn save(&self) {
        self.collab.persist(StorageKey::Stopwatch, &self.state);
    }
}
