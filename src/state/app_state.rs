//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{
    advisories::Advisory,
    alarms::{AlarmBook, AlarmFiring},
    recipes::RecipeBook,
    settings::{Settings, SettingsBook},
    stopwatch::{Stopwatch, StopwatchPhase, StopwatchReading},
    timers::{TimerBoard, TimerCompletion, TimerView},
    Collaborators,
};
use crate::{
    error::{CompanionError, Result},
    utils::time_format::format_uptime,
};

/// Pushed to every `/events` subscriber
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CompanionEvent {
    TimerCompleted(TimerCompletion),
    AlarmFired(AlarmFiring),
    StopwatchChanged { phase: StopwatchPhase },
}

impl CompanionEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            CompanionEvent::TimerCompleted(_) => "timer-completed",
            CompanionEvent::AlarmFired(_) => "alarm-fired",
            CompanionEvent::StopwatchChanged { .. } => "stopwatch-changed",
        }
    }
}

fn locked<'a, T>(mutex: &'a Mutex<T>, what: &'static str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| CompanionError::StatePoisoned(what))
}

/// Main application state shared by the HTTP handlers and the background tasks
#[derive(Debug)]
pub struct AppState {
    /// Engines, each behind its own lock
    pub timers: Arc<Mutex<TimerBoard>>,
    pub stopwatch: Arc<Mutex<Stopwatch>>,
    pub alarms: Arc<Mutex<AlarmBook>>,
    pub recipes: Arc<Mutex<RecipeBook>>,
    pub settings: Arc<Mutex<SettingsBook>>,
    pub collab: Collaborators,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Live timer views, refreshed every tick and transition
    pub timer_update_tx: watch::Sender<Vec<TimerView>>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<Vec<TimerView>>,
    /// Timer completions, alarm firings and stopwatch transitions
    pub events_tx: broadcast::Sender<CompanionEvent>,
    /// Wakes the stopwatch tick task on phase changes
    pub stopwatch_phase_tx: watch::Sender<StopwatchPhase>,
    /// Latest live stopwatch reading
    pub stopwatch_reading_tx: watch::Sender<StopwatchReading>,
    /// Keep the receiver alive to prevent channel closure
    pub _stopwatch_reading_rx: watch::Receiver<StopwatchReading>,
}

impl AppState {
    /// Load every engine from the collaborators' store
    pub fn new(port: u16, host: String, collab: Collaborators) -> Self {
        let now = Utc::now();
        let timers = TimerBoard::load(collab.clone(), now);
        let stopwatch = Stopwatch::load(collab.clone());
        let alarms = AlarmBook::load(collab.clone());
        let recipes = RecipeBook::load(collab.clone());
        let settings = SettingsBook::load(collab.clone());

        let (timer_update_tx, timer_update_rx) = watch::channel(timers.views(now));
        let (events_tx, _) = broadcast::channel(100);
        let (stopwatch_phase_tx, _) = watch::channel(stopwatch.phase());
        let (stopwatch_reading_tx, stopwatch_reading_rx) = watch::channel(stopwatch.reading(now));

        Self {
            timers: Arc::new(Mutex::new(timers)),
            stopwatch: Arc::new(Mutex::new(stopwatch)),
            alarms: Arc::new(Mutex::new(alarms)),
            recipes: Arc::new(Mutex::new(recipes)),
            settings: Arc::new(Mutex::new(settings)),
            collab,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
            events_tx,
            stopwatch_phase_tx,
            stopwatch_reading_tx,
            _stopwatch_reading_rx: stopwatch_reading_rx,
        }
    }

    pub fn timers(&self) -> Result<MutexGuard<'_, TimerBoard>> {
        locked(&self.timers, "timers")
    }

    pub fn stopwatch(&self) -> Result<MutexGuard<'_, Stopwatch>> {
        locked(&self.stopwatch, "stopwatch")
    }

    pub fn alarms(&self) -> Result<MutexGuard<'_, AlarmBook>> {
        locked(&self.alarms, "alarms")
    }

    pub fn recipes(&self) -> Result<MutexGuard<'_, RecipeBook>> {
        locked(&self.recipes, "recipes")
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(locked(&self.settings, "settings")?.get().clone())
    }

    /// Apply a timer operation and record it as the last action
    pub fn update_timers<R, F>(&self, action: &str, updater: F) -> Result<R>
    where
        F: FnOnce(&mut TimerBoard) -> Result<R>,
    {
        let (result, views) = {
            let mut board = self.timers()?;
            let result = updater(&mut *board)?;
            (result, board.views(Utc::now()))
        };
        self.record_action(action);
        self.timer_update_tx.send_replace(views);
        Ok(result)
    }

    pub fn update_alarms<R, F>(&self, action: &str, updater: F) -> Result<R>
    where
        F: FnOnce(&mut AlarmBook) -> Result<R>,
    {
        let result = updater(&mut *self.alarms()?)?;
        self.record_action(action);
        Ok(result)
    }

    pub fn update_recipes<R, F>(&self, action: &str, updater: F) -> Result<R>
    where
        F: FnOnce(&mut RecipeBook) -> Result<R>,
    {
        let result = updater(&mut *self.recipes()?)?;
        self.record_action(action);
        Ok(result)
    }

    /// Apply a stopwatch operation, then publish the new phase and reading
    pub fn update_stopwatch<R, F>(&self, action: &str, updater: F) -> Result<R>
    where
        F: FnOnce(&mut Stopwatch) -> R,
    {
        let (result, phase, reading) = {
            let mut stopwatch = self.stopwatch()?;
            let before = stopwatch.phase();
            let result = updater(&mut *stopwatch);
            let phase = stopwatch.phase();
            (result, (phase != before).then_some(phase), stopwatch.reading(Utc::now()))
        };
        self.record_action(action);

        if let Some(phase) = phase {
            self.stopwatch_phase_tx.send_replace(phase);
            self.broadcast(CompanionEvent::StopwatchChanged { phase });
        }
        self.stopwatch_reading_tx.send_replace(reading);
        Ok(result)
    }

    /// Replace the settings, which also flips the shared alert switches
    pub fn update_settings(&self, settings: Settings) -> Result<Settings> {
        let updated = locked(&self.settings, "settings")?.update(settings);
        self.record_action("settings");
        Ok(updated)
    }

    /// One timer tick: complete every running timer that reached zero
    pub fn tick_timers(&self, now: DateTime<Utc>) -> Result<Vec<TimerCompletion>> {
        let (completed, views) = {
            let mut board = self.timers()?;
            let completed = board.tick(now);
            (completed, board.views(now))
        };
        if let Err(e) = self.timer_update_tx.send(views) {
            warn!("Failed to send timer update: {}", e);
        }
        for completion in &completed {
            self.broadcast(CompanionEvent::TimerCompleted(completion.clone()));
        }
        Ok(completed)
    }

    /// One alarm check against the local wall clock
    pub fn check_alarms(&self, now: NaiveDateTime) -> Result<Vec<AlarmFiring>> {
        let fired = self.alarms()?.check(now);
        for firing in &fired {
            self.broadcast(CompanionEvent::AlarmFired(firing.clone()));
        }
        Ok(fired)
    }

    pub fn check_alarms_now(&self) -> Result<Vec<AlarmFiring>> {
        self.check_alarms(Local::now().naive_local())
    }

    /// Refresh the live stopwatch reading
    pub fn publish_stopwatch(&self, now: DateTime<Utc>) -> Result<StopwatchReading> {
        let reading = self.stopwatch()?.reading(now);
        if let Err(e) = self.stopwatch_reading_tx.send(reading.clone()) {
            warn!("Failed to send stopwatch reading: {}", e);
        }
        Ok(reading)
    }

    fn broadcast(&self, event: CompanionEvent) {
        // No subscribers is the common case
        if self.events_tx.send(event).is_err() {
            debug!("No event subscribers");
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed().as_secs())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Storage problems currently affecting the user
    pub fn advisories(&self) -> Vec<Advisory> {
        self.collab.advisories.snapshot()
    }

    pub fn log_summary(&self) {
        let timers = self.timers().map(|t| t.list().len()).unwrap_or(0);
        let alarms = self.alarms().map(|a| a.list().len()).unwrap_or(0);
        let recipes = self.recipes().map(|r| r.list(false, None).len()).unwrap_or(0);
        info!("Loaded {} timers, {} alarms, {} recipes", timers, alarms, recipes);
    }
}
