//! Recording collaborators for tests and dry runs

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use super::{AlertSound, Notifier, ScheduleHandle};

/// A notification the [`RecordingNotifier`] accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    pub delay_seconds: u64,
}

/// Remembers every notification instead of delivering it
#[derive(Debug)]
pub struct RecordingNotifier {
    granted: AtomicBool,
    counter: AtomicUsize,
    scheduled: Mutex<Vec<(ScheduleHandle, Notice)>>,
    delivered: Mutex<Vec<Notice>>,
    cancelled: Mutex<Vec<ScheduleHandle>>,
}

impl RecordingNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            counter: AtomicUsize::new(0),
            scheduled: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub fn scheduled(&self) -> Vec<(ScheduleHandle, Notice)> {
        self.scheduled.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Scheduled notices that were not cancelled
    pub fn live(&self) -> Vec<Notice> {
        let cancelled = self.cancelled();
        self.scheduled()
            .into_iter()
            .filter(|(handle, _)| !cancelled.contains(handle))
            .map(|(_, notice)| notice)
            .collect()
    }

    pub fn delivered(&self) -> Vec<Notice> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn cancelled(&self) -> Vec<ScheduleHandle> {
        self.cancelled.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for RecordingNotifier {
    fn request_permission(&self) -> bool {
        self.granted.load(Ordering::Relaxed)
    }

    fn schedule_timer(
        &self,
        id: &str,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> Option<ScheduleHandle> {
        if !self.request_permission() {
            return None;
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let handle = ScheduleHandle::new(format!("recorded-{}", n));
        let notice = Notice {
            id: Some(id.to_string()),
            title: title.to_string(),
            body: body.to_string(),
            delay_seconds,
        };
        if let Ok(mut scheduled) = self.scheduled.lock() {
            scheduled.push((handle.clone(), notice));
        }
        Some(handle)
    }

    fn notify(&self, title: &str, body: &str) {
        if !self.request_permission() {
            return;
        }
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(Notice {
                id: None,
                title: title.to_string(),
                body: body.to_string(),
                delay_seconds: 0,
            });
        }
    }

    fn cancel(&self, handle: &ScheduleHandle) {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(handle.clone());
        }
    }
}

/// Counts alert plays
#[derive(Debug, Default)]
pub struct RecordingAlertSound {
    plays: AtomicUsize,
}

impl RecordingAlertSound {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::Relaxed)
    }
}

impl AlertSound for RecordingAlertSound {
    fn play_alert(&self) {
        self.plays.fetch_add(1, Ordering::Relaxed);
    }
}
