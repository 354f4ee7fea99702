//! The bundle of collaborators every engine is constructed with

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::Advisories;
use crate::services::{
    store, AlertSound, MemoryStore, NoopNotifier, Notifier, ScheduleHandle, SilentAlertSound,
    StorageKey, Store,
};
use crate::services::testing::{RecordingAlertSound, RecordingNotifier};

/// User-controlled switches that gate side effects
#[derive(Debug)]
pub struct AlertSwitches {
    sound_enabled: AtomicBool,
    notifications_enabled: AtomicBool,
}

impl AlertSwitches {
    pub fn new(sound_enabled: bool, notifications_enabled: bool) -> Self {
        Self {
            sound_enabled: AtomicBool::new(sound_enabled),
            notifications_enabled: AtomicBool::new(notifications_enabled),
        }
    }

    pub fn set(&self, sound_enabled: bool, notifications_enabled: bool) {
        self.sound_enabled.store(sound_enabled, Ordering::Relaxed);
        self.notifications_enabled
            .store(notifications_enabled, Ordering::Relaxed);
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled.load(Ordering::Relaxed)
    }
}

impl Default for AlertSwitches {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Persistence, notification and audio handles shared by the engines
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub sound: Arc<dyn AlertSound>,
    pub switches: Arc<AlertSwitches>,
    pub advisories: Arc<Advisories>,
}

impl Collaborators {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        sound: Arc<dyn AlertSound>,
    ) -> Self {
        Self {
            store,
            notifier,
            sound,
            switches: Arc::new(AlertSwitches::default()),
            advisories: Arc::new(Advisories::new()),
        }
    }

    /// In-memory store with notifications and audio switched off
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NoopNotifier),
            Arc::new(SilentAlertSound),
        )
    }

    /// In-memory collaborators that hand back the recording fakes
    pub fn recording() -> (Self, Arc<RecordingNotifier>, Arc<RecordingAlertSound>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let sound = Arc::new(RecordingAlertSound::default());
        let collab = Self::new(
            Arc::new(MemoryStore::new()),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&sound) as Arc<dyn AlertSound>,
        );
        (collab, notifier, sound)
    }

    pub fn notifications_available(&self) -> bool {
        self.switches.notifications_enabled() && self.notifier.request_permission()
    }

    pub fn schedule(&self, id: &str, title: &str, body: &str, delay: u64) -> Option<ScheduleHandle> {
        if !self.notifications_available() {
            debug!("Notifications unavailable, not scheduling {}", id);
            return None;
        }
        self.notifier.schedule_timer(id, title, body, delay)
    }

    pub fn notify(&self, title: &str, body: &str) {
        if self.notifications_available() {
            self.notifier.notify(title, body);
        }
    }

    pub fn cancel(&self, handle: Option<ScheduleHandle>) {
        if let Some(handle) = handle {
            self.notifier.cancel(&handle);
        }
    }

    pub fn alert(&self) {
        if self.switches.sound_enabled() {
            self.sound.play_alert();
        }
    }

    /// Load a collection, recording an advisory and falling back to `None`
    /// when the stored document is unreadable
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        match store::load(self.store.as_ref(), key) {
            Ok(value) => value,
            Err(e) => {
                self.advisories
                    .add(key.as_str(), format!("Could not load saved {}: {}", key, e));
                None
            }
        }
    }

    /// Save a full snapshot. Failures become advisories; the in-memory
    /// state stays authoritative.
    pub fn persist<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> bool {
        match store::save(self.store.as_ref(), key, value) {
            Ok(()) => {
                self.advisories.clear_for(key.as_str());
                true
            }
            Err(e) => {
                self.advisories
                    .add(key.as_str(), format!("Changes to {} were not saved: {}", key, e));
                false
            }
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("switches", &self.switches)
            .field("advisories", &self.advisories)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_collaborators_keep_no_notifications() {
        let collab = Collaborators::in_memory();
        assert!(!collab.notifications_available());
        assert!(collab.schedule("t", "Done", "Buns", 5).is_none());
        collab.notify("Done", "Buns");
    }

    #[test]
    fn recording_collaborators_gate_on_the_switches() {
        let (collab, notifier, sound) = Collaborators::recording();
        collab.notify("Done", "Buns");
        collab.switches.set(false, false);
        collab.notify("Done", "Rolls");
        collab.alert();

        assert_eq!(notifier.delivered().len(), 1);
        assert_eq!(sound.plays(), 0);
    }
}
