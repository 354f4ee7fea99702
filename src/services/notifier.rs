//! Desktop notification delivery
//!
//! Notifications are fire-and-forget: scheduling returns an opaque handle
//! (or `None` when notifications are unavailable) and never blocks the
//! caller. A denied or missing notification backend is not an error.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{process::Command, runtime::Handle, task::AbortHandle, time::sleep};
use tracing::{debug, info, warn};

/// Opaque handle for a scheduled notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleHandle(String);

impl ScheduleHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScheduleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait Notifier: Send + Sync {
    /// Whether notifications can be delivered at all
    fn request_permission(&self) -> bool;

    /// Deliver `title`/`body` after `delay_seconds`
    fn schedule_timer(
        &self,
        id: &str,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> Option<ScheduleHandle>;

    /// Deliver immediately
    fn notify(&self, title: &str, body: &str);

    fn cancel(&self, handle: &ScheduleHandle);
}

/// Used when notifications are switched off on the command line
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn request_permission(&self) -> bool {
        false
    }

    fn schedule_timer(&self, _: &str, _: &str, _: &str, _: u64) -> Option<ScheduleHandle> {
        None
    }

    fn notify(&self, _: &str, _: &str) {}

    fn cancel(&self, _: &ScheduleHandle) {}
}

/// Shells out to a `notify-send` compatible program
#[derive(Debug)]
pub struct DesktopNotifier {
    program: String,
    available: AtomicBool,
    next_handle: AtomicU64,
    pending: Arc<Mutex<HashMap<ScheduleHandle, AbortHandle>>>,
}

impl DesktopNotifier {
    /// Probe `program --version`; if it cannot run, notifications are
    /// silently unavailable for the lifetime of the daemon.
    pub async fn probe(program: &str) -> Self {
        let available = match Command::new(program).arg("--version").output().await {
            Ok(output) if output.status.success() => {
                info!("{} is available, desktop notifications enabled", program);
                true
            }
            Ok(output) => {
                warn!(
                    "{} exited with {}, desktop notifications unavailable",
                    program, output.status
                );
                false
            }
            Err(e) => {
                warn!("{} is not available ({}), desktop notifications unavailable", program, e);
                false
            }
        };

        Self {
            program: program.to_string(),
            available: AtomicBool::new(available),
            next_handle: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    async fn deliver(program: String, title: String, body: String) {
        match Command::new(&program)
            .args(["--app-name", "bake-companion", &title, &body])
            .output()
            .await
        {
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("{} failed: {}", program, stderr.trim());
            }
            Ok(_) => debug!("Delivered notification: {}", title),
            Err(e) => warn!("Failed to execute {}: {}", program, e),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn request_permission(&self) -> bool {
        self.available.load(Ordering::Relaxed)
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
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime, cannot schedule notification for {}", id);
            return None;
        };

        let handle = ScheduleHandle::new(format!(
            "{}#{}",
            id,
            self.next_handle.fetch_add(1, Ordering::Relaxed)
        ));
        let program = self.program.clone();
        let (title, body) = (title.to_string(), body.to_string());
        let pending = Arc::clone(&self.pending);
        let own_handle = handle.clone();

        // Registered under the lock, so the task's own removal always runs
        // after the insert even with a zero delay
        let Ok(mut registry) = self.pending.lock() else {
            warn!("Notification registry poisoned, not scheduling {}", id);
            return None;
        };
        let task = runtime.spawn(async move {
            sleep(Duration::from_secs(delay_seconds)).await;
            if let Ok(mut pending) = pending.lock() {
                pending.remove(&own_handle);
            }
            Self::deliver(program, title, body).await;
        });
        registry.insert(handle.clone(), task.abort_handle());
        drop(registry);
        debug!("Scheduled notification {} in {}s", handle, delay_seconds);
        Some(handle)
    }

    fn notify(&self, title: &str, body: &str) {
        if !self.request_permission() {
            return;
        }
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(Self::deliver(
                    self.program.clone(),
                    title.to_string(),
                    body.to_string(),
                ));
            }
            Err(_) => warn!("No async runtime, dropping notification: {}", title),
        }
    }

    fn cancel(&self, handle: &ScheduleHandle) {
        let task = self.pending.lock().ok().and_then(|mut p| p.remove(handle));
        if let Some(task) = task {
            task.abort();
            debug!("Cancelled notification {}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_backend_means_silently_unavailable() {
        let notifier = DesktopNotifier::probe("definitely-not-a-notifier-binary").await;
        assert!(!notifier.request_permission());
        assert!(notifier.schedule_timer("t", "title", "body", 5).is_none());
        notifier.notify("title", "body");
        assert_eq!(notifier.pending_count(), 0);
    }

    fn always_available() -> DesktopNotifier {
        DesktopNotifier {
            program: "true".to_string(),
            available: AtomicBool::new(true),
            next_handle: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[tokio::test]
    async fn cancel_aborts_pending_delivery() {
        let notifier = always_available();

        let handle = notifier.schedule_timer("timer-1", "Done", "Scones", 3600).unwrap();
        assert_eq!(notifier.pending_count(), 1);

        notifier.cancel(&handle);
        assert_eq!(notifier.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn immediate_deliveries_leave_no_pending_entry() {
        let notifier = always_available();
        for n in 0..20 {
            notifier.schedule_timer(&format!("timer-{}", n), "Done", "Now", 0);
        }

        for _ in 0..100 {
            if notifier.pending_count() == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(notifier.pending_count(), 0);
    }
}
