//! External collaborators
//!
//! Persistence, notifications and audio sit behind traits so the engines
//! can be driven with in-memory fakes in tests and with desktop commands in
//! the daemon.

pub mod audio;
pub mod notifier;
pub mod store;
pub mod testing;

// Re-export main types
pub use audio::{AlertSound, CommandAlertSound, SilentAlertSound};
pub use notifier::{DesktopNotifier, NoopNotifier, Notifier, ScheduleHandle};
pub use store::{JsonFileStore, MemoryStore, StorageKey, Store};
