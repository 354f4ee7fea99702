//! Advisory messages for degraded operation
//!
//! When a collaborator fails (a save that did not land, a notification
//! backend that went away) the engines keep running on their in-memory
//! state and leave a message here for clients to show as a banner.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const MAX_ADVISORIES: usize = 50;

/// One advisory, tagged with the component that raised it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub component: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Advisories {
    entries: Mutex<Vec<Advisory>>,
}

impl Advisories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advisory. Repeats of the same message are collapsed.
    pub fn add(&self, component: &str, message: impl Into<String>) {
        let advisory = Advisory {
            component: component.to_string(),
            message: message.into(),
        };
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.contains(&advisory) {
            return;
        }
        warn!("Advisory from {}: {}", advisory.component, advisory.message);
        entries.push(advisory);
        if entries.len() > MAX_ADVISORIES {
            entries.remove(0);
        }
    }

    /// Drop every advisory raised by `component`
    pub fn clear_for(&self, component: &str) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        let initial_count = entries.len();
        entries.retain(|a| !a.component.eq_ignore_ascii_case(component));
        if entries.len() != initial_count {
            info!(
                "Cleared {} advisories for component: {}",
                initial_count - entries.len(),
                component
            );
        }
    }

    pub fn snapshot(&self) -> Vec<Advisory> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_duplicates_and_clears_by_component() {
        let advisories = Advisories::new();
        advisories.add("timers", "could not save");
        advisories.add("timers", "could not save");
        advisories.add("alarms", "could not save");
        assert_eq!(advisories.snapshot().len(), 2);

        advisories.clear_for("TIMERS");
        let left = advisories.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].component, "alarms");
    }
}
