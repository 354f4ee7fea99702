//! Alarm checker background task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that matches alarms against the local clock every
/// `every`. Firing is idempotent per minute, so any interval up to a minute
/// is safe.
pub async fn alarm_checker_task(state: Arc<AppState>, every: Duration) {
    info!("Starting alarm checker task (every {}s)", every.as_secs());

    let mut interval = interval(every);

    loop {
        interval.tick().await;

        match state.check_alarms_now() {
            Ok(fired) if fired.is_empty() => debug!("Alarm check: nothing due"),
            Ok(fired) => info!("{} alarm(s) fired", fired.len()),
            Err(e) => error!("Failed to check alarms: {}", e),
        }
    }
}
