//! Timer tick background task

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::state::AppState;

/// Background task that advances every running timer once per second
pub async fn timer_tick_task(state: Arc<AppState>) {
    info!("Starting timer tick task");

    let mut interval = interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match state.tick_timers(Utc::now()) {
            Ok(completed) => {
                for done in completed {
                    info!("Timer {} ({}) completed", done.id, done.label);
                }
            }
            Err(e) => error!("Failed to tick timers: {}", e),
        }
    }
}
