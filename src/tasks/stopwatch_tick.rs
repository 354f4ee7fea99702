//! Stopwatch live-reading background task

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{AppState, StopwatchPhase};

/// Background task that publishes a live stopwatch reading every `tick`
/// while the stopwatch runs, and sleeps while it is stopped or paused
pub async fn stopwatch_tick_task(state: Arc<AppState>, tick: Duration) {
    info!("Starting stopwatch tick task ({}ms)", tick.as_millis());

    let mut phase_rx = state.stopwatch_phase_tx.subscribe();

    loop {
        let phase = *phase_rx.borrow_and_update();

        if phase == StopwatchPhase::Running {
            debug!("Stopwatch running, publishing readings");
            let mut interval = interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    // Tick - refresh the reading
                    _ = interval.tick() => {
                        if let Err(e) = state.publish_stopwatch(Utc::now()) {
                            error!("Failed to publish stopwatch reading: {}", e);
                        }
                    }

                    // Phase change - stop publishing unless still running
                    changed = phase_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if *phase_rx.borrow() != StopwatchPhase::Running {
                            break;
                        }
                    }
                }
            }

            // Final frozen reading
            if let Err(e) = state.publish_stopwatch(Utc::now()) {
                error!("Failed to publish stopwatch reading: {}", e);
            }
            continue;
        }

        debug!("Stopwatch {:?}, waiting for a phase change", phase);
        if phase_rx.changed().await.is_err() {
            info!("Stopwatch phase channel closed, stopping tick task");
            return;
        }
    }
}
