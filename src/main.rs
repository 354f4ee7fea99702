//! Bake Companion - timers, stopwatch, alarms and kitchen conversions
//!
//! This is the main entry point for the bake-companion daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use bake_companion::{
    api::create_router,
    config::Config,
    services::{
        AlertSound, CommandAlertSound, DesktopNotifier, JsonFileStore, MemoryStore, NoopNotifier,
        Notifier, Store,
    },
    state::{AppState, Collaborators},
    tasks::{alarm_checker_task, stopwatch_tick_task, timer_tick_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("bake_companion={},tower_http=info", config.log_level()))
        .init();

    info!("Starting bake-companion v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={}, ephemeral={}, alarm_interval={}s",
        config.host,
        config.port,
        config.data_dir.display(),
        config.ephemeral,
        config.alarm_interval
    );

    let store: Arc<dyn Store> = if config.ephemeral {
        info!("Ephemeral mode, nothing will be saved");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::open(&config.data_dir)?)
    };

    let notifier: Arc<dyn Notifier> = if config.no_notifications {
        Arc::new(NoopNotifier)
    } else {
        Arc::new(DesktopNotifier::probe("notify-send").await)
    };

    let sound: Arc<dyn AlertSound> = Arc::new(
        CommandAlertSound::from_command_line(&config.sound_command)
            .unwrap_or_else(CommandAlertSound::canberra),
    );

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        Collaborators::new(store, notifier, sound),
    ));
    state.log_summary();

    // Start the tick sources
    tokio::spawn(timer_tick_task(Arc::clone(&state)));
    tokio::spawn(stopwatch_tick_task(
        Arc::clone(&state),
        config.stopwatch_tick_interval(),
    ));
    tokio::spawn(alarm_checker_task(
        Arc::clone(&state),
        config.alarm_check_interval(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timers, /stopwatch, /alarms, /recipes, /settings");
    info!("  POST /convert, /convert/temperature, /time/format, /time/parse");
    info!("  GET  /events          - Timer and alarm events (SSE)");
    info!("  GET  /stopwatch/live  - Live stopwatch readings (SSE)");
    info!("  GET  /status          - Engine summary and advisories");
    info!("  GET  /health          - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
