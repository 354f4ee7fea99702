//! Bake Companion - the core of a baking assistant
//!
//! Kitchen unit conversions and time formatting, plus engines for countdown
//! timers, a lap stopwatch, wall-clock alarms, a recipe book and user
//! settings. The engines persist through a pluggable store and signal the
//! user through pluggable notification and sound backends. The binary
//! serves everything over a local HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{CompanionError, Result};
pub use state::{AppState, Collaborators};
pub use utils::signals::shutdown_signal;
