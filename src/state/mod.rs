//! State management module
//!
//! The engines (timers, stopwatch, alarms, recipes, settings), the
//! collaborators they are built with, and the shared application state.

pub mod advisories;
pub mod alarm_state;
pub mod alarms;
pub mod app_state;
pub mod collaborators;
pub mod recipes;
pub mod settings;
pub mod stopwatch;
pub mod timer_state;
pub mod timers;

// Re-export main types
pub use advisories::{Advisories, Advisory};
pub use alarm_state::{Alarm, AlarmId, AlarmRepeat, AlarmTime};
pub use alarms::{AlarmBook, AlarmDraft, AlarmFiring, AlarmPreset, ALARM_PRESETS};
pub use app_state::{AppState, CompanionEvent};
pub use collaborators::{AlertSwitches, Collaborators};
pub use recipes::{Recipe, RecipeBook, RecipeDraft, RecipeId, ScaledRecipe};
pub use settings::{MeasurementSystem, Settings, SettingsBook, TemperatureUnit};
pub use stopwatch::{Split, Stopwatch, StopwatchPhase, StopwatchReading};
pub use timer_state::{Timer, TimerId, TimerPhase};
pub use timers::{TimerBoard, TimerCompletion, TimerPreset, TimerView, TIMER_PRESETS};
