//! Utility functions module
//!
//! Pure helpers shared by the engines and the HTTP layer, plus signal
//! handling for the daemon.

pub mod conversions;
pub mod ingredients;
pub mod signals;
pub mod time_format;

// Re-export main functions
pub use conversions::{
    celsius_to_fahrenheit, convert, convert_volume, convert_weight, cups_to_grams,
    fahrenheit_to_celsius, scale_recipe, Unit,
};
pub use ingredients::scale_ingredient_line;
pub use signals::shutdown_signal;
pub use time_format::{format_time, format_time_with_milliseconds, parse_time_string};
