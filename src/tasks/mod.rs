//! Background tasks module
//!
//! Tick sources that run alongside the HTTP server.

pub mod alarm_checker;
pub mod stopwatch_tick;
pub mod timer_tick;

// Re-export main functions
pub use alarm_checker::alarm_checker_task;
pub use stopwatch_tick::stopwatch_tick_task;
pub use timer_tick::timer_tick_task;
