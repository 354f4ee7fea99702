//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "bake-companion")]
#[command(about = "Baking timers, stopwatch, alarms and kitchen conversions over a local HTTP API")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the saved recipes, alarms, timers, stopwatch and settings
    #[arg(short, long, default_value = "./bake-data")]
    pub data_dir: PathBuf,

    /// Keep everything in memory, nothing is written to disk
    #[arg(long)]
    pub ephemeral: bool,

    /// Seconds between alarm checks
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=60))]
    pub alarm_interval: u64,

    /// Milliseconds between live stopwatch readings
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(10..))]
    pub stopwatch_tick: u64,

    /// Command that plays the alert sound, split on whitespace
    #[arg(long, default_value = "canberra-gtk-play -i complete")]
    pub sound_command: String,

    /// Never send desktop notifications
    #[arg(long)]
    pub no_notifications: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn alarm_check_interval(&self) -> Duration {
        Duration::from_secs(self.alarm_interval)
    }

    pub fn stopwatch_tick_interval(&self) -> Duration {
        Duration::from_millis(self.stopwatch_tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_local_daemon() {
        let config = Config::try_parse_from(["bake-companion"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.alarm_check_interval(), Duration::from_secs(30));
        assert_eq!(config.stopwatch_tick_interval(), Duration::from_millis(100));
        assert_eq!(config.log_level(), "info");
        assert!(!config.ephemeral);
    }

    #[test]
    fn alarm_interval_must_fit_inside_a_minute() {
        assert!(Config::try_parse_from(["bake-companion", "--alarm-interval", "90"]).is_err());
        let config =
            Config::try_parse_from(["bake-companion", "--alarm-interval", "15", "-v"]).unwrap();
        assert_eq!(config.alarm_interval, 15);
        assert_eq!(config.log_level(), "debug");
    }
}
