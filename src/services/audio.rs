//! Audible alert playback

use tokio::{process::Command, runtime::Handle};
use tracing::{debug, warn};

pub trait AlertSound: Send + Sync {
    fn play_alert(&self);
}

/// Plays the alert by running an external sound player
#[derive(Debug, Clone)]
pub struct CommandAlertSound {
    program: String,
    args: Vec<String>,
}

impl CommandAlertSound {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `canberra-gtk-play -i complete`, present on most desktops
    pub fn canberra() -> Self {
        Self::new("canberra-gtk-play", vec!["-i".into(), "complete".into()])
    }

    /// Parse a whitespace separated command line such as `paplay bell.oga`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl AlertSound for CommandAlertSound {
    fn play_alert(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime, skipping alert sound");
            return;
        };
        let program = self.program.clone();
        let args = self.args.clone();
        runtime.spawn(async move {
            match Command::new(&program).args(&args).output().await {
                Ok(output) if !output.status.success() => {
                    warn!("{} exited with {}", program, output.status);
                }
                Ok(_) => debug!("Played alert via {}", program),
                Err(e) => warn!("Failed to execute {}: {}", program, e),
            }
        });
    }
}

/// Never makes a sound
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlertSound;

impl AlertSound for SilentAlertSound {
    fn play_alert(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_lines() {
        let sound = CommandAlertSound::from_command_line("paplay /usr/share/sounds/bell.oga").unwrap();
        assert_eq!(sound.program, "paplay");
        assert_eq!(sound.args, vec!["/usr/share/sounds/bell.oga".to_string()]);
        assert!(CommandAlertSound::from_command_line("   ").is_none());
    }
}
