use std::str::FromStr;

/// Everything a user can do on the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserAction {
    TogglePlay,
    SkipForward,
    SkipBackward,
    ToggleShuffle,
    ToggleRepeat,
    ToggleMute,
    /// Volume slider, 0.0 to 1.0
    SetVolume(f32),
    /// Click on the progress bar, 0 to 100
    SeekPercent(f64),
    /// Jump to a playlist entry (0-based)
    Select(usize),
}

/// Volume slider resolution (steps of 0.01)
pub const VOLUME_STEPS: f32 = 100.0;

/// Snap a slider value to the control's step and range.
pub fn quantize_volume(volume: f32) -> f32 {
    ((volume * VOLUME_STEPS).round() / VOLUME_STEPS).clamp(0.0, 1.0)
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("'{command}' needs a value")]
    MissingArgument { command: String },

    #[error("Invalid value for '{command}': {value}")]
    InvalidArgument { command: String, value: String },
}

fn argument<'a>(command: &str, arg: Option<&'a str>) -> Result<&'a str, CommandParseError> {
    arg.ok_or_else(|| CommandParseError::MissingArgument {
        command: command.to_string(),
    })
}

fn invalid(command: &str, value: &str) -> CommandParseError {
    CommandParseError::InvalidArgument {
        command: command.to_string(),
        value: value.to_string(),
    }
}

/// Typed commands from the terminal front end.
///
/// `select` takes the 1-based position shown to the user.
impl FromStr for UserAction {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let command = parts.next().ok_or(CommandParseError::Empty)?.to_lowercase();
        let arg = parts.next();

        match command.as_str() {
            "play" | "pause" | "toggle" | "p" => Ok(UserAction::TogglePlay),
            "next" | "n" => Ok(UserAction::SkipForward),
            "prev" | "previous" | "b" => Ok(UserAction::SkipBackward),
            "shuffle" => Ok(UserAction::ToggleShuffle),
            "repeat" => Ok(UserAction::ToggleRepeat),
            "mute" | "m" => Ok(UserAction::ToggleMute),
            "volume" | "vol" => {
                let raw = argument(&command, arg)?;
                match raw.parse::<f32>() {
                    Ok(v) if (0.0..=1.0).contains(&v) => {
                        Ok(UserAction::SetVolume(quantize_volume(v)))
                    }
                    _ => Err(invalid(&command, raw)),
                }
            }
            "seek" => {
                let raw = argument(&command, arg)?;
                match raw.parse::<f64>() {
                    Ok(p) if (0.0..=100.0).contains(&p) => Ok(UserAction::SeekPercent(p)),
                    _ => Err(invalid(&command, raw)),
                }
            }
            "select" => {
                let raw = argument(&command, arg)?;
                match raw.parse::<usize>() {
                    Ok(n) if n >= 1 => Ok(UserAction::Select(n - 1)),
                    _ => Err(invalid(&command, raw)),
                }
            }
            _ => Err(CommandParseError::Unknown(command)),
        }
    }
}
