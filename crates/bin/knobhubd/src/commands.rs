//! Line commands read from stdin.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `cw [n]` | turn the knob `n` steps clockwise (default 1) |
//! | `ccw [n]` | turn the knob `n` steps counter-clockwise (default 1) |
//! | `next` | cycle the active app to its next setting |
//! | `open <app_id>` | make `app_id` the active app |
//! | `reload` | re-read the configuration and reload all apps |
//! | `menu` | list loaded apps |

use std::str::FromStr;

/// A parsed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Signed number of knob steps, clockwise positive.
    Rotate(i32),
    Next,
    Open(String),
    Reload,
    Menu,
}

/// Errors from parsing a command line.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("invalid step count `{0}`")]
    InvalidSteps(String),
    #[error("`open` needs an app id")]
    MissingAppId,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let argument = words.next();
        match name {
            "cw" => parse_steps(argument).map(Self::Rotate),
            "ccw" => parse_steps(argument).map(|steps| Self::Rotate(-steps)),
            "next" => Ok(Self::Next),
            "open" => argument
                .map(|id| Self::Open(id.to_string()))
                .ok_or(CommandError::MissingAppId),
            "reload" => Ok(Self::Reload),
            "menu" => Ok(Self::Menu),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_steps(argument: Option<&str>) -> Result<i32, CommandError> {
    match argument {
        None => Ok(1),
        Some(raw) => raw
            .parse::<u16>()
            .map(i32::from)
            .map_err(|_| CommandError::InvalidSteps(raw.to_string())),
    }
}
