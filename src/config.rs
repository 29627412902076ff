use crate::robot::{Heading, Position, RobotState};
use anyhow::{Context, Result};
use std::env as stdenv;
use std::path::PathBuf;

/// Initial position used when nothing has been persisted yet.
pub const START_POSITION_VAR: &str = "START_POSITION";
/// Initial heading used when nothing has been persisted yet.
pub const START_DIRECTION_VAR: &str = "START_DIRECTION";
/// Optional JSON file holding the robot state between runs.
pub const STATE_FILE_VAR: &str = "ROBOT_STATE_FILE";

/// Runtime settings of the robot service.
///
/// Values come from environment variables:
/// - `START_POSITION`: initial position, `(x, y)`. Defaults to `(0, 0)`.
/// - `START_DIRECTION`: initial heading. Defaults to `NORTH`.
/// - `ROBOT_STATE_FILE`: where to persist state. In-memory only when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub start_position: Position,
    pub start_direction: Heading,
    pub state_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_position: Position::new(0, 0),
            start_direction: Heading::North,
            state_file: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| stdenv::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let start_position = match get(START_POSITION_VAR) {
            Some(raw) => raw
                .parse::<Position>()
                .with_context(|| format!("{START_POSITION_VAR} is invalid"))?,
            None => defaults.start_position,
        };
        let start_direction = match get(START_DIRECTION_VAR) {
            Some(raw) => raw
                .parse::<Heading>()
                .with_context(|| format!("{START_DIRECTION_VAR} is invalid"))?,
            None => defaults.start_direction,
        };
        let state_file = get(STATE_FILE_VAR).map(PathBuf::from);

        Ok(Self {
            start_position,
            start_direction,
            state_file,
        })
    }

    /// The state a robot starts in before anything was persisted.
    pub fn initial_state(&self) -> RobotState {
        RobotState::new(self.start_position, self.start_direction)
    }
}
