//! Grid robot state machine.
//!
//! A [`Robot`] sits on an unbounded integer grid, faces one of four cardinal
//! [`Heading`]s and understands four single-character commands:
//!
//! | char | effect                          |
//! |------|---------------------------------|
//! | `F`  | one cell forward along heading  |
//! | `B`  | one cell backward along heading |
//! | `L`  | rotate 90 degrees left          |
//! | `R`  | rotate 90 degrees right         |
//!
//! Any other character is accepted and ignored.

use crate::error::{ParseHeadingError, ParsePositionError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Cardinal facing of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Headings in clockwise order. Rotation is index arithmetic over this table.
    pub const CLOCKWISE: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    fn index(self) -> usize {
        self as usize
    }

    /// Heading after a quarter turn counter-clockwise.
    pub fn left(self) -> Self {
        Self::CLOCKWISE[(self.index() + 3) % 4]
    }

    /// Heading after a quarter turn clockwise.
    pub fn right(self) -> Self {
        Self::CLOCKWISE[(self.index() + 1) % 4]
    }

    /// Unit step for moving forward while facing this way.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Heading::North => (0, 1),
            Heading::East => (1, 0),
            Heading::South => (0, -1),
            Heading::West => (-1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Heading::North => "NORTH",
            Heading::East => "EAST",
            Heading::South => "SOUTH",
            Heading::West => "WEST",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Heading {
    type Err = ParseHeadingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CLOCKWISE
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseHeadingError(s.to_string()))
    }
}

/// A cell on the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Cell reached by moving `steps` times along `heading`. Negative steps move backward.
    ///
    /// Returns `None` when the target does not fit into `i64` coordinates.
    pub fn offset(self, heading: Heading, steps: i64) -> Option<Self> {
        let (dx, dy) = heading.delta();
        Some(Self {
            x: self.x.checked_add(dx.checked_mul(steps)?)?,
            y: self.y.checked_add(dy.checked_mul(steps)?)?,
        })
    }
}

impl From<(i64, i64)> for Position {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn position_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?\d+)\s*,\s*([+-]?\d+)\s*$").expect("static regex is valid")
    })
}

/// Accepts `(x, y)` and the bare `x,y` form. Coordinates are plain decimal integers.
impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParsePositionError::Malformed(s.to_string());
        let trimmed = s.trim();
        let inner = match trimmed.strip_prefix('(') {
            Some(rest) => rest.strip_suffix(')').ok_or_else(malformed)?,
            None => trimmed,
        };
        let caps = position_regex().captures(inner).ok_or_else(malformed)?;
        let coord = |i: usize| {
            let text = &caps[i];
            text.parse::<i64>()
                .map_err(|_| ParsePositionError::OutOfRange(text.to_string()))
        };
        Ok(Self::new(coord(1)?, coord(2)?))
    }
}

/// Position and heading, the part of a robot that is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotState {
    pub position: Position,
    #[serde(rename = "direction")]
    pub heading: Heading,
}

impl RobotState {
    pub fn new(position: impl Into<Position>, heading: Heading) -> Self {
        Self {
            position: position.into(),
            heading,
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} facing {}", self.position, self.heading)
    }
}

/// Mutable robot driven by command characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Robot {
    position: Position,
    heading: Heading,
    obstacle_detected: bool,
    off_grid: bool,
}

impl Robot {
    pub fn new(state: RobotState) -> Self {
        Self {
            position: state.position,
            heading: state.heading,
            obstacle_detected: false,
            off_grid: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn state(&self) -> RobotState {
        RobotState::new(self.position, self.heading)
    }

    /// Whether an obstacle has been hit during this robot's run. Never cleared.
    pub fn obstacle_detected(&self) -> bool {
        self.obstacle_detected
    }

    /// Moves one cell along the heading. At the edge of the `i64` grid the
    /// robot stays put and the attempt is remembered, see [`Robot::take_off_grid`].
    pub fn move_forward(&mut self) {
        self.advance(1);
    }

    pub fn move_backward(&mut self) {
        self.advance(-1);
    }

    fn advance(&mut self, steps: i64) {
        match self.position.offset(self.heading, steps) {
            Some(next) => self.position = next,
            None => self.off_grid = true,
        }
    }

    /// Whether the last move tried to leave the representable grid. Reading clears it.
    pub fn take_off_grid(&mut self) -> bool {
        std::mem::take(&mut self.off_grid)
    }

    pub fn rotate_left(&mut self) {
        self.heading = self.heading.left();
    }

    pub fn rotate_right(&mut self) {
        self.heading = self.heading.right();
    }

    /// Applies one command character.
    ///
    /// Returns `true` for `F` and `B`, the only commands that can change the
    /// position. Rotations and unrecognized characters return `false`.
    pub fn dispatch(&mut self, command: char) -> bool {
        match command {
            'F' => {
                self.move_forward();
                true
            }
            'B' => {
                self.move_backward();
                true
            }
            'L' => {
                self.rotate_left();
                false
            }
            'R' => {
                self.rotate_right();
                false
            }
            _ => false,
        }
    }

    /// Puts the robot back on `position` after a blocked move and latches the obstacle flag.
    pub(crate) fn retreat(&mut self, position: Position) {
        self.position = position;
        self.obstacle_detected = true;
    }
}

impl From<RobotState> for Robot {
    fn from(state: RobotState) -> Self {
        Self::new(state)
    }
}
