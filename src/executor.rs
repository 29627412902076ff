//! Obstacle-aware command replay.
//!
//! An [`Executor`] feeds a command string into a [`Robot`] one character at a
//! time. After every command that can move the robot it checks the new cell
//! against an [`ObstacleMap`]; a blocked move is undone and the run halts on
//! the spot. There is no skipping ahead: the first obstacle ends the run.
//!
//! ```
//! use moon_robot::executor::execute;
//! use moon_robot::robot::{Heading, Position, RobotState};
//! use std::collections::HashSet;
//!
//! let obstacles: HashSet<Position> = [Position::new(0, 2)].into_iter().collect();
//! let outcome = execute("FFF", RobotState::new((0, 0), Heading::North), &obstacles);
//! assert_eq!(outcome.position, Position::new(0, 1));
//! assert!(outcome.obstacle_detected);
//! assert_eq!(outcome.stopped_at, Some(1));
//! ```

use crate::robot::{Heading, Position, Robot, RobotState};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::BuildHasher;

/// Exact-cell membership test for blocked grid cells.
pub trait ObstacleMap {
    fn is_blocked(&self, position: Position) -> bool;
}

impl<S: BuildHasher> ObstacleMap for HashSet<Position, S> {
    fn is_blocked(&self, position: Position) -> bool {
        self.contains(&position)
    }
}

impl ObstacleMap for BTreeSet<Position> {
    fn is_blocked(&self, position: Position) -> bool {
        self.contains(&position)
    }
}

impl ObstacleMap for [Position] {
    fn is_blocked(&self, position: Position) -> bool {
        self.contains(&position)
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Still accepting commands.
    Running,
    /// Stopped by an obstacle. Terminal.
    Halted,
    /// Every command was processed without a collision. Terminal.
    Completed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        self != RunState::Running
    }
}

/// Result of running a command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub position: Position,
    pub direction: Heading,
    pub obstacle_detected: bool,
    /// Index of the command that hit an obstacle, if any.
    pub stopped_at: Option<usize>,
}

impl ExecutionOutcome {
    /// Final position and heading, ready to be persisted.
    pub fn state(&self) -> RobotState {
        RobotState::new(self.position, self.direction)
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} facing {}", self.position, self.direction)?;
        if let Some(index) = self.stopped_at {
            write!(f, " (obstacle ahead, stopped at command {index})")?;
        }
        Ok(())
    }
}

/// Drives one robot through a command string against a fixed obstacle set.
pub struct Executor<'a, O: ObstacleMap + ?Sized> {
    robot: Robot,
    obstacles: &'a O,
    state: RunState,
    stopped_at: Option<usize>,
}

impl<'a, O: ObstacleMap + ?Sized> Executor<'a, O> {
    pub fn new(start: RobotState, obstacles: &'a O) -> Self {
        Self {
            robot: Robot::new(start),
            obstacles,
            state: RunState::Running,
            stopped_at: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Processes the command at `index` of the input.
    ///
    /// A move onto a blocked cell, or past the edge of the `i64` grid, is
    /// undone and halts the run. Ignored once the run is terminal.
    pub fn step(&mut self, index: usize, command: char) -> RunState {
        if self.state.is_terminal() {
            return self.state;
        }

        let previous = self.robot.position();
        let moved = self.robot.dispatch(command);
        if !moved {
            return self.state;
        }
        if self.robot.take_off_grid() {
            debug!("command {index} ({command:?}) leaves the grid, staying on {previous}");
        } else if self.obstacles.is_blocked(self.robot.position()) {
            debug!(
                "command {index} ({command:?}) blocked at {}, staying on {previous}",
                self.robot.position()
            );
        } else {
            return self.state;
        }
        self.robot.retreat(previous);
        self.stopped_at = Some(index);
        self.state = RunState::Halted;
        self.state
    }

    /// Marks the end of input. A run that is still going becomes `Completed`;
    /// a halted run stays halted.
    pub fn complete(&mut self) -> RunState {
        if self.state == RunState::Running {
            self.state = RunState::Completed;
        }
        self.state
    }

    /// Where the robot is right now.
    pub fn outcome(&self) -> ExecutionOutcome {
        ExecutionOutcome {
            position: self.robot.position(),
            direction: self.robot.heading(),
            obstacle_detected: self.robot.obstacle_detected(),
            stopped_at: self.stopped_at,
        }
    }

    /// Ends the run and reports where the robot ended up.
    pub fn finish(mut self) -> ExecutionOutcome {
        self.complete();
        self.outcome()
    }

    /// Feeds every command in `commands` until the input runs out or the run halts.
    pub fn feed(&mut self, commands: &str) -> RunState {
        for (index, command) in commands.chars().enumerate() {
            if self.step(index, command) == RunState::Halted {
                return RunState::Halted;
            }
        }
        self.complete()
    }

    /// Runs every command in `commands` until completion or the first obstacle.
    pub fn run(mut self, commands: &str) -> ExecutionOutcome {
        self.feed(commands);
        self.outcome()
    }
}

/// Runs `commands` from `start` and returns the resulting state.
///
/// Pure function of its inputs: nothing is read from or written to any store.
pub fn execute<O: ObstacleMap + ?Sized>(
    commands: &str,
    start: RobotState,
    obstacles: &O,
) -> ExecutionOutcome {
    debug!("executing {commands:?} from {start}");
    Executor::new(start, obstacles).run(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin_north() -> RobotState {
        RobotState::new((0, 0), Heading::North)
    }

    fn obstacles(cells: &[(i64, i64)]) -> HashSet<Position> {
        cells.iter().copied().map(Position::from).collect()
    }

    #[test]
    fn test_empty_command_string() {
        let outcome = execute("", RobotState::new((4, -7), Heading::East), &obstacles(&[]));
        assert_eq!(outcome.position, Position::new(4, -7));
        assert_eq!(outcome.direction, Heading::East);
        assert!(!outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, None);
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        let outcome = execute("FXF", origin_north(), &obstacles(&[]));
        assert_eq!(outcome.position, Position::new(0, 2));
        assert_eq!(outcome.direction, Heading::North);
        assert!(!outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, None);
    }

    #[test]
    fn test_single_blocked_move_rolls_back() {
        let outcome = execute("F", origin_north(), &obstacles(&[(0, 1)]));
        assert_eq!(outcome.position, Position::new(0, 0));
        assert_eq!(outcome.direction, Heading::North);
        assert!(outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, Some(0));
    }

    #[test]
    fn test_first_command_blocked_stops_whole_run() {
        let outcome = execute("FRF", origin_north(), &obstacles(&[(0, 1), (1, 1), (1, 0)]));
        assert_eq!(outcome.position, Position::new(0, 0));
        assert_eq!(outcome.direction, Heading::North);
        assert!(outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, Some(0));
    }

    #[test]
    fn test_complex_sequence_without_obstacles() {
        let outcome = execute("FFRLB", origin_north(), &obstacles(&[]));
        assert_eq!(outcome.position, Position::new(0, 1));
        assert_eq!(outcome.direction, Heading::North);
        assert!(!outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, None);
    }

    #[test]
    fn test_halt_keeps_earlier_rotation_and_skips_the_rest() {
        // F -> (0,1), R -> EAST, F -> (1,1) blocked; trailing L never runs.
        let outcome = execute("FRFL", origin_north(), &obstacles(&[(1, 1)]));
        assert_eq!(outcome.position, Position::new(0, 1));
        assert_eq!(outcome.direction, Heading::East);
        assert!(outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, Some(2));
    }

    #[test]
    fn test_backward_move_into_obstacle() {
        let outcome = execute("BB", origin_north(), &obstacles(&[(0, -2)]));
        assert_eq!(outcome.position, Position::new(0, -1));
        assert_eq!(outcome.stopped_at, Some(1));
    }

    #[test]
    fn test_rotation_on_blocked_neighbour_is_not_a_collision() {
        let outcome = execute("LLLL", origin_north(), &obstacles(&[(0, 1), (1, 0), (0, -1), (-1, 0)]));
        assert_eq!(outcome.position, Position::new(0, 0));
        assert!(!outcome.obstacle_detected);
    }

    #[test]
    fn test_stopped_at_counts_ignored_characters() {
        let outcome = execute("x?F", origin_north(), &obstacles(&[(0, 1)]));
        assert_eq!(outcome.stopped_at, Some(2));
    }

    #[test]
    fn test_starting_on_obstacle_only_matters_after_moving() {
        // A rotation-only run never checks the current cell.
        let outcome = execute("R", origin_north(), &obstacles(&[(0, 0)]));
        assert!(!outcome.obstacle_detected);
        assert_eq!(outcome.direction, Heading::East);
    }

    #[test]
    fn test_executor_state_transitions() {
        let blocked = obstacles(&[(0, 2)]);
        let mut exec = Executor::new(origin_north(), &blocked);
        assert_eq!(exec.state(), RunState::Running);
        assert_eq!(exec.step(0, 'F'), RunState::Running);
        assert_eq!(exec.step(1, 'F'), RunState::Halted);

        // No transition leaves a terminal state.
        assert_eq!(exec.step(2, 'B'), RunState::Halted);
        assert_eq!(exec.complete(), RunState::Halted);
        assert_eq!(exec.robot().position(), Position::new(0, 1));

        let outcome = exec.finish();
        assert_eq!(outcome.stopped_at, Some(1));
        assert!(outcome.obstacle_detected);
    }

    #[test]
    fn test_run_without_collision_completes() {
        let none = obstacles(&[]);
        let mut exec = Executor::new(origin_north(), &none);
        assert_eq!(exec.feed(""), RunState::Completed);
        assert_eq!(exec.state(), RunState::Completed);

        let mut exec = Executor::new(origin_north(), &none);
        assert_eq!(exec.feed("FRF"), RunState::Completed);
        assert_eq!(exec.robot().state(), RobotState::new((1, 1), Heading::East));

        // Completed is terminal: later commands change nothing.
        assert_eq!(exec.step(3, 'F'), RunState::Completed);
        assert_eq!(exec.step(4, 'L'), RunState::Completed);
        assert_eq!(exec.robot().state(), RobotState::new((1, 1), Heading::East));
        assert_eq!(exec.outcome().stopped_at, None);
    }

    #[test]
    fn test_halted_feed_does_not_complete() {
        let blocked = obstacles(&[(0, 1)]);
        let mut exec = Executor::new(origin_north(), &blocked);
        assert_eq!(exec.feed("RRF"), RunState::Completed);

        let mut exec = Executor::new(origin_north(), &blocked);
        assert_eq!(exec.feed("FR"), RunState::Halted);
        assert_eq!(exec.state(), RunState::Halted);
        assert_eq!(exec.robot().heading(), Heading::North);
    }

    #[test]
    fn test_move_off_grid_halts_like_an_obstacle() {
        let outcome = execute(
            "F",
            RobotState::new((0, i64::MAX), Heading::North),
            &obstacles(&[]),
        );
        assert_eq!(outcome.position, Position::new(0, i64::MAX));
        assert_eq!(outcome.direction, Heading::North);
        assert!(outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, Some(0));

        let outcome = execute(
            "RB",
            RobotState::new((i64::MIN + 1, 5), Heading::North),
            &obstacles(&[]),
        );
        assert_eq!(outcome.position, Position::new(i64::MIN, 5));
        assert!(!outcome.obstacle_detected);

        let outcome = execute(
            "RBBL",
            RobotState::new((i64::MIN + 1, 5), Heading::North),
            &obstacles(&[]),
        );
        assert_eq!(outcome.position, Position::new(i64::MIN, 5));
        assert_eq!(outcome.direction, Heading::East);
        assert!(outcome.obstacle_detected);
        assert_eq!(outcome.stopped_at, Some(2));
    }

    #[test]
    fn test_other_obstacle_collections() {
        let tree: BTreeSet<Position> = [Position::new(1, 0)].into_iter().collect();
        let outcome = execute("RF", origin_north(), &tree);
        assert_eq!(outcome.stopped_at, Some(1));

        let slice = [Position::new(-1, 0)];
        let outcome = execute("LF", origin_north(), &slice[..]);
        assert_eq!(outcome.stopped_at, Some(1));
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = execute("F", origin_north(), &obstacles(&[(0, 1)]));
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "position": {"x": 0, "y": 0},
                "direction": "NORTH",
                "obstacle_detected": true,
                "stopped_at": 0
            })
        );
    }
}
