use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::robot::{Heading, Position};
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::io::Write;

/// Console commands known at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly against the [`Environment`].
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "move" or "status".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match T::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{}: {:#}", T::name(), e)?;
                Ok(1)
            }
        }
    }
}

/// Usage or parse error produced by argh instead of a command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

fn write_json(stdout: &mut dyn Write, value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string(value).context("failed to encode json")?;
    writeln!(stdout, "{text}")?;
    Ok(())
}

#[derive(FromArgs)]
/// Run a string of robot commands: F (forward), B (backward), L (turn left), R (turn right).
/// Other characters are ignored. The run stops at the first obstacle.
pub struct Move {
    #[argh(positional)]
    /// the command string, e.g. FFRFF
    pub commands: String,

    #[argh(switch)]
    /// print the outcome as json
    pub json: bool,
}

impl BuiltinCommand for Move {
    fn name() -> &'static str {
        "move"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let outcome = env.session.submit(&self.commands)?;
        if self.json {
            write_json(stdout, &outcome)?;
        } else {
            writeln!(stdout, "{} facing {}", outcome.position, outcome.direction)?;
            if let Some(index) = outcome.stopped_at {
                writeln!(stdout, "obstacle detected, stopped at command {index}")?;
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the robot's current position and direction.
pub struct Status {
    #[argh(switch)]
    /// print the state as json
    pub json: bool,
}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let state = env.session.status()?;
        if self.json {
            write_json(stdout, &state)?;
        } else {
            writeln!(stdout, "{state}")?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Put the robot back on its start cell, or on the given position and direction.
pub struct Reset {
    #[argh(option)]
    /// new position as (x,y); defaults to START_POSITION
    pub position: Option<Position>,

    #[argh(option)]
    /// new direction, any case: NORTH, SOUTH, EAST or WEST; defaults to START_DIRECTION
    pub direction: Option<Heading>,
}

impl BuiltinCommand for Reset {
    fn name() -> &'static str {
        "reset"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let state = env.session.reset(self.position, self.direction)?;
        writeln!(stdout, "robot reset to {state}")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List blocked cells.
pub struct Obstacles {}

impl BuiltinCommand for Obstacles {
    fn name() -> &'static str {
        "obstacles"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let obstacles = env.session.obstacles()?;
        if obstacles.is_empty() {
            writeln!(stdout, "no obstacles")?;
        }
        for cell in obstacles {
            writeln!(stdout, "{cell}")?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Mark a cell as blocked.
pub struct Block {
    #[argh(positional)]
    /// cell to block, as (x,y)
    pub position: Position,
}

impl BuiltinCommand for Block {
    fn name() -> &'static str {
        "block"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if env.session.add_obstacle(self.position)? {
            writeln!(stdout, "blocked {}", self.position)?;
        } else {
            writeln!(stdout, "{} is already blocked", self.position)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove an obstacle.
pub struct Unblock {
    #[argh(positional)]
    /// cell to clear, as (x,y)
    pub position: Position,
}

impl BuiltinCommand for Unblock {
    fn name() -> &'static str {
        "unblock"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if env.session.remove_obstacle(self.position)? {
            writeln!(stdout, "unblocked {}", self.position)?;
            Ok(0)
        } else {
            writeln!(stdout, "{} is not blocked", self.position)?;
            Ok(1)
        }
    }
}

#[derive(FromArgs)]
/// Show previously executed command strings, oldest first.
pub struct History {
    #[argh(option, short = 'n')]
    /// only show the last N entries
    pub limit: Option<usize>,

    #[argh(switch)]
    /// print entries as json, one per line
    pub json: bool,
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for entry in env.session.history(self.limit)? {
            if self.json {
                write_json(stdout, &entry)?;
                continue;
            }
            write!(
                stdout,
                "{:>4}  {}  {:?} -> {} facing {}",
                entry.id,
                entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
                entry.command,
                entry.position,
                entry.direction
            )?;
            match entry.stopped_at {
                Some(index) => writeln!(stdout, " (stopped at {index})")?,
                None => writeln!(stdout)?,
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the console.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::session::Session;
    use crate::store::MemoryStore;

    fn env_with(obstacles: &[(i64, i64)]) -> Environment {
        let store = MemoryStore::with_obstacles(obstacles.iter().copied().map(Position::from));
        Environment::new(Session::new(Settings::default(), Box::new(store)))
    }

    fn run<T: BuiltinCommand>(cmd: T, env: &mut Environment) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = ExecutableCommand::execute(Box::new(cmd), &mut out, env).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn move_cmd(commands: &str, json: bool) -> Move {
        Move {
            commands: commands.to_string(),
            json,
        }
    }

    #[test]
    fn test_move_prints_outcome() {
        let mut env = env_with(&[]);
        let (code, out) = run(move_cmd("FFRFF", false), &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "(2, 2) facing EAST\n");
    }

    #[test]
    fn test_move_reports_obstacle() {
        let mut env = env_with(&[(0, 1)]);
        let (code, out) = run(move_cmd("F", false), &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "(0, 0) facing NORTH\nobstacle detected, stopped at command 0\n");
    }

    #[test]
    fn test_move_json() {
        let mut env = env_with(&[]);
        let (_, out) = run(move_cmd("FXF", true), &mut env);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "position": {"x": 0, "y": 2},
                "direction": "NORTH",
                "obstacle_detected": false,
                "stopped_at": null
            })
        );
    }

    #[test]
    fn test_status_and_reset() {
        let mut env = env_with(&[]);
        run(move_cmd("FL", false), &mut env);
        let (_, out) = run(Status { json: false }, &mut env);
        assert_eq!(out, "(0, 1) facing WEST\n");

        let reset = Reset {
            position: Some(Position::new(3, 3)),
            direction: Some(Heading::South),
        };
        let (code, out) = run(reset, &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "robot reset to (3, 3) facing SOUTH\n");

        let (_, out) = run(Status { json: true }, &mut env);
        assert_eq!(
            out,
            "{\"position\":{\"x\":3,\"y\":3},\"direction\":\"SOUTH\"}\n"
        );
    }

    #[test]
    fn test_block_unblock_and_list() {
        let mut env = env_with(&[]);
        let (_, out) = run(Obstacles {}, &mut env);
        assert_eq!(out, "no obstacles\n");

        let (_, out) = run(Block { position: Position::new(1, -1) }, &mut env);
        assert_eq!(out, "blocked (1, -1)\n");
        let (_, out) = run(Block { position: Position::new(1, -1) }, &mut env);
        assert_eq!(out, "(1, -1) is already blocked\n");

        let (_, out) = run(Obstacles {}, &mut env);
        assert_eq!(out, "(1, -1)\n");

        let (code, _) = run(Unblock { position: Position::new(1, -1) }, &mut env);
        assert_eq!(code, 0);
        let (code, out) = run(Unblock { position: Position::new(1, -1) }, &mut env);
        assert_eq!(code, 1);
        assert_eq!(out, "(1, -1) is not blocked\n");
    }

    #[test]
    fn test_block_on_robot_fails_with_message() {
        let mut env = env_with(&[]);
        let (code, out) = run(Block { position: Position::new(0, 0) }, &mut env);
        assert_eq!(code, 1);
        assert!(out.starts_with("block: cannot place an obstacle"));
    }

    #[test]
    fn test_history_lists_runs() {
        let mut env = env_with(&[(0, 3)]);
        run(move_cmd("FF", false), &mut env);
        run(move_cmd("RLF", false), &mut env);

        let (_, out) = run(History { limit: None, json: false }, &mut env);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"FF\" -> (0, 2) facing NORTH"));
        assert!(lines[1].ends_with("\"RLF\" -> (0, 2) facing NORTH (stopped at 2)"));

        let (_, out) = run(History { limit: Some(1), json: true }, &mut env);
        let entry: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(entry["command"], "RLF");
        assert_eq!(entry["obstacle_detected"], true);
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut env = env_with(&[]);
        assert!(!env.should_exit);
        run(Exit {}, &mut env);
        assert!(env.should_exit);
    }

    #[test]
    fn test_factory_parses_arguments() {
        let factory = Factory::<Reset>::default();
        assert!(factory.try_create("status", &[]).is_none());

        let mut env = env_with(&[]);
        let cmd = factory
            .try_create("reset", &["--position", "(2,5)", "--direction", "east"])
            .unwrap();
        let mut out = Vec::new();
        assert_eq!(cmd.execute(&mut out, &mut env).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "robot reset to (2, 5) facing EAST\n");
    }

    #[test]
    fn test_reset_help_mentions_any_case() {
        let factory = Factory::<Reset>::default();
        let mut env = env_with(&[]);
        let cmd = factory.try_create("reset", &["--help"]).unwrap();
        let mut out = Vec::new();
        assert_eq!(cmd.execute(&mut out, &mut env).unwrap(), 0);
        assert!(String::from_utf8(out).unwrap().contains("new direction, any case"));

        let cmd = factory.try_create("reset", &["--direction", "sOuTh"]).unwrap();
        assert_eq!(cmd.execute(&mut Vec::new(), &mut env).unwrap(), 0);
        assert_eq!(env.session.status().unwrap().heading, Heading::South);
    }

    #[test]
    fn test_factory_reports_bad_arguments() {
        let factory = Factory::<Reset>::default();
        let mut env = env_with(&[]);
        let cmd = factory
            .try_create("reset", &["--direction", "UP"])
            .unwrap();
        let mut out = Vec::new();
        assert_eq!(cmd.execute(&mut out, &mut env).unwrap(), 1);
        assert!(String::from_utf8(out).unwrap().contains("invalid direction"));
    }

    #[test]
    fn test_factory_help_is_not_an_error() {
        let factory = Factory::<Move>::default();
        let mut env = env_with(&[]);
        let cmd = factory.try_create("move", &["--help"]).unwrap();
        let mut out = Vec::new();
        assert_eq!(cmd.execute(&mut out, &mut env).unwrap(), 0);
        assert!(String::from_utf8(out).unwrap().contains("Usage: move"));
    }
}
