//! A grid robot that follows strings of movement commands.
//!
//! The robot lives on an unbounded integer grid and understands `F`
//! (forward), `B` (backward), `L` and `R` (quarter turns). Command strings are
//! replayed one character at a time; the first move onto a blocked cell is
//! undone and ends the run.
//!
//! The crate is layered:
//! - [`robot`] and [`executor`] form the pure core: a state machine and the
//!   obstacle-aware replay. No I/O, no errors.
//! - [`store`] and [`session`] persist the robot between submissions: the
//!   current state, the obstacle set and an append-only history.
//! - [`Interpreter`] is a small console on top of a session, used by the
//!   `moon_robot` binary.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
mod interpreter;
mod lexer;
pub mod robot;
pub mod session;
pub mod store;

/// Just a convenient re-export of the interactive console.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use executor::{ExecutionOutcome, execute};
pub use robot::{Heading, Position, Robot, RobotState};
