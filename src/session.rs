use crate::config::Settings;
use crate::executor::{self, ExecutionOutcome};
use crate::robot::{Heading, Position, RobotState};
use crate::store::{HistoryEntry, JsonFileStore, MemoryStore, NewHistoryEntry, StateStore};
use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Owns the persisted robot and runs command strings against it.
///
/// Each submission loads the current state and the obstacle set, runs the
/// pure [`executor`], then saves the new state together with a history record.
/// Every mutating call takes `&mut self`, so submissions on one session
/// never interleave their read-modify-write of the current state.
pub struct Session {
    settings: Settings,
    store: Box<dyn StateStore>,
}

impl Session {
    pub fn new(settings: Settings, store: Box<dyn StateStore>) -> Self {
        Self { settings, store }
    }

    /// Open the store named by `settings.state_file`, or an in-memory one.
    pub fn open(settings: Settings) -> Self {
        let store: Box<dyn StateStore> = match &settings.state_file {
            Some(path) => {
                info!("persisting robot state to {}", path.display());
                Box::new(JsonFileStore::new(path))
            }
            None => {
                warn!("no state file configured, robot state is kept in memory only");
                Box::new(MemoryStore::new())
            }
        };
        Self::new(settings, store)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The persisted state, or the configured initial one when none exists.
    pub fn current_state(&self) -> Result<RobotState> {
        let stored = self
            .store
            .load_state()
            .context("failed to load robot state")?;
        Ok(stored.unwrap_or_else(|| self.settings.initial_state()))
    }

    pub fn status(&self) -> Result<RobotState> {
        self.current_state()
    }

    /// Run `commands` from the current state, then persist and record the result.
    pub fn submit(&mut self, commands: &str) -> Result<ExecutionOutcome> {
        let start = self.current_state()?;
        let obstacles = self
            .store
            .obstacles()
            .context("failed to load obstacles")?;
        debug!("{} obstacles loaded", obstacles.len());

        let outcome = executor::execute(commands, start, &obstacles);
        match outcome.stopped_at {
            Some(index) => warn!(
                "command {commands:?} halted at index {index}, robot stays at {}",
                outcome.position
            ),
            None => info!("command {commands:?} moved robot from {start} to {}", outcome.state()),
        }

        let entry = NewHistoryEntry {
            command: commands.to_string(),
            position: outcome.position,
            direction: outcome.direction,
            obstacle_detected: outcome.obstacle_detected,
            stopped_at: outcome.stopped_at,
        };
        self.store
            .record_run(outcome.state(), entry)
            .context("failed to save robot state and history")?;
        Ok(outcome)
    }

    /// Replace the current state. Missing values fall back to the configured initial ones.
    pub fn reset(&mut self, position: Option<Position>, heading: Option<Heading>) -> Result<RobotState> {
        let state = RobotState::new(
            position.unwrap_or(self.settings.start_position),
            heading.unwrap_or(self.settings.start_direction),
        );
        self.store
            .save_state(state)
            .context("failed to reset robot state")?;
        info!("robot reset to {state}");
        Ok(state)
    }

    /// The last `limit` history records (all of them when `None`), oldest first.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let mut history = self.store.history().context("failed to load history")?;
        if let Some(limit) = limit {
            let skip = history.len().saturating_sub(limit);
            history.drain(..skip);
        }
        Ok(history)
    }

    pub fn obstacles(&self) -> Result<BTreeSet<Position>> {
        self.store.obstacles().context("failed to load obstacles")
    }

    /// Block a cell. Returns `false` if it was already blocked.
    pub fn add_obstacle(&mut self, position: Position) -> Result<bool> {
        let current = self.current_state()?;
        if current.position == position {
            bail!("cannot place an obstacle on the robot at {position}");
        }
        let added = self
            .store
            .add_obstacle(position)
            .context("failed to store obstacle")?;
        if added {
            info!("obstacle added at {position}");
        }
        Ok(added)
    }

    /// Unblock a cell. Returns `false` if it was not blocked.
    pub fn remove_obstacle(&mut self, position: Position) -> Result<bool> {
        let removed = self
            .store
            .remove_obstacle(position)
            .context("failed to remove obstacle")?;
        if removed {
            info!("obstacle removed at {position}");
        }
        Ok(removed)
    }
}
