//! Persistence for the robot between command submissions.
//!
//! A store keeps three things:
//! - the single current-state record (position and heading),
//! - the set of obstacle cells,
//! - an append-only history of every submitted command string.

use crate::error::StoreError;
use crate::robot::{Heading, Position, RobotState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

/// A history record before the store has assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub command: String,
    pub position: Position,
    pub direction: Heading,
    pub obstacle_detected: bool,
    pub stopped_at: Option<usize>,
}

/// One executed command string and the state it left the robot in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub command: String,
    pub position: Position,
    pub direction: Heading,
    pub obstacle_detected: bool,
    pub stopped_at: Option<usize>,
    pub executed_at: DateTime<Utc>,
}

/// Backend holding the robot's persisted state.
pub trait StateStore {
    /// The current-state record, `None` if nothing was saved yet.
    fn load_state(&self) -> StoreResult<Option<RobotState>>;

    /// Replace the current-state record.
    fn save_state(&mut self, state: RobotState) -> StoreResult<()>;

    fn obstacles(&self) -> StoreResult<BTreeSet<Position>>;

    /// Returns `false` if the cell was already blocked.
    fn add_obstacle(&mut self, position: Position) -> StoreResult<bool>;

    /// Returns `false` if the cell was not blocked.
    fn remove_obstacle(&mut self, position: Position) -> StoreResult<bool>;

    /// Replace the current-state record and append a history record as one
    /// write: either both land or neither does. The store assigns the record's
    /// id and timestamp.
    fn record_run(
        &mut self,
        state: RobotState,
        entry: NewHistoryEntry,
    ) -> StoreResult<HistoryEntry>;

    /// All records, oldest first.
    fn history(&self) -> StoreResult<Vec<HistoryEntry>>;
}

/// Everything a store persists, in one serializable document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    state: Option<RobotState>,
    #[serde(default)]
    obstacles: BTreeSet<Position>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

impl Snapshot {
    fn push_history(&mut self, entry: NewHistoryEntry) -> HistoryEntry {
        let id = self.history.last().map_or(1, |last| last.id + 1);
        let record = HistoryEntry {
            id,
            command: entry.command,
            position: entry.position,
            direction: entry.direction,
            obstacle_detected: entry.obstacle_detected,
            stopped_at: entry.stopped_at,
            executed_at: Utc::now(),
        };
        self.history.push(record.clone());
        record
    }
}

/// Store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with obstacle cells.
    pub fn with_obstacles(obstacles: impl IntoIterator<Item = Position>) -> Self {
        Self {
            data: Snapshot {
                obstacles: obstacles.into_iter().collect(),
                ..Snapshot::default()
            },
        }
    }
}

impl StateStore for MemoryStore {
    fn load_state(&self) -> StoreResult<Option<RobotState>> {
        Ok(self.data.state)
    }

    fn save_state(&mut self, state: RobotState) -> StoreResult<()> {
        self.data.state = Some(state);
        Ok(())
    }

    fn obstacles(&self) -> StoreResult<BTreeSet<Position>> {
        Ok(self.data.obstacles.clone())
    }

    fn add_obstacle(&mut self, position: Position) -> StoreResult<bool> {
        Ok(self.data.obstacles.insert(position))
    }

    fn remove_obstacle(&mut self, position: Position) -> StoreResult<bool> {
        Ok(self.data.obstacles.remove(&position))
    }

    fn record_run(
        &mut self,
        state: RobotState,
        entry: NewHistoryEntry,
    ) -> StoreResult<HistoryEntry> {
        self.data.state = Some(state);
        Ok(self.data.push_history(entry))
    }

    fn history(&self) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self.data.history.clone())
    }
}

/// Store backed by a single JSON document on disk.
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoreResult<Snapshot> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if text.trim().is_empty() {
            return Ok(Snapshot::default());
        }
        serde_json::from_str(&text).map_err(|e| StoreError::json(&self.path, e))
    }

    fn write(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let text =
            serde_json::to_string_pretty(snapshot).map_err(|e| StoreError::json(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn update<T>(&mut self, f: impl FnOnce(&mut Snapshot) -> T) -> StoreResult<T> {
        let mut snapshot = self.read()?;
        let out = f(&mut snapshot);
        self.write(&snapshot)?;
        Ok(out)
    }
}

impl StateStore for JsonFileStore {
    fn load_state(&self) -> StoreResult<Option<RobotState>> {
        Ok(self.read()?.state)
    }

    fn save_state(&mut self, state: RobotState) -> StoreResult<()> {
        self.update(|s| s.state = Some(state))
    }

    fn obstacles(&self) -> StoreResult<BTreeSet<Position>> {
        Ok(self.read()?.obstacles)
    }

    fn add_obstacle(&mut self, position: Position) -> StoreResult<bool> {
        self.update(|s| s.obstacles.insert(position))
    }

    fn remove_obstacle(&mut self, position: Position) -> StoreResult<bool> {
        self.update(|s| s.obstacles.remove(&position))
    }

    fn record_run(
        &mut self,
        state: RobotState,
        entry: NewHistoryEntry,
    ) -> StoreResult<HistoryEntry> {
        self.update(|s| {
            s.state = Some(state);
            s.push_history(entry)
        })
    }

    fn history(&self) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self.read()?.history)
    }
}
