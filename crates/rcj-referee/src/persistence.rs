use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{RuleFlags, SnapshotRecord};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed state: {0}")]
    Format(#[from] serde_json::Error),
}

fn yes() -> bool {
    true
}

/// Everything the supervisor keeps across restarts.
///
/// Missing keys fall back to their defaults, so older or partial files still
/// load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(rename = "Y", default, skip_serializing_if = "Option::is_none")]
    pub yellow_controller: Option<String>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub blue_controller: Option<String>,
    #[serde(default)]
    pub saved_snapshot: Option<SnapshotRecord>,
    #[serde(default = "yes")]
    pub check_timer_flag: bool,
    #[serde(default = "yes")]
    pub check_progress_flag: bool,
    #[serde(default = "yes")]
    pub check_goal_flag: bool,
    #[serde(default = "yes")]
    pub check_robots_in_penalty_area_flag: bool,
}

impl PersistedState {
    pub fn flags(&self) -> RuleFlags {
        RuleFlags {
            check_timer: self.check_timer_flag,
            check_progress: self.check_progress_flag,
            check_goal: self.check_goal_flag,
            check_robots_in_penalty_area: self.check_robots_in_penalty_area_flag,
        }
    }

    pub fn set_flags(&mut self, flags: RuleFlags) {
        self.check_timer_flag = flags.check_timer;
        self.check_progress_flag = flags.check_progress;
        self.check_goal_flag = flags.check_goal;
        self.check_robots_in_penalty_area_flag = flags.check_robots_in_penalty_area;
    }
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            yellow_controller: None,
            blue_controller: None,
            saved_snapshot: None,
            check_timer_flag: true,
            check_progress_flag: true,
            check_goal_flag: true,
            check_robots_in_penalty_area_flag: true,
        }
    }
}

/// Durable storage for the supervisor state.
pub trait StateStore: Send {
    fn load(&self) -> Result<PersistedState, PersistError>;

    fn store(&mut self, state: &PersistedState) -> Result<(), PersistError>;

    /// Load the state, falling back to defaults on any failure.
    fn load_or_default(&self) -> PersistedState {
        match self.load() {
            Ok(state) => state,
            Err(err) => {
                log::warn!("Could not read the saved state, using defaults: {}", err);
                PersistedState::default()
            }
        }
    }
}

/// Keeps the state as a JSON file.
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

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<PersistedState, PersistError> {
        let data = fs::read_to_string(&self.path).map_err(|err| self.io_error(err))?;
        Ok(serde_json::from_str(&data)?)
    }

    fn store(&mut self, state: &PersistedState) -> Result<(), PersistError> {
        let data = serde_json::to_string(state)?;
        fs::write(&self.path, data).map_err(|err| self.io_error(err))
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<PersistedState>>>,
}

impl MemoryStore {
    pub fn current(&self) -> Option<PersistedState> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<PersistedState, PersistError> {
        Ok(self.current().unwrap_or_default())
    }

    fn store(&mut self, state: &PersistedState) -> Result<(), PersistError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(state.clone());
        }
        Ok(())
    }
}
