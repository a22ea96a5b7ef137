//! Save files - a snapshot of the state plus the most recent turns.
//!
//! ```json
//! {
//!   "state": {"location": "hall", "inventory": ["rope"], "hp": 8, "flags": {}, "turns": 3},
//!   "history": [{"turn": 3, "input": "look", "narration": "...", "state_change": []}],
//!   "timestamp": "2026-01-01T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use game_rules::{GameState, RuleCatalog, StateViolation, TurnHistory, TurnRecord};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SAVE_PATH: &str = "save.json";

/// Errors from save and load.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file '{0}' not found")]
    NotFound(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("saved state breaks the rules: {0}")]
    InvalidState(#[from] StateViolation),
}

/// A saved game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFile {
    pub state: GameState,

    /// The most recent turns, oldest first.
    #[serde(default)]
    pub history: Vec<TurnRecord>,

    /// Offset-less timestamps are read as UTC.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

impl SaveFile {
    /// Snapshot `state` and the persistence window of `history`, stamped now.
    pub fn new(state: &GameState, history: &TurnHistory) -> Self {
        Self {
            state: state.clone(),
            history: history.recent_for_persistence().to_vec(),
            timestamp: Utc::now(),
        }
    }

    /// Write as pretty JSON. The file is replaced atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let path = path.as_ref();
        let mut payload = serde_json::to_string_pretty(self)?;
        payload.push('\n');
        write_atomic(path, &payload)?;
        tracing::info!(path = %path.display(), turns = self.state.turns, "game saved");
        Ok(())
    }

    /// Read a save file and check the saved state against `catalog`.
    pub fn load(path: impl AsRef<Path>, catalog: &RuleCatalog) -> Result<Self, SaveError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SaveError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let save: SaveFile = serde_json::from_str(&contents)?;
        save.state.check_invariants(catalog.inventory_limit())?;
        tracing::info!(path = %path.display(), turns = save.state.turns, "game loaded");
        Ok(save)
    }

    /// The saved history as a [`TurnHistory`].
    pub fn turn_history(&self) -> TurnHistory {
        TurnHistory::from_records(self.history.clone())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), SaveError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SaveError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).map_err(io_err(&tmp_path))?;
    fs::rename(&tmp_path, path).map_err(io_err(path))?;
    Ok(())
}
