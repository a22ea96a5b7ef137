//! Plain-text record of a play session.

use chrono::{DateTime, Utc};
use game_rules::TurnRecord;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_TRANSCRIPT_PATH: &str = "samples/transcript.txt";

const HEADER: &str = "=== AI DUNGEON TRANSCRIPT ===";

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("failed to write transcript {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state changes: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry per completed turn, in play order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the entry for a completed turn.
    pub fn record(&mut self, record: &TurnRecord) -> Result<(), TranscriptError> {
        let changes = serde_json::to_string(&record.applied_atoms)?;
        self.entries.push(format!(
            "[Turn {}]\nPlayer: {}\nGM: {}\nState: {}",
            record.turn, record.input, record.narration, changes
        ));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self, model: &str, generated_at: DateTime<Utc>) -> String {
        let mut out = format!(
            "{HEADER}\nGenerated: {}\nModel: {model}\n\n",
            generated_at.to_rfc3339()
        );
        for entry in &self.entries {
            out.push_str(entry);
            out.push_str("\n\n");
        }
        out
    }

    /// Render with the current time and write to `path`, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>, model: &str) -> Result<(), TranscriptError> {
        let path = path.as_ref();
        let io_err = |source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, self.render(model, Utc::now())).map_err(io_err)?;

        tracing::info!(path = %path.display(), turns = self.entries.len(), "transcript written");
        Ok(())
    }
}
