//! `dungeon.toml` - optional settings file.
//!
//! ```toml
//! [oracle]
//! url = "http://localhost:11434/api/chat"
//! model = "llama3.1:8b"
//! timeout_secs = 60
//! temperature = 0.7
//!
//! [paths]
//! rules = "rules.json"
//! prompt = "prompts/gm.txt"
//! save = "save.json"
//! transcript = "samples/transcript.txt"
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use anyhow::{Context, Result};
use narrative_core::{
    OllamaConfig, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_SAVE_PATH, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT, DEFAULT_TRANSCRIPT_PATH,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "dungeon.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DungeonConfig {
    pub oracle: OracleSection,
    pub paths: PathsSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleSection {
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for OracleSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub rules: PathBuf,
    pub prompt: PathBuf,
    pub save: PathBuf,
    pub transcript: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            rules: PathBuf::from("rules.json"),
            prompt: PathBuf::from("prompts/gm.txt"),
            save: PathBuf::from(DEFAULT_SAVE_PATH),
            transcript: PathBuf::from(DEFAULT_TRANSCRIPT_PATH),
        }
    }
}

impl DungeonConfig {
    /// Ollama settings with the given system prompt.
    pub fn ollama_config(&self, system_prompt: String) -> OllamaConfig {
        OllamaConfig {
            url: self.oracle.url.clone(),
            model: self.oracle.model.clone(),
            timeout: Duration::from_secs(self.oracle.timeout_secs),
            temperature: self.oracle.temperature,
            system_prompt,
        }
    }
}

/// Read `path`, or fall back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<DungeonConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(DungeonConfig::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

/// The game master instructions at `path`, or the built-in ones if the file
/// cannot be read.
pub fn load_system_prompt(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(prompt) if !prompt.trim().is_empty() => prompt,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "prompt file is empty, using built-in prompt");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "prompt file unreadable, using built-in prompt");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}
