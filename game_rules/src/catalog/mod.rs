//! Rule catalog - the immutable rulebook loaded once at startup.
//!
//! The on-disk form uses upper-case keys:
//!
//! ```json
//! {
//!   "START": {"location": "gate", "inventory": [], "hp": 10, "flags": {}},
//!   "INVENTORY_LIMIT": 3,
//!   "LOCKS": {"vault": "has_key"},
//!   "END_CONDITIONS": {"MAX_TURNS": 30, "LOSE_ANY_FLAGS": ["hp_zero"], "WIN_ALL_FLAGS": ["treasure_found"]},
//!   "COMMANDS": ["look", "go <direction>", "take <item>"],
//!   "QUEST": {"name": "The Lost Crown", "intro": "..."}
//! }
//! ```
//!
//! Loading turns that loosely typed document into a [`RuleCatalog`] once;
//! nothing downstream touches the raw keys again.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mechanics::{self, EndConditions, Outcome};
use crate::world_state::{GameState, StateViolation, HP_ZERO_FLAG};

/// Errors raised while loading a rule catalog. All of them are fatal.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read rule catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule catalog is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("rule catalog is missing required field {0}")]
    MissingField(&'static str),

    #[error("starting state is invalid: {0}")]
    InvalidStart(#[from] StateViolation),
}

/// Quest metadata shown to the player at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub name: String,
    pub intro: String,
}

/// The validated, read-only rulebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "CatalogFile")]
pub struct RuleCatalog {
    start: GameState,
    inventory_limit: usize,
    locks: BTreeMap<String, String>,
    end_conditions: EndConditions,
    command_patterns: Vec<String>,
    quest: Quest,
}

impl RuleCatalog {
    /// Build a catalog with no locks.
    pub fn new(
        start: GameState,
        inventory_limit: usize,
        end_conditions: EndConditions,
        command_patterns: Vec<String>,
        quest: Quest,
    ) -> Result<Self, SchemaError> {
        start.check_invariants(inventory_limit)?;
        Ok(Self {
            start,
            inventory_limit,
            locks: BTreeMap::new(),
            end_conditions,
            command_patterns,
            quest,
        })
    }

    /// Add a lock requiring `flag` before `location` can be entered.
    pub fn with_lock(mut self, location: impl Into<String>, flag: impl Into<String>) -> Self {
        self.locks.insert(location.into(), flag.into());
        self
    }

    /// Load a catalog from disk. Files ending in `.toml` are read as TOML,
    /// everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let catalog = if is_toml {
            Self::from_toml_str(&contents)?
        } else {
            Self::from_json_str(&contents)?
        };

        tracing::debug!(
            path = %path.display(),
            quest = %catalog.quest.name,
            "loaded rule catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, SchemaError> {
        let file: CatalogFile = serde_json::from_str(contents)?;
        file.try_into()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SchemaError> {
        let file: CatalogFile = toml::from_str(contents)?;
        file.try_into()
    }

    pub fn inventory_limit(&self) -> usize {
        self.inventory_limit
    }

    pub fn locks(&self) -> &BTreeMap<String, String> {
        &self.locks
    }

    pub fn end_conditions(&self) -> &EndConditions {
        &self.end_conditions
    }

    pub fn command_patterns(&self) -> &[String] {
        &self.command_patterns
    }

    pub fn quest(&self) -> &Quest {
        &self.quest
    }

    /// The flag that must be true before `location` can be entered, if any.
    pub fn lock_requirement(&self, location: &str) -> Option<&str> {
        self.locks.get(location).map(String::as_str)
    }

    /// Whether the first word of `text` matches the first word of any
    /// command pattern, ignoring case.
    pub fn is_command_recognized(&self, text: &str) -> bool {
        let Some(verb) = text.split_whitespace().next() else {
            return false;
        };
        let verb = verb.to_lowercase();

        self.command_patterns
            .iter()
            .filter_map(|pattern| pattern.split_whitespace().next())
            .any(|head| head.to_lowercase() == verb)
    }

    /// Evaluate the end conditions against `state`.
    pub fn evaluate(&self, state: &GameState) -> Outcome {
        mechanics::evaluate(state, &self.end_conditions)
    }

    /// A fresh copy of the starting state with the turn counter at zero.
    pub fn initial_state(&self) -> GameState {
        let mut state = self.start.clone();
        state.turns = 0;
        if state.hp == 0 {
            state.flags.insert(HP_ZERO_FLAG.to_string(), true);
        }
        state
    }
}

/// Raw document shape. Every field is optional here so that missing keys
/// surface as [`SchemaError::MissingField`] rather than a decoder message.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct CatalogFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<StartFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inventory_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locks: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_conditions: Option<EndConditionsFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quest: Option<QuestFile>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StartFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default)]
    inventory: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hp: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_hp: Option<u32>,
    #[serde(default)]
    flags: BTreeMap<String, bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct EndConditionsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_turns: Option<u32>,
    #[serde(default)]
    lose_any_flags: Vec<String>,
    #[serde(default)]
    win_all_flags: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QuestFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intro: Option<String>,
}

impl TryFrom<CatalogFile> for RuleCatalog {
    type Error = SchemaError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        let start = file.start.ok_or(SchemaError::MissingField("START"))?;
        let inventory_limit = file
            .inventory_limit
            .ok_or(SchemaError::MissingField("INVENTORY_LIMIT"))?;
        let end = file
            .end_conditions
            .ok_or(SchemaError::MissingField("END_CONDITIONS"))?;
        let command_patterns = file.commands.ok_or(SchemaError::MissingField("COMMANDS"))?;
        let quest = file.quest.ok_or(SchemaError::MissingField("QUEST"))?;

        let start = GameState {
            location: start
                .location
                .ok_or(SchemaError::MissingField("START.location"))?,
            inventory: start.inventory,
            hp: start.hp.ok_or(SchemaError::MissingField("START.hp"))?,
            max_hp: start.max_hp,
            flags: start.flags,
            turns: 0,
        };

        let end_conditions = EndConditions {
            max_turns: end
                .max_turns
                .ok_or(SchemaError::MissingField("END_CONDITIONS.MAX_TURNS"))?,
            lose_any_flags: end.lose_any_flags.into_iter().collect(),
            win_all_flags: end.win_all_flags.into_iter().collect(),
        };

        let quest = Quest {
            name: quest.name.ok_or(SchemaError::MissingField("QUEST.name"))?,
            intro: quest.intro.ok_or(SchemaError::MissingField("QUEST.intro"))?,
        };

        let catalog = RuleCatalog::new(
            start,
            inventory_limit,
            end_conditions,
            command_patterns,
            quest,
        )?;

        Ok(RuleCatalog {
            locks: file.locks.unwrap_or_default(),
            ..catalog
        })
    }
}

impl From<RuleCatalog> for CatalogFile {
    fn from(catalog: RuleCatalog) -> Self {
        let into_vec = |set: BTreeSet<String>| set.into_iter().collect::<Vec<_>>();

        CatalogFile {
            start: Some(StartFile {
                location: Some(catalog.start.location),
                inventory: catalog.start.inventory,
                hp: Some(catalog.start.hp),
                max_hp: catalog.start.max_hp,
                flags: catalog.start.flags,
            }),
            inventory_limit: Some(catalog.inventory_limit),
            locks: Some(catalog.locks),
            end_conditions: Some(EndConditionsFile {
                max_turns: Some(catalog.end_conditions.max_turns),
                lose_any_flags: into_vec(catalog.end_conditions.lose_any_flags),
                win_all_flags: into_vec(catalog.end_conditions.win_all_flags),
            }),
            commands: Some(catalog.command_patterns),
            quest: Some(QuestFile {
                name: Some(catalog.quest.name),
                intro: Some(catalog.quest.intro),
            }),
        }
    }
}
