//! Context Assembler - builds the oracle prompt from a read-only view of the game.
//!
//! The assembled context carries:
//! 1. **State**: location, inventory, hp, active flags, turn number
//! 2. **Rules**: the full rule catalog, serialized in its on-disk form
//! 3. **History**: the last few turns, with narration clipped
//!
//! The oracle never sees the live state; it gets this snapshot.

use game_rules::{GameState, RuleCatalog, TurnHistory};
use serde::{Deserialize, Serialize};

/// Instruction sent as the system message when no prompt file overrides it.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are the Game Master of a text adventure.
Narrate the outcome of the player's command in two to four vivid sentences.
You do not decide the rules: propose state changes and the engine will accept only the legal ones.

Reply with a single JSON object and nothing else:
{
  "narration": "what the player sees",
  "state_change": [
    {"type": "add_item", "item": "name"},
    {"type": "remove_item", "item": "name"},
    {"type": "move_to", "location": "name"},
    {"type": "set_flag", "flag": "name", "value": true},
    {"type": "hp_delta", "delta": -2}
  ]
}

Only use the five change types above. Respect INVENTORY_LIMIT and LOCKS from the rules.
Use an empty state_change list when nothing changes."#;

/// Configuration for context assembly.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Narration longer than this many characters is clipped in the history section.
    pub narration_preview_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            narration_preview_chars: 200,
        }
    }
}

/// Builds [`OracleContext`] values.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: ContextConfig,
}

impl ContextAssembler {
    /// Create a new context assembler with the given configuration.
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Create a context assembler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ContextConfig::default())
    }

    /// Assemble the oracle context for the current turn.
    pub fn assemble(
        &self,
        state: &GameState,
        catalog: &RuleCatalog,
        history: &TurnHistory,
    ) -> serde_json::Result<OracleContext> {
        Ok(OracleContext {
            location: state.location.clone(),
            inventory: state.inventory.clone(),
            hp: state.hp,
            active_flags: state.active_flags().map(str::to_owned).collect(),
            turn: state.turns,
            rules: serde_json::to_string_pretty(catalog)?,
            recent_turns: history
                .recent_for_context()
                .iter()
                .map(|record| RecentTurn {
                    input: record.input.clone(),
                    narration: self.clip(&record.narration),
                })
                .collect(),
        })
    }

    fn clip(&self, narration: &str) -> String {
        narration
            .chars()
            .take(self.config.narration_preview_chars)
            .collect()
    }
}

/// Everything the oracle is told about the game for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleContext {
    pub location: String,
    pub inventory: Vec<String>,
    pub hp: u32,
    pub active_flags: Vec<String>,
    pub turn: u32,
    /// Pretty-printed rule catalog.
    pub rules: String,
    /// Oldest first.
    pub recent_turns: Vec<RecentTurn>,
}

/// A past turn as shown to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentTurn {
    pub input: String,
    /// Possibly clipped narration.
    pub narration: String,
}

impl OracleContext {
    /// Format the context as a prompt string.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("CURRENT STATE:\n");
        prompt.push_str(&format!("Location: {}\n", self.location));
        prompt.push_str(&format!("Inventory: {}\n", join_or(&self.inventory, "empty")));
        prompt.push_str(&format!("HP: {}\n", self.hp));
        prompt.push_str(&format!("Flags: {}\n", join_or(&self.active_flags, "none")));
        prompt.push_str(&format!("Turn: {}\n", self.turn));
        prompt.push('\n');

        prompt.push_str("RULES:\n");
        prompt.push_str(&self.rules);
        prompt.push_str("\n\n");

        prompt.push_str("RECENT HISTORY (last 3 turns):\n");
        for turn in &self.recent_turns {
            prompt.push_str(&format!("Player: {}\n", turn.input));
            prompt.push_str(&format!("GM: {}...\n\n", turn.narration));
        }

        prompt
    }

    /// The complete user message for `command`.
    pub fn user_message(&self, command: &str) -> String {
        format!(
            "{}\nPlayer command: {}\n\nRespond with JSON only.",
            self.to_prompt_string(),
            command
        )
    }
}

fn join_or(values: &[String], empty: &str) -> String {
    if values.is_empty() {
        empty.to_string()
    } else {
        values.join(", ")
    }
}
