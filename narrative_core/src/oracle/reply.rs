//! Decoding oracle replies.

use game_rules::ProposedAtom;
use serde::{Deserialize, Serialize};

use super::OracleError;

/// What the oracle proposes for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReply {
    #[serde(default = "default_narration")]
    pub narration: String,

    /// Proposed atoms in order. Anomalous entries are kept for the validator to reject.
    #[serde(rename = "state_change", default)]
    pub atoms: Vec<ProposedAtom>,
}

fn default_narration() -> String {
    "...".to_string()
}

impl OracleReply {
    /// A reply that changes nothing.
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            narration: text.into(),
            atoms: Vec::new(),
        }
    }

    /// A reply with the given atoms.
    pub fn with_atoms(text: impl Into<String>, atoms: Vec<ProposedAtom>) -> Self {
        Self {
            narration: text.into(),
            atoms,
        }
    }
}

/// Remove a surrounding Markdown code fence, with or without a `json` label.
pub fn strip_code_fence(text: &str) -> &str {
    let mut content = text.trim();
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

/// Parse raw oracle text into a reply.
///
/// A missing `narration` or `state_change` falls back to a default; anything
/// that is not a JSON object of that shape is malformed.
pub fn parse_reply(text: &str) -> Result<OracleReply, OracleError> {
    let content = strip_code_fence(text);
    serde_json::from_str(content).map_err(|err| {
        let preview: String = content.chars().take(200).collect();
        OracleError::Malformed(format!("{err} (reply was: {preview})"))
    })
}
