//! End-condition evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::world_state::GameState;

/// How and when an adventure ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndConditions {
    /// The game is lost once this many turns have been played.
    pub max_turns: u32,
    /// Any of these flags being true loses the game.
    pub lose_any_flags: BTreeSet<String>,
    /// All of these flags being true wins the game. Empty means no flag win.
    pub win_all_flags: BTreeSet<String>,
}

/// Result of an end-condition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Lose,
    Continue,
}

impl Outcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Win => "WIN",
            Outcome::Lose => "LOSE",
            Outcome::Continue => "CONTINUE",
        };
        f.write_str(label)
    }
}

/// Evaluate the end conditions against `state`.
///
/// Order matters: running out of turns loses even when the win flags are
/// all set, and a lose flag beats a simultaneous win.
pub fn evaluate(state: &GameState, end: &EndConditions) -> Outcome {
    if state.turns >= end.max_turns {
        return Outcome::Lose;
    }

    if end.lose_any_flags.iter().any(|flag| state.flag(flag)) {
        return Outcome::Lose;
    }

    if !end.win_all_flags.is_empty() && end.win_all_flags.iter().all(|flag| state.flag(flag)) {
        return Outcome::Win;
    }

    Outcome::Continue
}
