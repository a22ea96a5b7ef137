//! Turn history - the append-only record of completed turns.

use serde::{Deserialize, Serialize};

use crate::atoms::ChangeAtom;

/// How many recent turns the oracle sees as context.
pub const CONTEXT_WINDOW: usize = 3;

/// How many recent turns a save file keeps.
pub const PERSISTENCE_WINDOW: usize = 10;

/// One completed turn. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub input: String,
    pub narration: String,
    /// The atoms that actually reached the state this turn.
    #[serde(rename = "state_change", default)]
    pub applied_atoms: Vec<ChangeAtom>,
}

/// Chronological log of turn records.
///
/// Nothing is ever dropped from the log; the recent views bound what
/// callers read, not what is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnHistory {
    records: Vec<TurnRecord>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from previously persisted records, oldest first.
    pub fn from_records(records: Vec<TurnRecord>) -> Self {
        Self { records }
    }

    pub fn record(&mut self, record: TurnRecord) {
        self.records.push(record);
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[TurnRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// The window sent to the oracle.
    pub fn recent_for_context(&self) -> &[TurnRecord] {
        self.recent(CONTEXT_WINDOW)
    }

    /// The window written to save files.
    pub fn recent_for_persistence(&self) -> &[TurnRecord] {
        self.recent(PERSISTENCE_WINDOW)
    }

    pub fn all(&self) -> &[TurnRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TurnRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
