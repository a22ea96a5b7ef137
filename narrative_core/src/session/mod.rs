//! Game session - owns the live state and runs the turn pipeline.
//!
//! One turn is: snapshot context -> ask the oracle -> validate -> apply ->
//! advance the turn counter -> record -> evaluate end conditions. Everything
//! that can fail happens before the first mutation, so a failed turn leaves
//! the session exactly as it was.

use game_rules::{
    apply, validate, ChangeAtom, GameState, Outcome, Rejection, RuleCatalog, TurnHistory,
    TurnRecord,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::context_assembler::{ContextAssembler, OracleContext};
use crate::oracle::{Oracle, OracleError};
use crate::persistence::{SaveError, SaveFile};
use crate::transcript::{Transcript, TranscriptError};

/// Command sent to the oracle for the opening scene.
pub const OPENING_COMMAND: &str = "look around";

/// Unique identifier for a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("the game is over ({0})")]
    GameOver(Outcome),

    #[error("failed to build oracle context: {0}")]
    Context(#[from] serde_json::Error),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// What happened during one completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: u32,
    pub narration: String,
    pub applied: Vec<ChangeAtom>,
    pub rejections: Vec<Rejection>,
    pub outcome: Outcome,
}

/// A single adventure in progress.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    catalog: RuleCatalog,
    state: GameState,
    history: TurnHistory,
    transcript: Transcript,
    assembler: ContextAssembler,
}

impl GameSession {
    /// Start a fresh game from the catalog's starting state.
    pub fn new(catalog: RuleCatalog) -> Self {
        let state = catalog.initial_state();
        Self {
            id: SessionId::new(),
            catalog,
            state,
            history: TurnHistory::new(),
            transcript: Transcript::new(),
            assembler: ContextAssembler::with_defaults(),
        }
    }

    /// Resume a saved game.
    pub fn from_save(catalog: RuleCatalog, save: SaveFile) -> Result<Self, SaveError> {
        let mut session = Self::new(catalog);
        session.restore(save)?;
        Ok(session)
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// End-condition result for the current state.
    pub fn status(&self) -> Outcome {
        self.catalog.evaluate(&self.state)
    }

    /// Snapshot handed to the oracle for `self.state`.
    pub fn context(&self) -> serde_json::Result<OracleContext> {
        self.assembler
            .assemble(&self.state, &self.catalog, &self.history)
    }

    /// Ask the oracle to describe the starting scene. Nothing is applied or
    /// recorded, and a failing oracle only costs the description.
    pub fn opening<O: Oracle + ?Sized>(&self, oracle: &mut O) -> Option<String> {
        let context = match self.context() {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "could not build opening context");
                return None;
            }
        };

        match oracle.propose(OPENING_COMMAND, &context) {
            Ok(reply) => Some(reply.narration),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "opening narration unavailable");
                None
            }
        }
    }

    /// Play one turn.
    pub fn play_turn<O: Oracle + ?Sized>(
        &mut self,
        command: &str,
        oracle: &mut O,
    ) -> Result<TurnReport, SessionError> {
        let outcome = self.status();
        if outcome.is_over() {
            return Err(SessionError::GameOver(outcome));
        }

        let turn = self.state.turns.saturating_add(1);
        let span = tracing::info_span!("turn", session = %self.id, turn);
        let _guard = span.enter();

        let context = self.context()?;
        let reply = match oracle.propose(command, &context) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(model = oracle.model(), error = %e, "oracle call failed, turn aborted");
                return Err(e.into());
            }
        };

        let validation = validate(&reply.atoms, &self.state, &self.catalog);
        let record = TurnRecord {
            turn,
            input: command.to_string(),
            narration: reply.narration,
            applied_atoms: validation.legal,
        };
        self.transcript.record(&record)?;

        apply(&record.applied_atoms, &mut self.state);
        self.state.turns = turn;

        let report = TurnReport {
            turn,
            narration: record.narration.clone(),
            applied: record.applied_atoms.clone(),
            rejections: validation.rejections,
            outcome: self.status(),
        };
        self.history.record(record);

        tracing::info!(
            applied = report.applied.len(),
            rejected = report.rejections.len(),
            outcome = %report.outcome,
            "turn complete"
        );
        Ok(report)
    }

    /// Snapshot for saving.
    pub fn save_file(&self) -> SaveFile {
        SaveFile::new(&self.state, &self.history)
    }

    /// Replace the live state and history with a saved game.
    pub fn restore(&mut self, save: SaveFile) -> Result<(), SaveError> {
        save.state.check_invariants(self.catalog.inventory_limit())?;
        self.history = save.turn_history();
        self.state = save.state;
        tracing::info!(session = %self.id, turn = self.state.turns, "session restored");
        Ok(())
    }
}
