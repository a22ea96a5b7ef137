//! Oracle gateway - where narration and proposed changes come from.
//!
//! The engine only ever talks to an oracle through the [`Oracle`] trait, so
//! the same turn pipeline runs against the live HTTP model or a scripted
//! stand-in.

mod ollama;
mod reply;
mod scripted;

pub use ollama::*;
pub use reply::*;
pub use scripted::*;

use thiserror::Error;

use crate::context_assembler::OracleContext;

/// Errors from an oracle call. Either one aborts the current turn only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle reply malformed: {0}")]
    Malformed(String),
}

/// A source of narration and proposed state changes.
pub trait Oracle {
    /// Identifier of the model behind this oracle, for transcripts.
    fn model(&self) -> &str;

    /// Ask for the outcome of `command` given a snapshot of the game.
    fn propose(&mut self, command: &str, context: &OracleContext) -> Result<OracleReply, OracleError>;
}

impl<T: Oracle + ?Sized> Oracle for Box<T> {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn propose(&mut self, command: &str, context: &OracleContext) -> Result<OracleReply, OracleError> {
        (**self).propose(command, context)
    }
}
