//! # Narrative Core
//!
//! The side of AI Dungeon that talks to the oracle. This crate drives the
//! `game_rules` pipeline one turn at a time and keeps everything the rules
//! engine itself does not care about.
//!
//! ## Core Components
//!
//! - **oracle**: The [`Oracle`] trait, the Ollama HTTP client and a scripted stand-in
//! - **context_assembler**: Builds the read-only snapshot the oracle is shown
//! - **session**: Owns the live state and runs validate -> apply -> evaluate per turn
//! - **persistence**: Save files with the last few turns
//! - **transcript**: Plain-text log of a play session
//!
//! ## Design Philosophy
//!
//! - **Untrusted Oracle**: Narration is free text; state changes are proposals the rules may refuse
//! - **All-or-Nothing Turns**: An oracle failure leaves state, history and transcript untouched
//! - **Swappable Backends**: The session only sees the narrow [`Oracle`] trait

pub mod context_assembler;
pub mod oracle;
pub mod persistence;
pub mod session;
pub mod transcript;

pub use context_assembler::*;
pub use oracle::*;
pub use persistence::*;
pub use session::*;
pub use transcript::*;
