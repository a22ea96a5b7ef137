//! # Game Rules
//!
//! The rulebook crate - holds the game state and the deterministic pipeline
//! that decides which oracle-proposed changes may touch it.
//! This crate is the single source of truth for game state and does not contain any AI logic.

pub mod atoms;
pub mod catalog;
pub mod history;
pub mod mechanics;
pub mod world_state;

pub use atoms::*;
pub use catalog::*;
pub use history::*;
pub use mechanics::*;
pub use world_state::*;
