//! Game mechanics: the deterministic pipeline every oracle proposal passes through.
//!
//! Per turn: [`validate`] filters proposed atoms against the pre-turn state,
//! [`apply`] mutates the state with the legal subset in order, and
//! [`evaluate`] decides whether the adventure continues.

mod applicator;
mod end_conditions;
mod validator;

pub use applicator::*;
pub use end_conditions::*;
pub use validator::*;
