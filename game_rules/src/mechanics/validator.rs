//! Change validation - decides which proposed atoms are legal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::atoms::{ChangeAtom, ProposedAtom};
use crate::catalog::RuleCatalog;
use crate::world_state::GameState;

/// Why a proposed atom was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    InventoryFull,
    LocationLocked,
    UnknownAtomType,
    MalformedAtom,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectionReason::InventoryFull => "InventoryFull",
            RejectionReason::LocationLocked => "LocationLocked",
            RejectionReason::UnknownAtomType => "UnknownAtomType",
            RejectionReason::MalformedAtom => "MalformedAtom",
        };
        f.write_str(label)
    }
}

/// A refused atom with a player-facing explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub atom: ProposedAtom,
    pub reason: RejectionReason,
    pub detail: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

/// The outcome of validating one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Accepted atoms in proposal order.
    pub legal: Vec<ChangeAtom>,
    /// Refused atoms in proposal order.
    pub rejections: Vec<Rejection>,
}

/// Filter `atoms` down to the legal subset.
///
/// Atoms are judged one at a time in proposal order. Capacity is checked
/// against a projected inventory: the pre-turn inventory updated by every
/// item add or remove already accepted in this batch, so the applied result
/// can never exceed the limit. Locks are checked against the pre-turn flags
/// only; a `set_flag` earlier in the same batch does not open a door.
pub fn validate(atoms: &[ProposedAtom], state: &GameState, catalog: &RuleCatalog) -> Validation {
    let limit = catalog.inventory_limit();
    let mut projected: Vec<&str> = state.inventory.iter().map(String::as_str).collect();
    let mut validation = Validation::default();

    for proposed in atoms {
        let atom = match proposed {
            ProposedAtom::Known(atom) => atom,
            ProposedAtom::Unknown { tag, .. } => {
                let detail = match tag {
                    Some(tag) => format!("unknown atom type '{tag}'"),
                    None => "atom has no type tag".to_string(),
                };
                reject(&mut validation, proposed, RejectionReason::UnknownAtomType, detail);
                continue;
            }
            ProposedAtom::Malformed { tag, reason, .. } => {
                let detail = format!("malformed '{tag}' atom: {reason}");
                reject(&mut validation, proposed, RejectionReason::MalformedAtom, detail);
                continue;
            }
        };

        match atom {
            ChangeAtom::AddItem { item } => {
                if projected.len() >= limit {
                    let detail = format!("inventory full ({limit} items max), cannot take '{item}'");
                    reject(&mut validation, proposed, RejectionReason::InventoryFull, detail);
                    continue;
                }
                if !projected.contains(&item.as_str()) {
                    projected.push(item);
                }
            }
            ChangeAtom::RemoveItem { item } => {
                projected.retain(|held| *held != item.as_str());
            }
            ChangeAtom::MoveTo { location } => {
                if let Some(required) = catalog.lock_requirement(location) {
                    if !state.flag(required) {
                        let detail = format!("{location} requires flag '{required}'");
                        reject(&mut validation, proposed, RejectionReason::LocationLocked, detail);
                        continue;
                    }
                }
            }
            ChangeAtom::SetFlag { .. } | ChangeAtom::HpDelta { .. } => {}
        }

        validation.legal.push(atom.clone());
    }

    validation
}

fn reject(
    validation: &mut Validation,
    atom: &ProposedAtom,
    reason: RejectionReason,
    detail: String,
) {
    tracing::warn!(%atom, %reason, %detail, "rule blocked proposed atom");
    validation.rejections.push(Rejection {
        atom: atom.clone(),
        reason,
        detail,
    });
}
