//! Change application - mutates state with already-validated atoms.

use crate::atoms::ChangeAtom;
use crate::world_state::{GameState, HP_ZERO_FLAG};

/// Apply `legal` atoms to `state` strictly in order.
///
/// Performs no rule checks; callers pass only what [`validate`](super::validate)
/// accepted.
pub fn apply(legal: &[ChangeAtom], state: &mut GameState) {
    for atom in legal {
        apply_atom(atom, state);
        tracing::debug!(%atom, hp = state.hp, location = %state.location, "applied atom");
    }
}

/// Apply a single atom.
pub fn apply_atom(atom: &ChangeAtom, state: &mut GameState) {
    match atom {
        ChangeAtom::AddItem { item } => {
            if !state.has_item(item) {
                state.inventory.push(item.clone());
            }
        }
        ChangeAtom::RemoveItem { item } => {
            state.inventory.retain(|held| held != item);
        }
        ChangeAtom::MoveTo { location } => {
            state.location = location.clone();
        }
        ChangeAtom::SetFlag { flag, value } => {
            state.flags.insert(flag.clone(), *value);
        }
        ChangeAtom::HpDelta { delta } => {
            let mut hp = i64::from(state.hp).saturating_add(*delta).max(0);
            if let Some(max_hp) = state.max_hp {
                hp = hp.min(i64::from(max_hp));
            }
            state.hp = u32::try_from(hp).unwrap_or(u32::MAX);

            if state.hp == 0 {
                state.flags.insert(HP_ZERO_FLAG.to_string(), true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new("gate", 5)
    }

    #[test]
    fn test_add_item_is_idempotent() {
        let mut state = state();
        apply(
            &[
                ChangeAtom::add_item("rope"),
                ChangeAtom::add_item("lamp"),
                ChangeAtom::add_item("rope"),
            ],
            &mut state,
        );
        assert_eq!(state.inventory, vec!["rope".to_string(), "lamp".to_string()]);
    }

    #[test]
    fn test_remove_item_missing_is_noop() {
        let mut state = state();
        state.inventory = vec!["rope".to_string()];
        apply(
            &[ChangeAtom::remove_item("lamp"), ChangeAtom::remove_item("rope")],
            &mut state,
        );
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_move_and_flags_are_unconditional() {
        let mut state = state();
        apply(
            &[
                ChangeAtom::move_to("vault"),
                ChangeAtom::set_flag("alarm", true),
                ChangeAtom::set_flag("alarm", false),
            ],
            &mut state,
        );
        assert_eq!(state.location, "vault");
        assert_eq!(state.flags.get("alarm"), Some(&false));
    }

    #[test]
    fn test_each_delta_clamps_independently() {
        let mut state = state();
        apply(&[ChangeAtom::hp_delta(-50), ChangeAtom::hp_delta(10)], &mut state);
        assert_eq!(state.hp, 10);
        assert!(state.flag(HP_ZERO_FLAG));
    }

    #[test]
    fn test_hp_zero_flag_is_sticky() {
        let mut state = state();
        apply(&[ChangeAtom::hp_delta(-5)], &mut state);
        assert_eq!(state.hp, 0);
        assert!(state.flag(HP_ZERO_FLAG));

        apply(&[ChangeAtom::hp_delta(7)], &mut state);
        assert!(state.flag(HP_ZERO_FLAG));
    }

    #[test]
    fn test_hp_zero_cleared_only_by_set_flag() {
        let mut state = state();
        apply(
            &[
                ChangeAtom::hp_delta(-9),
                ChangeAtom::hp_delta(3),
                ChangeAtom::set_flag(HP_ZERO_FLAG, false),
            ],
            &mut state,
        );
        assert_eq!(state.hp, 3);
        assert!(!state.flag(HP_ZERO_FLAG));
    }

    #[test]
    fn test_positive_delta_without_reaching_zero_leaves_flag_unset() {
        let mut state = state();
        apply(&[ChangeAtom::hp_delta(-4), ChangeAtom::hp_delta(2)], &mut state);
        assert_eq!(state.hp, 3);
        assert!(!state.flags.contains_key(HP_ZERO_FLAG));
    }

    #[test]
    fn test_max_hp_ceiling() {
        let mut state = state();
        state.max_hp = Some(8);
        apply(&[ChangeAtom::hp_delta(100)], &mut state);
        assert_eq!(state.hp, 8);
    }

    #[test]
    fn test_extreme_deltas_saturate() {
        let mut state = state();
        apply(&[ChangeAtom::hp_delta(i64::MAX)], &mut state);
        assert_eq!(state.hp, u32::MAX);

        apply(&[ChangeAtom::hp_delta(i64::MIN)], &mut state);
        assert_eq!(state.hp, 0);
    }

    #[test]
    fn test_apply_does_not_touch_turns() {
        let mut state = state();
        apply(&[ChangeAtom::move_to("hall")], &mut state);
        assert_eq!(state.turns, 0);
    }
}
