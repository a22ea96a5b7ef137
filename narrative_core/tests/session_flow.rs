//! End-to-end turns through `GameSession` with a scripted oracle.

use game_rules::{ChangeAtom, GameState, Outcome, RejectionReason, RuleCatalog, HP_ZERO_FLAG};
use narrative_core::{
    GameSession, OracleError, OracleReply, SaveFile, ScriptedOracle, SessionError,
};

const RULES: &str = r#"{
    "START": {"location": "gate", "inventory": [], "hp": 5, "flags": {}},
    "INVENTORY_LIMIT": 2,
    "LOCKS": {"vault": "has_key"},
    "END_CONDITIONS": {"MAX_TURNS": 6, "LOSE_ANY_FLAGS": ["hp_zero"], "WIN_ALL_FLAGS": ["crown_found"]},
    "COMMANDS": ["look", "go <place>", "take <item>", "open <thing>"],
    "QUEST": {"name": "The Lost Crown", "intro": "The crown lies in the vault."}
}"#;

fn catalog() -> RuleCatalog {
    RuleCatalog::from_json_str(RULES).unwrap()
}

fn script(lines: &[&str]) -> ScriptedOracle {
    ScriptedOracle::from_script(&lines.join("\n"))
}

#[test]
fn three_items_into_two_slots() {
    let mut session = GameSession::new(catalog());
    let mut oracle = script(&[
        r#"{"narration": "Treasure everywhere.", "state_change": [{"type": "add_item", "item": "A"}, {"type": "add_item", "item": "B"}, {"type": "add_item", "item": "C"}]}"#,
    ]);

    let report = session.play_turn("take all", &mut oracle).unwrap();

    assert_eq!(
        report.applied,
        vec![ChangeAtom::add_item("A"), ChangeAtom::add_item("B")]
    );
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].reason, RejectionReason::InventoryFull);
    assert_eq!(session.state().inventory, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn fenced_reply_with_noise_still_plays() {
    let mut session = GameSession::new(catalog());
    let reply = "```json\n{\"narration\": \"You hum.\", \"state_change\": [{\"type\": \"sing\"}, {\"type\": \"hp_delta\", \"delta\": -2}]}\n```";
    let mut oracle = ScriptedOracle::new().with_reply(narrative_core::parse_reply(reply).unwrap());

    let report = session.play_turn("look", &mut oracle).unwrap();

    assert_eq!(report.narration, "You hum.");
    assert_eq!(report.applied, vec![ChangeAtom::hp_delta(-2)]);
    assert_eq!(report.rejections[0].reason, RejectionReason::UnknownAtomType);
    assert_eq!(session.state().hp, 3);
}

#[test]
fn malformed_reply_aborts_the_turn() {
    let mut session = GameSession::new(catalog());
    let before: GameState = session.state().clone();
    let mut oracle = script(&["the dragon says hello"]);

    let result = session.play_turn("look", &mut oracle);

    assert!(matches!(
        result,
        Err(SessionError::Oracle(OracleError::Malformed(_)))
    ));
    assert_eq!(session.state(), &before);
    assert!(session.history().is_empty());
    assert!(session.transcript().is_empty());
}

#[test]
fn key_opens_the_vault_on_the_next_turn() {
    let mut session = GameSession::new(catalog());
    let mut oracle = ScriptedOracle::new()
        .with_reply(OracleReply::with_atoms(
            "You find a key and try the vault door.",
            vec![
                ChangeAtom::set_flag("has_key", true).into(),
                ChangeAtom::move_to("vault").into(),
            ],
        ))
        .with_reply(OracleReply::with_atoms(
            "The vault door swings open.",
            vec![ChangeAtom::move_to("vault").into()],
        ))
        .with_reply(OracleReply::with_atoms(
            "The crown is yours.",
            vec![ChangeAtom::set_flag("crown_found", true).into()],
        ));

    let first = session.play_turn("open door", &mut oracle).unwrap();
    assert_eq!(first.rejections[0].reason, RejectionReason::LocationLocked);
    assert_eq!(session.state().location, "gate");

    session.play_turn("go vault", &mut oracle).unwrap();
    assert_eq!(session.state().location, "vault");

    let last = session.play_turn("take crown", &mut oracle).unwrap();
    assert_eq!(last.outcome, Outcome::Win);
    assert!(matches!(
        session.play_turn("look", &mut oracle),
        Err(SessionError::GameOver(Outcome::Win))
    ));
}

#[test]
fn damage_then_recovery_keeps_hp_zero() {
    let mut session = GameSession::new(catalog());
    let mut oracle = ScriptedOracle::new().with_reply(OracleReply::with_atoms(
        "A blade, then a potion.",
        vec![ChangeAtom::hp_delta(-50).into(), ChangeAtom::hp_delta(10).into()],
    ));

    let report = session.play_turn("look", &mut oracle).unwrap();

    assert_eq!(session.state().hp, 10);
    assert!(session.state().flag(HP_ZERO_FLAG));
    assert_eq!(report.outcome, Outcome::Lose);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");

    let mut session = GameSession::new(catalog());
    let mut oracle = ScriptedOracle::new().with_fallback(OracleReply::with_atoms(
        "You take a coin.",
        vec![ChangeAtom::add_item("coin").into()],
    ));
    session.play_turn("take coin", &mut oracle).unwrap();
    session.play_turn("look", &mut oracle).unwrap();
    session.save_file().save(&path).unwrap();

    let loaded = SaveFile::load(&path, &catalog()).unwrap();
    let resumed = GameSession::from_save(catalog(), loaded).unwrap();

    assert_eq!(resumed.state(), session.state());
    assert_eq!(resumed.history(), session.history());
    assert_eq!(resumed.state().turns, 2);
}

#[test]
fn transcript_written_after_play() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples").join("transcript.txt");

    let mut session = GameSession::new(catalog());
    let mut oracle = ScriptedOracle::new().with_fallback(OracleReply::narration("Wind."));
    session.play_turn("look", &mut oracle).unwrap();
    session.transcript().write(&path, "scripted").unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("=== AI DUNGEON TRANSCRIPT ===\n"));
    assert!(text.contains("[Turn 1]\nPlayer: look\nGM: Wind.\nState: []\n"));
}
