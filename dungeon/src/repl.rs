//! The interactive game loop.

use anyhow::{Context, Result};
use game_rules::Outcome;
use narrative_core::{GameSession, Oracle, SaveError, SaveFile, SessionError, TurnReport};
use std::io::{BufRead, Write};
use std::path::PathBuf;

const RULE: &str = "============================================================";

/// Where the loop writes saves and the transcript.
#[derive(Debug, Clone)]
pub struct GamePaths {
    pub save: PathBuf,
    pub transcript: PathBuf,
}

/// Commands handled by the front end without consulting the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Special {
    Quit,
    Help,
    Inventory,
    Save,
    Load,
}

impl Special {
    fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().as_str() {
            "quit" => Some(Special::Quit),
            "help" => Some(Special::Help),
            "inventory" => Some(Special::Inventory),
            "save" => Some(Special::Save),
            "load" => Some(Special::Load),
            _ => None,
        }
    }
}

/// Run the game until it ends, the player quits, or input runs out.
/// The transcript is written on the way out if any turn was played.
pub fn run<O, R, W>(
    session: &mut GameSession,
    oracle: &mut O,
    paths: &GamePaths,
    mut input: R,
    out: &mut W,
) -> Result<()>
where
    O: Oracle + ?Sized,
    R: BufRead,
    W: Write,
{
    intro(session, out)?;
    if let Some(narration) = session.opening(oracle) {
        writeln!(out, "{narration}\n")?;
    }

    let mut line = String::new();
    loop {
        match session.status() {
            Outcome::Win => {
                writeln!(out, "\n{RULE}\nVICTORY! You have completed the quest!\n{RULE}")?;
                break;
            }
            Outcome::Lose => {
                writeln!(out, "\n{RULE}\nGAME OVER!\n{RULE}")?;
                break;
            }
            Outcome::Continue => {}
        }

        write!(out, "> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line).context("read player input")? == 0 {
            writeln!(out, "\nQuitting...")?;
            break;
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        match Special::parse(command) {
            Some(Special::Quit) => {
                writeln!(out, "Thanks for playing!")?;
                break;
            }
            Some(Special::Help) => show_help(session, out)?,
            Some(Special::Inventory) => show_inventory(session, out)?,
            Some(Special::Save) => save(session, paths, out)?,
            Some(Special::Load) => load(session, paths, out)?,
            None if !session.catalog().is_command_recognized(command) => {
                writeln!(out, "Unknown command. Type 'help' for valid commands.")?;
            }
            None => match session.play_turn(command, oracle) {
                Ok(report) => show_report(&report, session, out)?,
                Err(SessionError::Oracle(e)) => {
                    writeln!(out, "Failed to get response from Game Master ({e}). Try again.")?;
                }
                Err(SessionError::GameOver(_)) => continue,
                Err(e) => return Err(e).context("play turn"),
            },
        }
    }

    if !session.transcript().is_empty() {
        session
            .transcript()
            .write(&paths.transcript, oracle.model())
            .context("write transcript")?;
        writeln!(out, "Transcript saved to {}", paths.transcript.display())?;
    }
    Ok(())
}

fn intro<W: Write>(session: &GameSession, out: &mut W) -> Result<()> {
    let quest = session.catalog().quest();
    let state = session.state();
    let inventory = if state.inventory.is_empty() {
        "empty".to_string()
    } else {
        state.inventory.join(", ")
    };

    writeln!(out, "\n{RULE}\n   AI DUNGEON - Rules-Based Adventure\n{RULE}")?;
    writeln!(out, "\nQUEST: {}\n   {}\n", quest.name, quest.intro)?;
    writeln!(out, "Location: {}", state.location)?;
    writeln!(out, "HP: {} | Inventory: {inventory}", state.hp)?;
    writeln!(out, "\nType 'help' for commands, 'quit' to exit.\n")?;
    Ok(())
}

fn show_help<W: Write>(session: &GameSession, out: &mut W) -> Result<()> {
    writeln!(out, "\n=== AVAILABLE COMMANDS ===")?;
    for pattern in session.catalog().command_patterns() {
        writeln!(out, "  - {pattern}")?;
    }
    writeln!(out)?;
    Ok(())
}

fn show_inventory<W: Write>(session: &GameSession, out: &mut W) -> Result<()> {
    let inventory = &session.state().inventory;
    if inventory.is_empty() {
        writeln!(out, "Your inventory is empty.")?;
        return Ok(());
    }
    writeln!(
        out,
        "Inventory ({}/{}):",
        inventory.len(),
        session.catalog().inventory_limit()
    )?;
    for item in inventory {
        writeln!(out, "  - {item}")?;
    }
    Ok(())
}

fn save<W: Write>(session: &GameSession, paths: &GamePaths, out: &mut W) -> Result<()> {
    match session.save_file().save(&paths.save) {
        Ok(()) => writeln!(out, "Game saved to {}", paths.save.display())?,
        Err(e) => writeln!(out, "Save failed: {e}")?,
    }
    Ok(())
}

fn load<W: Write>(session: &mut GameSession, paths: &GamePaths, out: &mut W) -> Result<()> {
    let restored = SaveFile::load(&paths.save, session.catalog())
        .and_then(|save| session.restore(save));
    match restored {
        Ok(()) => {
            writeln!(out, "Game loaded from {}", paths.save.display())?;
            let state = session.state();
            writeln!(out, "Location: {} | HP: {}", state.location, state.hp)?;
        }
        Err(SaveError::NotFound(path)) => {
            writeln!(out, "Save file '{}' not found.", path.display())?;
        }
        Err(e) => writeln!(out, "Load failed: {e}")?,
    }
    Ok(())
}

fn show_report<W: Write>(report: &TurnReport, session: &GameSession, out: &mut W) -> Result<()> {
    for rejection in &report.rejections {
        writeln!(out, "  [RULE BLOCKED: {}]", rejection.detail)?;
    }
    writeln!(out, "\n{}", report.narration)?;

    let state = session.state();
    let mut status = format!("HP: {}", state.hp);
    if !state.inventory.is_empty() {
        status.push_str(&format!(" | Items: {}", state.inventory.len()));
    }
    writeln!(out, "   [{status}]\n")?;
    Ok(())
}
