//! AI Dungeon - a text adventure where a language model narrates and a
//! fixed rulebook decides what actually happens.

mod config;
mod logging;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use game_rules::RuleCatalog;
use narrative_core::{GameSession, OllamaOracle, Oracle, OracleReply, ScriptedOracle};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::config::{load_config, load_system_prompt, DungeonConfig, DEFAULT_CONFIG_PATH};
use crate::repl::GamePaths;

const OFFLINE_NARRATION: &str = "The dungeon is silent. Nothing seems to change.";

#[derive(Parser, Debug)]
#[command(
    name = "dungeon",
    version,
    about = "Rules-based text adventure narrated by a local language model"
)]
struct Cli {
    /// Ollama model to narrate with.
    model: Option<String>,

    /// Rule catalog (JSON, or TOML by extension).
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Game master instructions sent as the system prompt.
    #[arg(long)]
    prompt: Option<PathBuf>,

    /// Settings file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Save file used by `save` and `load`.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Where the transcript is written on exit.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Play without a model server.
    #[arg(long)]
    offline: bool,

    /// Replay oracle replies from a file, one JSON reply per line. Implies `--offline`.
    #[arg(long)]
    script: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut DungeonConfig) {
        if let Some(model) = &self.model {
            config.oracle.model = model.clone();
        }
        if let Some(rules) = &self.rules {
            config.paths.rules = rules.clone();
        }
        if let Some(prompt) = &self.prompt {
            config.paths.prompt = prompt.clone();
        }
        if let Some(save) = &self.save {
            config.paths.save = save.clone();
        }
        if let Some(transcript) = &self.transcript {
            config.paths.transcript = transcript.clone();
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Fatal error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    cli.apply_overrides(&mut config);

    let catalog = RuleCatalog::load(&config.paths.rules)
        .with_context(|| format!("load rules from {}", config.paths.rules.display()))?;
    let mut session = GameSession::new(catalog);
    let mut oracle = build_oracle(&cli, &config)?;

    if cli.model.is_some() {
        println!("Using model: {}", oracle.model());
    }
    tracing::info!(session = %session.id(), model = oracle.model(), "starting game");

    let paths = GamePaths {
        save: config.paths.save.clone(),
        transcript: config.paths.transcript.clone(),
    };
    let stdin = io::stdin();
    let stdout = io::stdout();
    repl::run(
        &mut session,
        oracle.as_mut(),
        &paths,
        stdin.lock(),
        &mut stdout.lock(),
    )
}

fn build_oracle(cli: &Cli, config: &DungeonConfig) -> Result<Box<dyn Oracle>> {
    if let Some(path) = &cli.script {
        let script = fs::read_to_string(path)
            .with_context(|| format!("read oracle script {}", path.display()))?;
        let oracle = ScriptedOracle::from_script(&script)
            .with_fallback(OracleReply::narration(OFFLINE_NARRATION));
        return Ok(Box::new(oracle));
    }

    if cli.offline {
        let oracle = ScriptedOracle::new()
            .with_model("offline")
            .with_fallback(OracleReply::narration(OFFLINE_NARRATION));
        return Ok(Box::new(oracle));
    }

    let prompt = load_system_prompt(&config.paths.prompt);
    let oracle = OllamaOracle::new(config.ollama_config(prompt))?;
    Ok(Box::new(oracle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "dungeon",
            "mistral",
            "--rules",
            "quests/crown.toml",
            "--save",
            "slot.json",
        ]);
        let mut config = DungeonConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.oracle.model, "mistral");
        assert_eq!(config.paths.rules, PathBuf::from("quests/crown.toml"));
        assert_eq!(config.paths.save, PathBuf::from("slot.json"));
        assert_eq!(config.paths.prompt, PathBuf::from("prompts/gm.txt"));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_offline_oracle_needs_no_server() {
        let cli = Cli::parse_from(["dungeon", "--offline"]);
        let oracle = build_oracle(&cli, &DungeonConfig::default()).unwrap();
        assert_eq!(oracle.model(), "offline");
    }
}
