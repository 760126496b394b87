use anyhow::{Context, Result};
use chatline::api::StreamParser;
use chatline::config::Config;
use chatline::logging;
use chatline::state::{extract_content, filter_to_current_turn, project_display_items};
use chatline::types::Event;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chatline-replay",
    about = "Replay an executor stream-json transcript"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the display items of the whole transcript
    Project {
        /// Transcript file, stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the content that would be saved for the current turn
    Extract {
        /// Transcript file, stdin when omitted
        file: Option<PathBuf>,

        /// Assistant turns already stored for the chat
        #[arg(long, default_value_t = 0)]
        persisted: usize,
    },

    /// Print the raw events of the current turn
    Turn {
        /// Transcript file, stdin when omitted
        file: Option<PathBuf>,

        /// Assistant turns already stored for the chat
        #[arg(long, default_value_t = 0)]
        persisted: usize,
    },
}

fn read_events(file: Option<&PathBuf>) -> Result<Vec<Event>> {
    let mut raw = Vec::new();
    match file {
        Some(path) => {
            raw = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut raw)
                .context("failed to read stdin")?;
        }
    }

    let mut parser = StreamParser::new();
    let mut events = parser.process(&raw);
    events.extend(parser.finish());
    tracing::debug!(count = events.len(), "decoded transcript");
    Ok(events)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Project { file } => {
            let events = read_events(file.as_ref())?;
            print_json(&project_display_items(&events))
        }
        Commands::Extract { file, persisted } => {
            let events = read_events(file.as_ref())?;
            print_json(&extract_content(&events, persisted))
        }
        Commands::Turn { file, persisted } => {
            let events = read_events(file.as_ref())?;
            print_json(&filter_to_current_turn(&events, persisted))
        }
    }
}

fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    logging::init(&config)?;

    run(Cli::parse())
}
