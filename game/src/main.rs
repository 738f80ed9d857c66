use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ballfall::{CascadeListener, GameSession, Settings, SettingsStore, driver, fixture};
use clap::{Parser, Subcommand};
use match_engine::{Board, StepResult, find_matches_with};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "ballfall")]
#[command(about = "Resolve match cascades on falling-ball boards")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    /// Settings file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a full cascade on a fixture board and print each step.
    Run {
        fixture: PathBuf,
        #[arg(long)]
        delay_ms: Option<u64>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the matches currently on a fixture board.
    Matches {
        fixture: PathBuf,
        #[arg(long)]
        min_run: Option<usize>,
    },
    /// Print an empty fixture sized from the board settings.
    Blank,
    /// Print the effective settings.
    Config {
        /// Write default settings first if the file does not exist.
        #[arg(long, default_value_t = false)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = match &cli.config {
        Some(path) => SettingsStore::at(path),
        None => SettingsStore::from_env(),
    };
    if let Commands::Config { init: true } = cli.command {
        let settings = store
            .init()
            .with_context(|| format!("initializing settings at {}", store.path().display()))?;
        return cmd_config(&store, &settings);
    }
    let settings = load_settings(&store, cli.config.is_some())?;

    match cli.command {
        Commands::Run {
            fixture,
            delay_ms,
            json,
        } => cmd_run(&settings, &fixture, delay_ms, json).await,
        Commands::Matches { fixture, min_run } => cmd_matches(&settings, &fixture, min_run),
        Commands::Blank => cmd_blank(&settings),
        Commands::Config { .. } => cmd_config(&store, &settings),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// A path given on the command line must load cleanly; the default location
/// falls back to defaults.
fn load_settings(store: &SettingsStore, explicit: bool) -> Result<Settings> {
    if explicit {
        store
            .load_strict()
            .with_context(|| format!("loading settings from {}", store.path().display()))
    } else {
        Ok(store.load())
    }
}

fn load_fixture(path: &Path) -> Result<Board> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
    fixture::parse_board(&text).with_context(|| format!("parsing fixture {}", path.display()))
}

struct StepPrinter {
    enabled: bool,
}

impl CascadeListener for StepPrinter {
    fn on_resolved(&mut self, step: &StepResult) {
        if !self.enabled {
            return;
        }
        println!(
            "step {}: {} match(es), {} exploded, {} painted, {} cleared",
            step.step_index,
            step.matches.len(),
            step.exploded.len(),
            step.painted.len(),
            step.cleared.len()
        );
    }

    fn on_settled(&mut self, step_index: usize, balls_moved: bool) {
        if self.enabled && balls_moved {
            println!("step {step_index}: balls fell");
        }
    }
}

async fn cmd_run(
    settings: &Settings,
    fixture_path: &Path,
    delay_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let board = load_fixture(fixture_path)?;
    let mut config = settings.engine;
    if let Some(ms) = delay_ms {
        config = config.with_step_delay(Duration::from_millis(ms));
    }

    info!(
        rows = board.rows(),
        cols = board.cols(),
        occupied = board.occupied_count(),
        "running cascade"
    );
    let session = driver::shared(GameSession::with_board(board, config));
    let mut printer = StepPrinter { enabled: !json };
    let report = driver::drive(&session, &mut printer)
        .await
        .context("cascade did not run to completion")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("cascade finished after {} step(s)", report.cascade_steps);
        print!("{}", fixture::render_board(driver::lock(&session).board()));
    }
    Ok(())
}

fn cmd_matches(settings: &Settings, fixture_path: &Path, min_run: Option<usize>) -> Result<()> {
    let board = load_fixture(fixture_path)?;
    let min_run = min_run.unwrap_or(settings.engine.min_run_length);

    let matches = find_matches_with(&board, min_run);
    if matches.is_empty() {
        println!("no matches");
    }
    for found in &matches {
        let cells = found
            .positions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:?} {} x{}: {cells}", found.direction, found.color, found.positions.len());
    }
    Ok(())
}

fn cmd_blank(settings: &Settings) -> Result<()> {
    let session = GameSession::from_settings(settings);
    print!("{}", fixture::render_board(session.board()));
    Ok(())
}

fn cmd_config(store: &SettingsStore, settings: &Settings) -> Result<()> {
    println!("# {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}
