mod board;
mod canvas;
mod commands;
mod content;
mod export;
mod input;
mod logging;
mod parser;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use parser::config::{self, Config};

#[derive(Parser)]
#[command(
    name = "boxes-live",
    about = "An interactive terminal canvas of boxes and connections"
)]
struct Cli {
    /// Configuration file (default: ~/.config/boxes-live/config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append log events to this file (default: $BOXES_LIVE_LOG)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive board
    View {
        /// Canvas file to open and save to
        file: Option<PathBuf>,
        /// Start with a built-in sample board
        #[arg(long)]
        demo: bool,
        /// Do not look for a joystick device
        #[arg(long)]
        no_gamepad: bool,
    },
    /// Render a saved canvas file as plain text
    Export {
        /// Canvas file to read
        file: Option<PathBuf>,
        /// Where to write the text (default: export_path from the config)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the configuration in effect
    Config {
        /// Print built-in defaults instead
        #[arg(long)]
        defaults: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = logging::resolve_log_path(cli.log_file.as_deref()) {
        logging::init(&path)?;
    }
    let config = load_config(&cli);

    match cli.command.unwrap_or(Command::View {
        file: None,
        demo: false,
        no_gamepad: false,
    }) {
        Command::View {
            file,
            demo,
            no_gamepad,
        } => commands::view::run(config, file, demo, !no_gamepad),
        Command::Export { file, output } => commands::export::run(&config, file, output),
        Command::Config { defaults } => commands::config::run(&config, defaults),
    }
}

/// A broken config file is reported and replaced by defaults.
fn load_config(cli: &Cli) -> Config {
    let Some(path) = config::resolve_path(cli.config.as_deref()) else {
        return Config::default();
    };
    match config::load(&path) {
        Ok(cfg) => {
            info!(path = %path.display(), "configuration loaded");
            cfg
        }
        Err(err) => {
            warn!(error = %format!("{:#}", err), "using default configuration");
            eprintln!("warning: {:#}; using defaults", err);
            Config::default()
        }
    }
}
