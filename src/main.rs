use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use kata::commands;
use kata::config::Config;
use kata::logging;

#[derive(Parser)]
#[command(name = "kata")]
#[command(version, about = "Watch-mode exercise trainer with live validation feedback")]
struct Cli {
    /// Project root containing kata.toml and the exercises directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log at debug level (see <state_dir>/kata.log)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive session (default)
    Watch,

    /// Validate one exercise and exit
    Run {
        /// Exercise name (defaults to the current exercise)
        name: Option<String>,
    },

    /// Show a hint
    Hint {
        /// Exercise name (defaults to the current exercise)
        name: Option<String>,

        /// Hint level (1-3)
        #[arg(short, long)]
        level: Option<u8>,
    },

    /// List exercises and progress
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli.root)?;
    config.ensure_state_dir()?;
    logging::init(&config.log_path(), cli.verbose)?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => commands::watch::execute(config).map(|()| true),
        Commands::Run { name } => commands::run::execute(config, name.as_deref()),
        Commands::Hint { name, level } => {
            commands::hint::execute(config, name.as_deref(), level).map(|()| true)
        }
        Commands::List => commands::list::execute(config).map(|()| true),
    }
}

fn load_config(root: &Path) -> Result<Config> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Project root not found: {}", root.display()))?;
    Config::load(&root)
}
