use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use super::{warn_if_toolchain_missing, Workspace};
use crate::config::Config;
use crate::exercise::SessionLock;
use crate::session::{App, Session, Tui};
use crate::watcher::Watcher;

/// Execute the interactive watch session
pub fn execute(config: Config) -> Result<()> {
    let _lock = SessionLock::acquire(&config.lock_path())?;
    warn_if_toolchain_missing(&config);

    let workspace = Workspace::open(config)?;
    let exercises_dir = workspace.config.exercises_path();
    let source_extension = workspace.config.toolchain.source_extension.clone();

    let watcher = Arc::new(Watcher::new().context("Failed to create file watcher")?);
    watcher
        .add(&exercises_dir)
        .with_context(|| format!("Failed to watch {}", exercises_dir.display()))?;

    let session = Session::new(workspace.registry, source_extension);
    let app = App::new(session, workspace.runner, Arc::clone(&watcher));

    tracing::info!("Session started");
    let session = {
        let mut tui = Tui::new()?;
        app.run(&mut tui)?
    };
    tracing::info!("Session ended");

    let stats = session.registry().stats();
    println!(
        "{} {}/{} exercises completed ({:.0}%)",
        "→".cyan().bold(),
        stats.completed,
        stats.total,
        stats.percentage
    );
    if stats.total > 0 && stats.completed == stats.total {
        println!("{} Every exercise is done. Well played!", "✓".green().bold());
    }

    Ok(())
}
