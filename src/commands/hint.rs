use anyhow::{bail, Result};
use colored::Colorize;

use super::Workspace;
use crate::config::Config;

/// Print a hint for an exercise
///
/// Without `--level` the first hint is shown; attempt counts only live inside
/// a running session.
pub fn execute(config: Config, name: Option<&str>, level: Option<u8>) -> Result<()> {
    if let Some(level) = level {
        if !(1..=3).contains(&level) {
            bail!("Hint level must be 1, 2 or 3, got {level}");
        }
    }

    let workspace = Workspace::open(config)?;
    let exercise = workspace.select(name)?;
    let level = level.unwrap_or_else(|| exercise.hint_level());

    println!(
        "{} {} ({})",
        "💡".bold(),
        exercise.title.bold(),
        exercise.name.dimmed()
    );
    println!("{}\n", format!("Hint level {level}").cyan());

    for line in exercise.hints.at_level(level).lines() {
        println!("  {line}");
    }

    if !exercise.objectives.is_empty() {
        println!("\n{}", "Objectives:".bold());
        for objective in &exercise.objectives {
            println!("  • {objective}");
        }
    }

    Ok(())
}
