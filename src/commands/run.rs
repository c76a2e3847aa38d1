use anyhow::Result;
use colored::Colorize;

use super::{warn_if_toolchain_missing, Workspace};
use crate::config::Config;
use crate::exercise::SessionLock;
use crate::runner::{format_duration, ValidationResult};

/// Validate one exercise and record the attempt
///
/// Returns whether it passed so the caller can set the exit code.
pub fn execute(config: Config, name: Option<&str>) -> Result<bool> {
    let _lock = SessionLock::acquire(&config.lock_path())?;
    warn_if_toolchain_missing(&config);

    let mut workspace = Workspace::open(config)?;
    let exercise = workspace.select(name)?.clone();

    println!(
        "{} Checking '{}' ({})...\n",
        "→".cyan().bold(),
        exercise.name,
        exercise.validation.mode
    );

    let result = workspace.runner.run_exercise(&exercise);
    print_result(&result);

    workspace
        .registry
        .record_attempt(&exercise.name, result.success)?;

    if result.success {
        if let Some(next) = workspace.registry.next_incomplete() {
            println!("\n{} Next up: {}", "→".cyan().bold(), next.name);
        } else {
            println!("\n{} All exercises completed!", "✓".green().bold());
        }
    }

    Ok(result.success)
}

fn print_result(result: &ValidationResult) {
    for phase in &result.phases {
        let icon = if phase.success {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {} ({})",
            icon,
            phase.phase,
            format_duration(phase.duration).dimmed()
        );
    }

    let feedback = result.feedback();
    if !feedback.trim().is_empty() {
        println!();
        for line in feedback.lines() {
            println!("  {line}");
        }
    }

    println!();
    if result.success {
        println!("{} {}", "✓".green().bold(), result.summary());
    } else {
        println!("{} {}", "✗".red().bold(), result.summary());
    }
}
