use anyhow::Result;
use colored::Colorize;

use super::Workspace;
use crate::config::Config;

/// Print every exercise in order with its completion state
pub fn execute(config: Config) -> Result<()> {
    let workspace = Workspace::open(config)?;
    let registry = &workspace.registry;
    let current = registry.resume_position();

    let mut category = None;
    for (i, exercise) in registry.exercises().iter().enumerate() {
        if category != Some(exercise.category.as_str()) {
            category = Some(exercise.category.as_str());
            println!("\n{}", exercise.category.bold());
        }

        let icon = if exercise.completed {
            "✓".green()
        } else {
            "○".dimmed()
        };
        let marker = if i == current { "→" } else { " " };

        println!(
            "  {} {} {:<28} {}",
            marker.cyan().bold(),
            icon,
            exercise.name,
            format!("{} · {}", exercise.validation.mode, exercise.title).dimmed()
        );
    }

    let stats = registry.stats();
    println!(
        "\n{} {}/{} completed ({:.0}%)",
        "→".cyan().bold(),
        stats.completed,
        stats.total,
        stats.percentage
    );

    Ok(())
}
