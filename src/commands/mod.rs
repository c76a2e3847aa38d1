//! CLI subcommands

pub mod hint;
pub mod list;
pub mod run;
pub mod watch;

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use crate::checks::StaticCheckRegistry;
use crate::config::Config;
use crate::exercise::{Exercise, ExerciseRegistry};
use crate::runner::Runner;

/// Everything a command needs, loaded from one project root
pub struct Workspace {
    pub config: Config,
    pub registry: ExerciseRegistry,
    pub runner: Arc<Runner>,
}

impl Workspace {
    pub fn open(config: Config) -> Result<Self> {
        let checks = StaticCheckRegistry::from_config(&config.static_checks)
            .context("Invalid [[static_checks]] in kata.toml")?;
        let registry = ExerciseRegistry::load(&config)?;
        let runner = Arc::new(Runner::from_config(&config, Arc::new(checks)));

        Ok(Self {
            config,
            registry,
            runner,
        })
    }

    /// Named exercise, or the one the learner should resume at
    pub fn select(&self, name: Option<&str>) -> Result<&Exercise> {
        match name {
            Some(name) => Ok(self.registry.get_by_name(name)?),
            None => self
                .registry
                .get(self.registry.resume_position())
                .context("No exercises loaded"),
        }
    }
}

/// Print a warning when the build program is not on PATH
///
/// Not fatal: the first build reports the real error to the learner.
pub fn warn_if_toolchain_missing(config: &Config) {
    if let Err(e) = config.toolchain.check_available() {
        tracing::warn!(error = %e, "Toolchain not found");
        eprintln!("{} {e:#}", "⚠".yellow().bold());
    }
}
