//! Static check registry used by the `static` validation mode.
//!
//! A static check inspects an exercise source file without running anything.
//! Checks are registered once at startup under a string id and shared with the
//! runner; exercise metadata refers to them through `validation.static_check_id`.
//!
//! ## Built-in rule family
//!
//! `[[static_checks]]` entries in `kata.toml` become [`PatternCheck`]s:
//! - `pattern` must match the source (default)
//! - with `forbid = true`, `pattern` must NOT match

mod pattern;

pub use pattern::{PatternCheck, PatternCheckConfig};

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Verdict of a single static check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// A rule applied to a source path
///
/// `Err` means the check itself could not run (unreadable file, ...), which
/// the runner reports as a failed validation.
pub trait StaticCheck: Send + Sync {
    fn check(&self, path: &Path) -> Result<CheckOutcome>;
}

impl<F> StaticCheck for F
where
    F: Fn(&Path) -> Result<CheckOutcome> + Send + Sync,
{
    fn check(&self, path: &Path) -> Result<CheckOutcome> {
        self(path)
    }
}

/// Id -> rule lookup table
#[derive(Default)]
pub struct StaticCheckRegistry {
    checks: BTreeMap<String, Box<dyn StaticCheck>>,
}

impl fmt::Debug for StaticCheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCheckRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl StaticCheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from `[[static_checks]]` config entries
    pub fn from_config(entries: &[PatternCheckConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for entry in entries {
            registry.register(&entry.id, PatternCheck::from_config(entry)?)?;
        }
        Ok(registry)
    }

    /// Register a rule; ids must be unique
    pub fn register<C>(&mut self, id: &str, check: C) -> Result<()>
    where
        C: StaticCheck + 'static,
    {
        let id = id.trim();
        if id.is_empty() {
            bail!("static check id cannot be empty");
        }
        if self.checks.contains_key(id) {
            bail!("static check '{id}' is already registered");
        }
        self.checks.insert(id.to_string(), Box::new(check));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&dyn StaticCheck> {
        self.checks.get(id).map(|c| c.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.checks.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.checks.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
