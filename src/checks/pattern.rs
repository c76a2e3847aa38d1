use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::{CheckOutcome, StaticCheck};

/// One `[[static_checks]]` entry from kata.toml
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternCheckConfig {
    pub id: String,
    pub pattern: String,
    /// Fail when the pattern matches instead of when it doesn't
    #[serde(default)]
    pub forbid: bool,
    /// Message shown on failure
    #[serde(default)]
    pub message: Option<String>,
}

/// Regex rule over the whole source text
#[derive(Debug, Clone)]
pub struct PatternCheck {
    regex: Regex,
    forbid: bool,
    message: Option<String>,
}

impl PatternCheck {
    pub fn new(pattern: &str, forbid: bool) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid static check pattern: {pattern}"))?;
        Ok(Self {
            regex,
            forbid,
            message: None,
        })
    }

    pub fn from_config(config: &PatternCheckConfig) -> Result<Self> {
        let mut check = Self::new(&config.pattern, config.forbid)
            .with_context(|| format!("static check '{}'", config.id))?;
        check.message = config.message.clone();
        Ok(check)
    }

    /// Judge already-loaded source text
    pub fn evaluate(&self, content: &str) -> CheckOutcome {
        let found = self.regex.find(content);
        let passed = found.is_some() != self.forbid;

        if passed {
            return CheckOutcome::pass("static check passed");
        }

        let default_message = match found {
            Some(m) => {
                let line = content[..m.start()].matches('\n').count() + 1;
                format!(
                    "forbidden pattern `{}` found on line {line}",
                    self.regex.as_str()
                )
            }
            None => format!("expected pattern `{}` not found", self.regex.as_str()),
        };

        CheckOutcome::fail(self.message.clone().unwrap_or(default_message))
    }
}

impl StaticCheck for PatternCheck {
    fn check(&self, path: &Path) -> Result<CheckOutcome> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.evaluate(&content))
    }
}
