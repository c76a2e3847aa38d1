//! Project configuration (`kata.toml`) and state-directory layout

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checks::PatternCheckConfig;
use crate::runner::Toolchain;

/// Name of the optional project configuration file
pub const CONFIG_FILE: &str = "kata.toml";

/// Timeout applied to exercises that don't configure their own
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parsed kata.toml structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exercises_dir: PathBuf,
    pub solutions_dir: PathBuf,
    pub state_dir: PathBuf,
    #[serde(deserialize_with = "deserialize_duration")]
    pub default_timeout: Duration,
    pub toolchain: Toolchain,
    pub static_checks: Vec<PatternCheckConfig>,
    /// Project root every relative path above is resolved against
    #[serde(skip)]
    root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exercises_dir: PathBuf::from("exercises"),
            solutions_dir: PathBuf::from("solutions"),
            state_dir: PathBuf::from(".kata"),
            default_timeout: DEFAULT_TIMEOUT,
            toolchain: Toolchain::default(),
            static_checks: Vec::new(),
            root: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load kata.toml from a project root
    ///
    /// A missing file is not an error: the defaults (Go toolchain, `exercises/`,
    /// `solutions/`, `.kata/`) apply.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.root = root.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Build a config rooted at `root` without reading any file
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.toolchain.source_extension.trim().is_empty() {
            bail!("toolchain.source_extension cannot be empty");
        }
        if self.toolchain.build.trim().is_empty() {
            bail!("toolchain.build command cannot be empty");
        }
        if self.default_timeout.is_zero() {
            bail!("default_timeout must be greater than zero");
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exercises_path(&self) -> PathBuf {
        self.root.join(&self.exercises_dir)
    }

    pub fn solutions_path(&self) -> PathBuf {
        self.root.join(&self.solutions_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(&self.state_dir)
    }

    /// Get the progress.toml path
    pub fn progress_path(&self) -> PathBuf {
        self.state_path().join("progress.toml")
    }

    /// Directory compiled exercise binaries are written to
    pub fn artifact_dir(&self) -> PathBuf {
        self.state_path().join("bin")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_path().join("kata.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_path().join("session.lock")
    }

    /// Ensure the state directory and its subdirectories exist
    pub fn ensure_state_dir(&self) -> Result<PathBuf> {
        let state = self.state_path();
        for dir in [state.clone(), self.artifact_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(state)
    }
}

/// Parse a human duration: `"150ms"`, `"30s"`, `"2m"`, `"1h"` or bare seconds (`"10"`)
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty duration");
    }

    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration '{raw}'"))?;

    let duration = match unit.trim() {
        "" | "s" => Duration::from_secs(value),
        "ms" => Duration::from_millis(value),
        "m" => Duration::from_secs(value * 60),
        "h" => Duration::from_secs(value * 3600),
        other => bail!("unknown duration unit '{other}' in '{raw}'"),
    };

    Ok(duration)
}

/// Serde adapter accepting either a duration string or an integer of seconds
pub fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
