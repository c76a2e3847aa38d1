use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Strategy used to judge an exercise's current source
///
/// Each variant carries only the fields it needs, so a runner match over it is
/// exhaustive and an unknown mode can only appear at metadata parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationMode {
    /// Compiling is enough
    Build,
    /// Run the companion test file
    Test,
    /// Execute the program, optionally comparing its output
    Run { expected_output: Option<String> },
    /// Apply a named rule from the static check registry
    Static { check_id: String },
}

impl ValidationMode {
    /// Build a mode from the raw `[validation]` fields
    pub fn parse(
        mode: &str,
        expected_output: Option<String>,
        static_check_id: Option<String>,
    ) -> Result<Self, String> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "build" => Ok(ValidationMode::Build),
            "test" => Ok(ValidationMode::Test),
            "run" => Ok(ValidationMode::Run { expected_output }),
            "static" => match static_check_id.as_deref().map(str::trim) {
                Some(check_id) if !check_id.is_empty() => Ok(ValidationMode::Static {
                    check_id: check_id.to_string(),
                }),
                _ => Err("mode 'static' requires a static_check_id".to_string()),
            },
            other => Err(format!("unknown validation mode '{other}'")),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValidationMode::Build => "build",
            ValidationMode::Test => "test",
            ValidationMode::Run { .. } => "run",
            ValidationMode::Static { .. } => "static",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How an exercise is validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    /// Per-exercise deadline; the runner default applies when absent
    pub timeout: Option<Duration>,
    /// Files (relative to the exercise directory) that must exist
    pub required_files: Vec<String>,
}

/// Escalating hints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hints {
    pub level_1: String,
    pub level_2: Option<String>,
    pub level_3: Option<String>,
}

impl Hints {
    /// Hint level unlocked by a number of attempts: 1 for 0-2, 2 for 3-5, 3 from 6 on
    pub fn level_for_attempts(attempts: u32) -> u8 {
        match attempts {
            0..=2 => 1,
            3..=5 => 2,
            _ => 3,
        }
    }

    /// Text for a level, falling back to the closest lower level that exists
    pub fn at_level(&self, level: u8) -> &str {
        let level_2 = self.level_2.as_deref().filter(|h| !h.trim().is_empty());
        let level_3 = self.level_3.as_deref().filter(|h| !h.trim().is_empty());

        match level {
            0 | 1 => &self.level_1,
            2 => level_2.unwrap_or(&self.level_1),
            _ => level_3.or(level_2).unwrap_or(&self.level_1),
        }
    }

    pub fn for_attempts(&self, attempts: u32) -> &str {
        self.at_level(Self::level_for_attempts(attempts))
    }
}

/// One learning unit: a mutable source file plus its metadata
#[derive(Debug, Clone)]
pub struct Exercise {
    pub name: String,
    pub category: String,
    pub difficulty: u8,
    pub estimated_time: Option<String>,
    pub toolchain_version: Option<String>,

    pub source_path: PathBuf,
    pub solution_path: PathBuf,
    pub metadata_path: PathBuf,

    pub title: String,
    pub summary: String,
    pub objectives: Vec<String>,
    pub hints: Hints,
    pub validation: ValidationConfig,

    pub completed: bool,
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl Exercise {
    /// Directory holding the source file; every toolchain command runs here
    pub fn dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Source file name without extension
    pub fn stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Hint matching the current number of attempts
    pub fn hint(&self) -> &str {
        self.hints.for_attempts(self.attempts)
    }

    pub fn hint_level(&self) -> u8 {
        Hints::level_for_attempts(self.attempts)
    }

    /// Required files that are not present in the exercise directory
    pub fn missing_required_files(&self) -> Vec<String> {
        self.validation
            .required_files
            .iter()
            .filter(|file| !self.dir().join(file).exists())
            .cloned()
            .collect()
    }

    /// Count one more attempt
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt = Some(Utc::now());
        self.attempts
    }
}
