//! Exercise metadata TOML schema and validation

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::model::{Hints, ValidationConfig, ValidationMode};
use crate::config::parse_duration;

/// Errors raised while reading one metadata file
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Root structure of an exercise metadata file
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseMetadata {
    pub exercise: ExerciseSection,
    pub description: DescriptionSection,
    pub validation: ValidationSection,
    pub hints: HintsSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseSection {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub estimated_time: Option<String>,
    /// Minimum toolchain version the exercise relies on
    #[serde(default, alias = "go_version")]
    pub toolchain_version: Option<String>,
}

fn default_difficulty() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionSection {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSection {
    pub mode: String,
    #[serde(default)]
    pub timeout: Option<TimeoutValue>,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default, alias = "static_check")]
    pub static_check_id: Option<String>,
    #[serde(default)]
    pub required_files: Vec<String>,
}

/// Timeout as written in TOML: `"30s"`-style string or integer seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeoutValue {
    Seconds(u64),
    Text(String),
}

impl TimeoutValue {
    fn to_duration(&self) -> Result<Duration, String> {
        match self {
            TimeoutValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            TimeoutValue::Text(text) => parse_duration(text).map_err(|e| format!("{e:#}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HintsSection {
    pub level_1: String,
    #[serde(default)]
    pub level_2: Option<String>,
    #[serde(default)]
    pub level_3: Option<String>,
}

impl ExerciseMetadata {
    /// Read and validate a metadata file
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse and validate metadata content; `path` is only used in errors
    pub fn parse(content: &str, path: &Path) -> Result<Self, MetadataError> {
        let metadata: ExerciseMetadata =
            toml::from_str(content).map_err(|source| MetadataError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let problems = metadata.problems();
        if !problems.is_empty() {
            return Err(MetadataError::Invalid {
                path: path.to_path_buf(),
                message: problems.join("; "),
            });
        }

        Ok(metadata)
    }

    /// Collect every validation problem instead of stopping at the first
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let name = self.exercise.name.trim();
        if name.is_empty() {
            problems.push("exercise.name cannot be empty".to_string());
        } else if name.contains(['/', '\\']) || name.contains("..") {
            problems.push(format!("exercise.name '{name}' must not contain path separators"));
        }

        if !(1..=5).contains(&self.exercise.difficulty) {
            problems.push(format!(
                "exercise.difficulty must be between 1 and 5, got {}",
                self.exercise.difficulty
            ));
        }

        if self.description.title.trim().is_empty() {
            problems.push("description.title cannot be empty".to_string());
        }

        if self.hints.level_1.trim().is_empty() {
            problems.push("hints.level_1 cannot be empty".to_string());
        }

        if let Err(e) = self.validation_config() {
            problems.push(e);
        }

        problems
    }

    /// Typed validation settings
    pub fn validation_config(&self) -> Result<ValidationConfig, String> {
        let section = &self.validation;

        let mode = ValidationMode::parse(
            &section.mode,
            section.expected_output.clone(),
            section.static_check_id.clone(),
        )?;

        let timeout = match &section.timeout {
            Some(value) => {
                let timeout = value
                    .to_duration()
                    .map_err(|e| format!("validation.timeout: {e}"))?;
                if timeout.is_zero() {
                    return Err("validation.timeout must be greater than zero".to_string());
                }
                Some(timeout)
            }
            None => None,
        };

        Ok(ValidationConfig {
            mode,
            timeout,
            required_files: section.required_files.clone(),
        })
    }

    pub fn hints(&self) -> Hints {
        Hints {
            level_1: self.hints.level_1.clone(),
            level_2: self.hints.level_2.clone(),
            level_3: self.hints.level_3.clone(),
        }
    }
}
