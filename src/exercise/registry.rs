//! Exercise discovery, lookup and completion tracking

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::metadata::ExerciseMetadata;
use super::model::Exercise;
use super::progress::Progress;
use crate::config::Config;

/// Errors surfaced by the registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("exercises directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("no exercise metadata (*.toml) found under {}", .0.display())]
    Empty(PathBuf),
    #[error("failed to load {} exercise(s):\n  - {}", .0.len(), .0.join("\n  - "))]
    Invalid(Vec<String>),
    #[error("exercise '{0}' not found")]
    NotFound(String),
}

/// Aggregate completion counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStats {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Where the registry looks for exercises and keeps its progress file
#[derive(Debug, Clone)]
pub struct RegistryPaths {
    pub exercises_dir: PathBuf,
    pub solutions_dir: PathBuf,
    pub progress_file: PathBuf,
    pub source_extension: String,
    /// Toolchain scaffold file name; never read as exercise metadata
    pub scaffold_file: Option<String>,
}

impl RegistryPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            exercises_dir: config.exercises_path(),
            solutions_dir: config.solutions_path(),
            progress_file: config.progress_path(),
            source_extension: config.toolchain.source_extension.clone(),
            scaffold_file: config
                .toolchain
                .scaffold
                .as_ref()
                .map(|scaffold| scaffold.file.clone()),
        }
    }
}

/// Ordered exercise catalog plus persisted progress
#[derive(Debug)]
pub struct ExerciseRegistry {
    exercises: Vec<Exercise>,
    index: HashMap<String, usize>,
    progress: Progress,
    progress_file: PathBuf,
}

impl ExerciseRegistry {
    pub fn load(config: &Config) -> Result<Self> {
        Self::load_from(&RegistryPaths::from_config(config))
    }

    /// Discover every exercise under `paths.exercises_dir`
    ///
    /// Loading is all-or-nothing: any unreadable metadata, missing source file
    /// or duplicate name fails the whole load with one aggregated error.
    pub fn load_from(paths: &RegistryPaths) -> Result<Self> {
        if !paths.exercises_dir.is_dir() {
            return Err(RegistryError::MissingDirectory(paths.exercises_dir.clone()).into());
        }

        let root = paths.exercises_dir.canonicalize().with_context(|| {
            format!(
                "Failed to resolve exercises directory: {}",
                paths.exercises_dir.display()
            )
        })?;

        let metadata_files = discover_metadata(&root, paths.scaffold_file.as_deref())?;
        if metadata_files.is_empty() {
            return Err(RegistryError::Empty(root).into());
        }

        let mut exercises = Vec::with_capacity(metadata_files.len());
        let mut problems = Vec::new();
        let mut index = HashMap::new();

        for metadata_path in metadata_files {
            match load_exercise(&metadata_path, &root, paths) {
                Ok(exercise) => {
                    if index.contains_key(&exercise.name) {
                        problems.push(format!(
                            "{}: duplicate exercise name '{}'",
                            metadata_path.display(),
                            exercise.name
                        ));
                        continue;
                    }
                    index.insert(exercise.name.clone(), exercises.len());
                    exercises.push(exercise);
                }
                Err(problem) => problems.push(problem),
            }
        }

        if !problems.is_empty() {
            return Err(RegistryError::Invalid(problems).into());
        }

        let progress = Progress::load(&paths.progress_file)?;
        for exercise in &mut exercises {
            exercise.completed = progress.is_completed(&exercise.name);
        }

        tracing::info!(
            exercises = exercises.len(),
            root = %root.display(),
            "Loaded exercise catalog"
        );

        Ok(Self {
            exercises,
            index,
            progress,
            progress_file: paths.progress_file.clone(),
        })
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Exercise> {
        self.exercises.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Exercise, RegistryError> {
        self.position(name)
            .map(|i| &self.exercises[i])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// First incomplete exercise in discovery order
    pub fn next_incomplete(&self) -> Option<&Exercise> {
        self.exercises.iter().find(|e| !e.completed)
    }

    /// Position the learner should resume at
    ///
    /// The persisted pointer wins when it still names an exercise; otherwise
    /// the first incomplete exercise, otherwise the first one.
    pub fn resume_position(&self) -> usize {
        if let Some(pos) = self
            .progress
            .current_exercise
            .as_deref()
            .and_then(|name| self.position(name))
        {
            return pos;
        }

        self.exercises
            .iter()
            .position(|e| !e.completed)
            .unwrap_or(0)
    }

    /// Mark an exercise completed and persist the change
    ///
    /// Returns `Ok(false)` without touching the store when it was already
    /// completed. If the save fails the in-memory flag is rolled back so the
    /// store and the catalog never disagree.
    pub fn mark_completed(&mut self, name: &str) -> Result<bool> {
        let pos = self
            .position(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if self.exercises[pos].completed && self.progress.is_completed(name) {
            return Ok(false);
        }

        let previous = self.progress.clone();
        self.progress.set_completed(name);
        self.exercises[pos].completed = true;

        if let Err(e) = self.progress.save(&self.progress_file) {
            self.progress = previous;
            self.exercises[pos].completed = self.progress.is_completed(name);
            return Err(e);
        }

        tracing::info!(exercise = name, "Exercise completed");
        Ok(true)
    }

    /// Fold one validation outcome back into the catalog
    ///
    /// Attempts only ever increase; a successful outcome also marks the
    /// exercise completed. Returns the new attempt count.
    pub fn record_attempt(&mut self, name: &str, success: bool) -> Result<u32> {
        let pos = self
            .position(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let attempts = self.exercises[pos].record_attempt();
        tracing::debug!(exercise = name, attempts, success, "Recorded attempt");

        if success {
            self.mark_completed(name)?;
        }

        Ok(attempts)
    }

    /// Persist the current-exercise pointer
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if self.position(name).is_none() {
            return Err(RegistryError::NotFound(name.to_string()).into());
        }

        if self.progress.set_current(name) {
            self.progress.save(&self.progress_file)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> ProgressStats {
        let total = self.exercises.len();
        let completed = self.exercises.iter().filter(|e| e.completed).count();
        let percentage = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };

        ProgressStats {
            completed,
            total,
            percentage,
        }
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn progress_file(&self) -> &Path {
        &self.progress_file
    }
}

/// All metadata files under root in sorted traversal order
///
/// Files named like the toolchain scaffold (a `Cargo.toml`, say) belong to
/// the toolchain and are skipped.
fn discover_metadata(root: &Path, scaffold_file: Option<&str>) -> Result<Vec<PathBuf>> {
    let skip = scaffold_file
        .and_then(|file| Path::new(file).file_name())
        .map(|name| name.to_os_string());

    let pattern = format!(
        "{}/**/*.toml",
        glob::Pattern::escape(&root.to_string_lossy())
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern).context("Invalid exercise glob pattern")? {
        let path = entry.context("Failed to read exercise directory entry")?;
        if path.is_file() && (skip.is_none() || path.file_name() != skip.as_deref()) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Pair one metadata file with its source; errors are returned as messages
/// so the caller can aggregate them
fn load_exercise(
    metadata_path: &Path,
    root: &Path,
    paths: &RegistryPaths,
) -> std::result::Result<Exercise, String> {
    let metadata = ExerciseMetadata::load(metadata_path).map_err(|e| e.to_string())?;
    let validation = metadata.validation_config().map_err(|e| {
        format!("{}: {e}", metadata_path.display())
    })?;

    let dir = metadata_path.parent().unwrap_or(root);
    let stem = metadata_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| metadata.exercise.name.clone());
    let source_file = format!("{stem}.{}", paths.source_extension);
    let source_path = dir.join(&source_file);

    if !source_path.is_file() {
        return Err(format!(
            "{}: missing source file {}",
            metadata_path.display(),
            source_path.display()
        ));
    }

    let relative_dir = dir.strip_prefix(root).unwrap_or(Path::new(""));
    let solution_path = paths.solutions_dir.join(relative_dir).join(&source_file);

    let category = metadata.exercise.category.clone().unwrap_or_else(|| {
        relative_dir
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .unwrap_or_default()
    });

    Ok(Exercise {
        name: metadata.exercise.name.trim().to_string(),
        category,
        difficulty: metadata.exercise.difficulty,
        estimated_time: metadata.exercise.estimated_time.clone(),
        toolchain_version: metadata.exercise.toolchain_version.clone(),
        source_path,
        solution_path,
        metadata_path: metadata_path.to_path_buf(),
        title: metadata.description.title.clone(),
        summary: metadata.description.summary.clone(),
        objectives: metadata.description.learning_objectives.clone(),
        hints: metadata.hints(),
        validation,
        completed: false,
        attempts: 0,
        last_attempt: None,
    })
}
