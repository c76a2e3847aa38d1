use anyhow::{Context, Result};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::process::{run_command, CommandOutput};
use super::result::{format_duration, Phase, PhaseResult, ValidationResult};
use super::scaffold::{describe_markers, scan_file};
use super::toolchain::{CommandContext, Toolchain};
use crate::checks::StaticCheckRegistry;
use crate::config::Config;
use crate::exercise::{Exercise, ValidationMode};

/// Validates exercises: bootstrap, build, mode check, scaffold scan
#[derive(Debug, Clone)]
pub struct Runner {
    toolchain: Toolchain,
    checks: Arc<StaticCheckRegistry>,
    default_timeout: Duration,
    artifact_dir: PathBuf,
}

impl Runner {
    pub fn new(
        toolchain: Toolchain,
        checks: Arc<StaticCheckRegistry>,
        default_timeout: Duration,
        artifact_dir: PathBuf,
    ) -> Self {
        // Commands run inside each exercise directory, so a relative artifact
        // path would resolve differently per exercise.
        let artifact_dir = std::path::absolute(&artifact_dir).unwrap_or(artifact_dir);
        Self {
            toolchain,
            checks,
            default_timeout,
            artifact_dir,
        }
    }

    pub fn from_config(config: &Config, checks: Arc<StaticCheckRegistry>) -> Self {
        Self::new(
            config.toolchain.clone(),
            checks,
            config.default_timeout,
            config.artifact_dir(),
        )
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn timeout_for(&self, exercise: &Exercise) -> Duration {
        exercise.validation.timeout.unwrap_or(self.default_timeout)
    }

    pub fn artifact_path(&self, exercise: &Exercise) -> PathBuf {
        self.artifact_dir.join(&exercise.name)
    }

    pub fn test_path(&self, exercise: &Exercise) -> PathBuf {
        exercise
            .dir()
            .join(self.toolchain.test_file_name(&exercise.stem()))
    }

    /// Validate the exercise's current source
    ///
    /// Never fails: setup problems (unwritable artifact dir, unspawnable
    /// shell) end up in `error` of a failed result.
    pub fn run_exercise(&self, exercise: &Exercise) -> ValidationResult {
        let start = Instant::now();
        let mut result = ValidationResult::new(&exercise.name);

        if let Err(e) = self.validate(exercise, &mut result) {
            result.fail(format!("{e:#}"));
        }

        let result = result.finish(start.elapsed());
        tracing::info!(
            exercise = %exercise.name,
            mode = %exercise.validation.mode,
            success = result.success,
            timed_out = result.timed_out(),
            duration_ms = result.duration.as_millis() as u64,
            "Validation finished"
        );
        result
    }

    fn validate(&self, exercise: &Exercise, result: &mut ValidationResult) -> Result<()> {
        let timeout = self.timeout_for(exercise);

        self.bootstrap(exercise)?;

        let missing = exercise.missing_required_files();
        if !missing.is_empty() {
            result.fail(format!("Missing required file(s): {}", missing.join(", ")));
            return Ok(());
        }

        let artifact = self.artifact_path(exercise);
        let test = self.test_path(exercise);
        let ctx = CommandContext {
            source: &exercise.source_path,
            test: &test,
            artifact: &artifact,
            name: &exercise.name,
        };

        let build = self.run_phase(Phase::Build, &self.toolchain.build, exercise, &ctx, timeout)?;
        if !record(result, build, "Build failed", timeout) {
            return Ok(());
        }

        match &exercise.validation.mode {
            ValidationMode::Build => {}
            ValidationMode::Test => {
                if !test.is_file() {
                    result.fail(format!(
                        "Test file not found: {} (test mode needs a companion test file)",
                        test.display()
                    ));
                    return Ok(());
                }
                let phase =
                    self.run_phase(Phase::Test, &self.toolchain.test, exercise, &ctx, timeout)?;
                if !record(result, phase, "Tests failed", timeout) {
                    return Ok(());
                }
            }
            ValidationMode::Run { expected_output } => {
                let output = self.exec(&self.toolchain.run, exercise, &ctx, timeout)?;
                let actual = output.combined();

                let mismatch = match expected_output {
                    Some(expected) if !output.timed_out => {
                        (actual.trim() != expected.trim()).then(|| mismatch_message(expected, &actual))
                    }
                    _ => None,
                };

                let phase = PhaseResult {
                    phase: Phase::Run,
                    success: !output.timed_out
                        && match expected_output {
                            Some(_) => mismatch.is_none(),
                            None => output.success,
                        },
                    output: actual,
                    timed_out: output.timed_out,
                    duration: output.duration,
                };

                let failure = match (&mismatch, output.exit_code) {
                    (Some(message), _) => message.clone(),
                    (None, code) => format!("Program exited with code {}", exit_label(code)),
                };
                if !record(result, phase, &failure, timeout) {
                    return Ok(());
                }
            }
            ValidationMode::Static { check_id } => {
                let start = Instant::now();
                let Some(check) = self.checks.get(check_id) else {
                    result.fail(format!("Unknown static check '{check_id}'"));
                    return Ok(());
                };

                let outcome = check
                    .check(&exercise.source_path)
                    .with_context(|| format!("Static check '{check_id}' could not run"))?;

                let passed = outcome.passed;
                result.push_phase(PhaseResult {
                    phase: Phase::Static,
                    success: passed,
                    output: outcome.message.clone(),
                    timed_out: false,
                    duration: start.elapsed(),
                });
                if !passed {
                    result.fail(outcome.message);
                    return Ok(());
                }
            }
        }

        let start = Instant::now();
        let todos = scan_file(&exercise.source_path)?;
        result.phases.push(PhaseResult {
            phase: Phase::TodoScan,
            success: todos.is_empty(),
            output: String::new(),
            timed_out: false,
            duration: start.elapsed(),
        });
        if !todos.is_empty() {
            result.fail(describe_markers(&todos));
        }
        result.todos = todos;

        Ok(())
    }

    fn bootstrap(&self, exercise: &Exercise) -> Result<()> {
        fs::create_dir_all(&self.artifact_dir).with_context(|| {
            format!(
                "Failed to create artifact directory {}",
                self.artifact_dir.display()
            )
        })?;
        self.toolchain.bootstrap(exercise.dir(), &exercise.name)?;
        Ok(())
    }

    fn exec(
        &self,
        template: &str,
        exercise: &Exercise,
        ctx: &CommandContext<'_>,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        let command = self.toolchain.render(template, ctx);
        run_command(&command, exercise.dir(), timeout)
    }

    fn run_phase(
        &self,
        phase: Phase,
        template: &str,
        exercise: &Exercise,
        ctx: &CommandContext<'_>,
        timeout: Duration,
    ) -> Result<PhaseResult> {
        let output = self.exec(template, exercise, ctx, timeout)?;
        Ok(PhaseResult {
            phase,
            success: output.success,
            output: output.combined(),
            timed_out: output.timed_out,
            duration: output.duration,
        })
    }
}

/// Push a phase and record its failure; returns whether it passed
fn record(
    result: &mut ValidationResult,
    phase: PhaseResult,
    failure: &str,
    timeout: Duration,
) -> bool {
    let success = phase.success;
    let timed_out = phase.timed_out;
    let name = phase.phase;
    result.push_phase(phase);

    if timed_out {
        result.fail(format!("{name} timed out after {}", format_duration(timeout)));
    } else if !success {
        result.fail(failure);
    }
    success
}

fn exit_label(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (killed by signal)".to_string())
}

/// Expected/actual report with a line diff
fn mismatch_message(expected: &str, actual: &str) -> String {
    let expected = expected.trim();
    let actual = actual.trim();

    let mut message = String::from("Output did not match.\n\nExpected:\n");
    push_indented(&mut message, expected);
    message.push_str("\nActual:\n");
    push_indented(&mut message, actual);
    message.push_str("\nDiff:\n");

    let expected_lines = format!("{expected}\n");
    let actual_lines = format!("{actual}\n");
    let diff = TextDiff::from_lines(&expected_lines, &actual_lines);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        message.push_str(sign);
        message.push_str(change.value());
    }

    message.trim_end().to_string()
}

fn push_indented(out: &mut String, text: &str) {
    if text.is_empty() {
        out.push_str("  (empty)\n");
        return;
    }
    for line in text.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}
