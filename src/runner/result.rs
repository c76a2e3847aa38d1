use std::fmt;
use std::time::Duration;

/// Pipeline stage a sub-result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Test,
    Run,
    Static,
    TodoScan,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Build => write!(f, "build"),
            Phase::Test => write!(f, "test"),
            Phase::Run => write!(f, "run"),
            Phase::Static => write!(f, "static"),
            Phase::TodoScan => write!(f, "todo-scan"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase: Phase,
    pub success: bool,
    pub output: String,
    pub timed_out: bool,
    pub duration: Duration,
}

/// A scaffold marker left in the learner's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoMarker {
    /// 1-based
    pub line: usize,
    pub text: String,
}

/// Outcome of validating one exercise
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub exercise: String,
    pub success: bool,
    pub phases: Vec<PhaseResult>,
    /// Output of the last phase that ran
    pub output: String,
    pub error: Option<String>,
    pub todos: Vec<TodoMarker>,
    pub duration: Duration,
}

impl ValidationResult {
    pub fn new(exercise: &str) -> Self {
        Self {
            exercise: exercise.to_string(),
            success: false,
            phases: Vec::new(),
            output: String::new(),
            error: None,
            todos: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn push_phase(&mut self, result: PhaseResult) {
        self.output = result.output.clone();
        self.phases.push(result);
    }

    /// Record a failure; the first one wins
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    /// Seal the result: success requires at least one phase, all passing, no error
    pub(crate) fn finish(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self.success =
            self.error.is_none() && !self.phases.is_empty() && self.phases.iter().all(|p| p.success);
        self
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn timed_out(&self) -> bool {
        self.phases.iter().any(|p| p.timed_out)
    }

    /// Text shown to the learner: the error followed by the captured output
    pub fn feedback(&self) -> String {
        let output = self.output.trim_end();
        match (&self.error, output.is_empty()) {
            (Some(error), true) => error.clone(),
            (Some(error), false) if error.contains(output) => error.clone(),
            (Some(error), false) => format!("{error}\n\n{output}"),
            (None, _) => output.to_string(),
        }
    }

    pub fn summary(&self) -> String {
        let status = if self.success { "PASSED" } else { "FAILED" };
        format!(
            "{} - {} ({})",
            status,
            self.exercise,
            format_duration(self.duration)
        )
    }
}

/// `850ms`, `1.2s`, `2m05s`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
