//! Interactive session: state machine, key map, rendering and the event loop

mod app;
mod keys;
mod message;
mod state;
mod theme;
mod tui;
mod view;

pub use app::App;
pub use keys::{action_for_key, KEY_HINTS};
pub use message::{Action, Effect, Message};
pub use state::{Session, View};
pub use tui::Tui;
pub use view::render;

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::exercise::{ExerciseRegistry, RegistryPaths};
    use crate::runner::{Phase, PhaseResult, ValidationResult};

    /// Registry over `exercises/01_basics/<name>/<name>.sh` for each name
    pub fn fixture(names: &[&str]) -> (TempDir, ExerciseRegistry) {
        let temp_dir = TempDir::new().unwrap();
        for name in names {
            write_exercise(temp_dir.path(), name);
        }

        let registry = ExerciseRegistry::load_from(&RegistryPaths {
            exercises_dir: temp_dir.path().join("exercises"),
            solutions_dir: temp_dir.path().join("solutions"),
            progress_file: temp_dir.path().join(".kata/progress.toml"),
            source_extension: "sh".to_string(),
            scaffold_file: None,
        })
        .unwrap();

        (temp_dir, registry)
    }

    fn write_exercise(root: &Path, name: &str) {
        let dir = root.join("exercises/01_basics").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{name}.toml")),
            format!(
                r#"
[exercise]
name = "{name}"

[description]
title = "{name} title"
summary = "Practice {name}"

[validation]
mode = "build"

[hints]
level_1 = "hint one for {name}"
level_2 = "hint two for {name}"
"#
            ),
        )
        .unwrap();
        fs::write(dir.join(format!("{name}.sh")), "echo hi\n").unwrap();
    }

    fn result(name: &str, success: bool, output: &str) -> ValidationResult {
        let mut result = ValidationResult::new(name);
        result.push_phase(PhaseResult {
            phase: Phase::Build,
            success,
            output: output.to_string(),
            timed_out: false,
            duration: Duration::from_millis(12),
        });
        if !success {
            result.fail("Build failed");
        }
        result.finish(Duration::from_millis(15))
    }

    pub fn passed(name: &str) -> ValidationResult {
        result(name, true, "")
    }

    pub fn failed(name: &str) -> ValidationResult {
        result(name, false, "syntax error")
    }

    pub fn failed_with(name: &str, output: &str) -> ValidationResult {
        result(name, false, output)
    }
}
