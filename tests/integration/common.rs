use kata::checks::StaticCheckRegistry;
use kata::config::{Config, CONFIG_FILE};
use kata::exercise::ExerciseRegistry;
use kata::runner::Runner;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const KATA_TOML: &str = r#"
default_timeout = "10s"

[toolchain]
source_extension = "sh"
build = "sh -n {source}"
run = "sh {source}"
test = "sh {test}"

[[static_checks]]
id = "uses_printf"
pattern = "printf"
message = "print with printf, not echo"
"#;

/// A throwaway project root with kata.toml and an exercises tree
pub struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join(CONFIG_FILE), KATA_TOML).unwrap();
        fs::create_dir_all(root.join("exercises")).unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `<category>/<name>/<name>.toml` and `<name>.sh`; returns the source path
    pub fn add_exercise(&self, category: &str, name: &str, validation: &str, source: &str) -> PathBuf {
        let dir = self.root.join("exercises").join(category).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{name}.toml")),
            format!(
                r#"
[exercise]
name = "{name}"
difficulty = 1
estimated_time = "5m"

[description]
title = "{name}"
summary = "Exercise {name}"
learning_objectives = ["Learn {name}"]

[validation]
{validation}

[hints]
level_1 = "First hint for {name}"
level_2 = "Second hint for {name}"
level_3 = "Third hint for {name}"
"#
            ),
        )
        .unwrap();

        let source_path = dir.join(format!("{name}.sh"));
        fs::write(&source_path, source).unwrap();
        source_path
    }

    pub fn config(&self) -> Config {
        Config::load(&self.root).unwrap()
    }

    pub fn registry(&self) -> ExerciseRegistry {
        ExerciseRegistry::load(&self.config()).unwrap()
    }

    pub fn runner(&self) -> Runner {
        let config = self.config();
        let checks = StaticCheckRegistry::from_config(&config.static_checks).unwrap();
        Runner::from_config(&config, Arc::new(checks))
    }
}

/// The hello exercise from the learner walkthrough, starting out wrong
pub fn hello_project() -> (Project, PathBuf) {
    let project = Project::new();
    let source = project.add_exercise(
        "01_basics",
        "hello",
        "mode = \"run\"\nexpected_output = \"Hello, GoForGo!\"",
        "echo 'Hello, World!'\n",
    );
    (project, source)
}
