//! End-to-end validation scenarios through the real runner

use kata::runner::Phase;
use std::fs;
use std::time::{Duration, Instant};

use crate::common::{hello_project, Project};

#[test]
fn test_wrong_output_fails_with_both_strings() {
    let (project, _source) = hello_project();
    let registry = project.registry();
    let hello = registry.get_by_name("hello").unwrap();

    let result = project.runner().run_exercise(hello);

    assert!(!result.success);
    assert!(result.phase(Phase::Build).unwrap().success);
    assert!(!result.phase(Phase::Run).unwrap().success);

    let feedback = result.feedback();
    assert!(feedback.contains("Hello, GoForGo!"), "{feedback}");
    assert!(feedback.contains("Hello, World!"), "{feedback}");
}

#[test]
fn test_fixed_output_passes_and_completes() {
    let (project, source) = hello_project();
    fs::write(&source, "echo 'Hello, GoForGo!'\n").unwrap();

    let mut registry = project.registry();
    let runner = project.runner();
    let result = runner.run_exercise(registry.get_by_name("hello").unwrap());
    assert!(result.success, "{}", result.feedback());
    assert!(result.error.is_none());

    registry.record_attempt("hello", result.success).unwrap();
    assert!(registry.get_by_name("hello").unwrap().completed);

    let reloaded = project.registry();
    assert!(reloaded.get_by_name("hello").unwrap().completed);
    assert_eq!(reloaded.stats().completed, 1);
}

#[test]
fn test_syntax_error_fails_at_build() {
    let project = Project::new();
    project.add_exercise(
        "01_basics",
        "broken",
        "mode = \"build\"",
        "if true; then\n  echo hi\n",
    );

    let registry = project.registry();
    let result = project
        .runner()
        .run_exercise(registry.get_by_name("broken").unwrap());

    assert!(!result.success);
    assert_eq!(result.phases.len(), 1);
    assert_eq!(result.phases[0].phase, Phase::Build);
    assert_eq!(result.error.as_deref(), Some("Build failed"));
    assert!(!result.output.trim().is_empty());
}

#[test]
fn test_infinite_loop_times_out() {
    let project = Project::new();
    project.add_exercise(
        "01_basics",
        "forever",
        "mode = \"run\"\ntimeout = \"100ms\"",
        "while true; do sleep 1; done\n",
    );

    let registry = project.registry();
    let start = Instant::now();
    let result = project
        .runner()
        .run_exercise(registry.get_by_name("forever").unwrap());

    assert!(!result.success);
    assert!(result.timed_out());
    assert!(result.error.as_deref().unwrap().contains("timed out after 100ms"));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_todo_marker_blocks_completion() {
    let project = Project::new();
    project.add_exercise(
        "01_basics",
        "greet",
        "mode = \"run\"\nexpected_output = \"hi\"",
        "# TODO remove this line when done\necho hi\n",
    );

    let registry = project.registry();
    let result = project
        .runner()
        .run_exercise(registry.get_by_name("greet").unwrap());

    assert!(!result.success);
    assert_eq!(result.todos.len(), 1);
    assert_eq!(result.todos[0].line, 1);
    assert_eq!(result.todos[0].text, "# TODO remove this line when done");
}

#[test]
fn test_mode_uses_companion_file() {
    let project = Project::new();
    let source = project.add_exercise(
        "02_functions",
        "add",
        "mode = \"test\"",
        "add() { echo $(( $1 + $2 )); }\n",
    );

    let registry = project.registry();
    let runner = project.runner();
    let add = registry.get_by_name("add").unwrap();

    let missing = runner.run_exercise(add);
    assert!(!missing.success);
    assert!(missing.error.as_deref().unwrap().contains("Test file not found"));

    fs::write(
        source.with_file_name("add_test.sh"),
        ". ./add.sh\n[ \"$(add 2 3)\" = 5 ] || { echo 'add 2 3 != 5'; exit 1; }\n",
    )
    .unwrap();
    let result = runner.run_exercise(add);
    assert!(result.success, "{}", result.feedback());
}

#[test]
fn test_static_mode_uses_configured_rule() {
    let project = Project::new();
    let source = project.add_exercise(
        "03_style",
        "printing",
        "mode = \"static\"\nstatic_check_id = \" uses_printf \"",
        "echo hi\n",
    );

    let registry = project.registry();
    let runner = project.runner();
    let printing = registry.get_by_name("printing").unwrap();

    let result = runner.run_exercise(printing);
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("print with printf, not echo"));

    fs::write(&source, "printf 'hi\\n'\n").unwrap();
    assert!(runner.run_exercise(printing).success);
}

#[test]
fn test_required_files_checked_before_build() {
    let project = Project::new();
    let source = project.add_exercise(
        "04_files",
        "reader",
        "mode = \"run\"\nrequired_files = [\"input.txt\"]",
        "cat input.txt\n",
    );

    let registry = project.registry();
    let runner = project.runner();
    let reader = registry.get_by_name("reader").unwrap();

    let result = runner.run_exercise(reader);
    assert!(!result.success);
    assert!(result.phases.is_empty());
    assert!(result.error.as_deref().unwrap().contains("input.txt"));

    fs::write(source.with_file_name("input.txt"), "data\n").unwrap();
    assert!(runner.run_exercise(reader).success);
}
