//! Registry loading and progress persistence against a real project layout

use kata::exercise::{Hints, RegistryError};
use std::fs;

use crate::common::Project;

#[test]
fn test_load_orders_by_path_and_resolves_solutions() {
    let project = Project::new();
    project.add_exercise("02_loops", "for_loop", "mode = \"build\"", "echo\n");
    project.add_exercise("01_basics", "variables", "mode = \"build\"", "echo\n");
    project.add_exercise("01_basics", "hello", "mode = \"build\"", "echo\n");

    let registry = project.registry();
    let names: Vec<&str> = registry.exercises().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["hello", "variables", "for_loop"]);

    let hello = registry.get_by_name("hello").unwrap();
    assert_eq!(hello.category, "01_basics");
    assert_eq!(
        hello.solution_path,
        project.root().join("solutions/01_basics/hello/hello.sh")
    );
    assert_eq!(hello.objectives, vec!["Learn hello".to_string()]);
}

#[test]
fn test_invalid_metadata_fails_whole_load() {
    let project = Project::new();
    project.add_exercise("01_basics", "hello", "mode = \"build\"", "echo\n");
    project.add_exercise("01_basics", "weird", "mode = \"benchmark\"", "echo\n");
    project.add_exercise("01_basics", "lonely", "mode = \"build\"", "echo\n");
    fs::remove_file(project.root().join("exercises/01_basics/lonely/lonely.sh")).unwrap();

    let err = kata::exercise::ExerciseRegistry::load(&project.config()).unwrap_err();
    match err.downcast_ref::<RegistryError>() {
        Some(RegistryError::Invalid(problems)) => {
            assert_eq!(problems.len(), 2, "{problems:?}");
            assert!(problems.iter().any(|p| p.contains("unknown validation mode")));
            assert!(problems.iter().any(|p| p.contains("missing source file")));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_progress_file_format() {
    let project = Project::new();
    project.add_exercise("01_basics", "hello", "mode = \"build\"", "echo\n");
    project.add_exercise("01_basics", "variables", "mode = \"build\"", "echo\n");

    let mut registry = project.registry();
    registry.mark_completed("hello").unwrap();
    registry.set_current("variables").unwrap();

    let content = fs::read_to_string(project.root().join(".kata/progress.toml")).unwrap();
    assert!(content.contains("current_exercise = \"variables\""), "{content}");
    assert!(content.contains("hello = true"), "{content}");
    assert!(content.contains("last_updated"), "{content}");
}

#[test]
fn test_completion_is_idempotent_across_reloads() {
    let project = Project::new();
    project.add_exercise("01_basics", "hello", "mode = \"build\"", "echo\n");

    let mut registry = project.registry();
    assert!(registry.mark_completed("hello").unwrap());

    let mut reloaded = project.registry();
    assert!(!reloaded.mark_completed("hello").unwrap());
    assert!(reloaded.next_incomplete().is_none());
    assert_eq!(reloaded.stats().percentage, 100.0);
}

#[test]
fn test_hints_escalate_with_attempts() {
    let project = Project::new();
    project.add_exercise("01_basics", "hello", "mode = \"build\"", "echo\n");
    let mut registry = project.registry();

    let mut seen = Vec::new();
    for _ in 0..7 {
        let hello = registry.get_by_name("hello").unwrap();
        seen.push((hello.attempts, hello.hint().to_string()));
        registry.record_attempt("hello", false).unwrap();
    }

    for (attempts, hint) in seen {
        let expected = match Hints::level_for_attempts(attempts) {
            1 => "First hint for hello",
            2 => "Second hint for hello",
            _ => "Third hint for hello",
        };
        assert_eq!(hint, expected, "attempts = {attempts}");
    }
    assert_eq!(registry.get_by_name("hello").unwrap().attempts, 7);
}
