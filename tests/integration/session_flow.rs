//! The edit -> revalidate loop without a terminal: effects are performed inline

use kata::exercise::Exercise;
use kata::runner::Runner;
use kata::session::{Action, Effect, Message, Session, View};
use kata::watcher::{WatchEvent, WatchEventKind};
use std::fs;

use crate::common::{hello_project, Project};

/// Perform run effects synchronously and feed the results back
fn drive(session: &mut Session, runner: &Runner, effects: Vec<Effect>) -> usize {
    let mut pending = effects;
    let mut runs = 0;

    while let Some(effect) = pending.pop() {
        if let Effect::Run(exercise) = effect {
            runs += 1;
            pending.extend(run(session, runner, exercise));
        }
    }
    runs
}

fn run(session: &mut Session, runner: &Runner, exercise: Exercise) -> Vec<Effect> {
    session.update(Message::RunStarted {
        exercise: exercise.name.clone(),
    });
    let result = runner.run_exercise(&exercise);
    session.update(Message::RunFinished {
        exercise: exercise.name,
        result,
    })
}

fn saved(path: std::path::PathBuf) -> Message {
    Message::FileChanged(WatchEvent {
        path,
        kind: WatchEventKind::Write,
    })
}

#[test]
fn test_edit_fix_loop_completes_exercise() {
    let (project, source) = hello_project();
    let runner = project.runner();
    let mut session = Session::new(project.registry(), "sh");

    let effects = session.start();
    assert_eq!(drive(&mut session, &runner, effects), 1);
    session.update(Message::Key(Action::Select));
    assert_eq!(session.view(), View::Main);

    let first = session.last_result().unwrap();
    assert!(!first.success);
    assert!(first.feedback().contains("Hello, World!"));
    assert!(!session.current_exercise().completed);

    fs::write(&source, "echo 'Hello, GoForGo!'\n").unwrap();
    let effects = session.update(saved(source.clone()));
    assert!(effects.iter().any(|e| matches!(e, Effect::AwaitFileEvent)));
    assert_eq!(drive(&mut session, &runner, effects), 1);

    assert!(session.last_result().unwrap().success);
    let hello = session.current_exercise();
    assert!(hello.completed);
    assert_eq!(hello.attempts, 2);

    // Persisted for the next session
    assert!(project.registry().get_by_name("hello").unwrap().completed);
}

#[test]
fn test_navigation_revalidates_next_exercise() {
    let project = Project::new();
    project.add_exercise("01_basics", "alpha", "mode = \"build\"", "echo a\n");
    project.add_exercise("01_basics", "beta", "mode = \"build\"", "if true; then\n");
    let runner = project.runner();
    let mut session = Session::new(project.registry(), "sh");

    let effects = session.start();
    drive(&mut session, &runner, effects);
    session.update(Message::Key(Action::Dismiss));
    assert!(session.current_exercise().completed);

    let effects = session.update(Message::Key(Action::Next));
    assert_eq!(drive(&mut session, &runner, effects), 1);
    assert_eq!(session.current_exercise().name, "beta");

    let result = session.last_result().unwrap();
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Build failed"));
    assert_eq!(session.registry().stats().completed, 1);
}

#[test]
fn test_resume_from_persisted_pointer() {
    let project = Project::new();
    project.add_exercise("01_basics", "alpha", "mode = \"build\"", "echo a\n");
    project.add_exercise("01_basics", "beta", "mode = \"build\"", "echo b\n");

    {
        let mut session = Session::new(project.registry(), "sh");
        session.update(Message::Key(Action::Dismiss));
        session.update(Message::Key(Action::Next));
    }

    let session = Session::new(project.registry(), "sh");
    assert_eq!(session.current_exercise().name, "beta");
}
