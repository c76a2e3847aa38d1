//! Real filesystem events flowing into the session filter

use kata::session::{Effect, Message, Session};
use kata::watcher::{WatchEventKind, Watcher};
use std::fs;
use std::time::{Duration, Instant};

use crate::common::hello_project;

#[test]
fn test_saving_source_schedules_run() {
    let (project, source) = hello_project();
    let mut session = Session::new(project.registry(), "sh");

    let watcher = Watcher::new().unwrap();
    watcher.add(&project.root().join("exercises")).unwrap();
    let events = watcher.subscribe();

    // Noise in the same directory must not trigger anything
    fs::write(source.with_file_name("notes.txt"), "scratch\n").unwrap();
    fs::write(&source, "echo 'Hello, GoForGo!'\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut scheduled = None;
    while Instant::now() < deadline {
        let Some(event) = events.next_timeout(Duration::from_millis(500)) else {
            continue;
        };
        let from_source = event.path == source && event.kind == WatchEventKind::Write;

        let effects = session.update(Message::FileChanged(event));
        assert!(effects.iter().any(|e| matches!(e, Effect::AwaitFileEvent)));

        let run = effects.into_iter().find_map(|e| match e {
            Effect::Run(exercise) => Some(exercise.name),
            _ => None,
        });
        assert_eq!(run.is_some(), from_source);
        if run.is_some() {
            scheduled = run;
            break;
        }
    }

    assert_eq!(scheduled.as_deref(), Some("hello"));
}

#[test]
fn test_close_ends_subscription() {
    let (project, source) = hello_project();
    let watcher = Watcher::new().unwrap();
    watcher.add(&project.root().join("exercises")).unwrap();
    let events = watcher.subscribe();

    fs::write(&source, "echo changed\n").unwrap();
    watcher.close();

    // Whatever was queued drains, then the stream ends
    let deadline = Instant::now() + Duration::from_secs(5);
    while events.next().is_some() {
        assert!(Instant::now() < deadline);
    }
    assert!(events.next().is_none());
    assert!(watcher.is_closed());
}
