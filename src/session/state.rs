//! Session state machine
//!
//! `Session::update` is the single authority over the current exercise, the
//! active view and the run status. It never blocks: anything slow comes back
//! as an [`Effect`] for the loop to perform, and its outcome returns later as a
//! [`Message`].

use super::message::{Action, Effect, Message};
use crate::exercise::{Exercise, ExerciseRegistry};
use crate::runner::{has_source_extension, ValidationResult};
use crate::watcher::{WatchEvent, WatchEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Welcome,
    Main,
    List,
    Hint,
}

#[derive(Debug)]
pub struct Session {
    registry: ExerciseRegistry,
    source_extension: String,
    current: usize,
    view: View,
    list_cursor: usize,
    /// Exercise with a run in flight; at most one at a time
    running: Option<String>,
    /// An automatic run arrived while busy
    rerun_pending: bool,
    last_result: Option<ValidationResult>,
    status: Option<String>,
    watch_error: Option<String>,
    spinner_frame: usize,
    quit: bool,
}

impl Session {
    pub fn new(registry: ExerciseRegistry, source_extension: impl Into<String>) -> Self {
        let current = registry.resume_position();
        Self {
            registry,
            source_extension: source_extension.into(),
            current,
            view: View::Welcome,
            list_cursor: current,
            running: None,
            rerun_pending: false,
            last_result: None,
            status: None,
            watch_error: None,
            spinner_frame: 0,
            quit: false,
        }
    }

    /// Initial effects: validate the current exercise and start listening
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = self.begin_run();
        effects.push(Effect::AwaitFileEvent);
        effects
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Key(action) => self.handle_action(action),
            Message::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Vec::new()
            }
            Message::RunStarted { exercise } => {
                self.status = Some(format!("Running {exercise}..."));
                self.running = Some(exercise);
                Vec::new()
            }
            Message::RunFinished { exercise, result } => self.finish_run(exercise, result),
            Message::FileChanged(event) => {
                let mut effects = if self.accepts(&event) {
                    tracing::debug!(path = %event.path.display(), "Source changed");
                    self.schedule_auto_run()
                } else {
                    Vec::new()
                };
                effects.push(Effect::AwaitFileEvent);
                effects
            }
            Message::WatchError(error) => {
                tracing::warn!(error = %error, "Watcher error");
                self.watch_error = Some(error);
                Vec::new()
            }
            Message::WatcherClosed => {
                if !self.quit {
                    self.watch_error =
                        Some("file watcher stopped; press r to run manually".to_string());
                }
                Vec::new()
            }
        }
    }

    fn handle_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Quit => {
                self.quit = true;
                vec![Effect::Quit]
            }
            Action::Next | Action::Previous => {
                if self.view != View::Main {
                    return Vec::new();
                }
                let target = match action {
                    Action::Next if self.current + 1 < self.registry.len() => self.current + 1,
                    Action::Next => {
                        self.status = Some("Already at the last exercise".to_string());
                        return Vec::new();
                    }
                    _ if self.current > 0 => self.current - 1,
                    _ => {
                        self.status = Some("Already at the first exercise".to_string());
                        return Vec::new();
                    }
                };
                self.move_to(target)
            }
            Action::ToggleHint => {
                self.view = if self.view == View::Hint {
                    View::Main
                } else {
                    View::Hint
                };
                Vec::new()
            }
            Action::ToggleList => {
                if self.view == View::List {
                    self.view = View::Main;
                } else {
                    self.list_cursor = self.current;
                    self.view = View::List;
                }
                Vec::new()
            }
            Action::Run => {
                if let Some(name) = &self.running {
                    self.status = Some(format!("{name} is still running"));
                    return Vec::new();
                }
                self.begin_run()
            }
            Action::Select => match self.view {
                View::List => {
                    self.view = View::Main;
                    if self.list_cursor != self.current {
                        self.move_to(self.list_cursor)
                    } else {
                        Vec::new()
                    }
                }
                View::Welcome | View::Hint => {
                    self.view = View::Main;
                    Vec::new()
                }
                View::Main => Vec::new(),
            },
            Action::Dismiss => {
                self.view = View::Main;
                Vec::new()
            }
            Action::CursorUp => {
                if self.view == View::List {
                    self.list_cursor = self.list_cursor.saturating_sub(1);
                }
                Vec::new()
            }
            Action::CursorDown => {
                if self.view == View::List && self.list_cursor + 1 < self.registry.len() {
                    self.list_cursor += 1;
                }
                Vec::new()
            }
        }
    }

    fn move_to(&mut self, index: usize) -> Vec<Effect> {
        self.current = index;
        self.list_cursor = index;

        let name = self.current_exercise().name.clone();
        self.status = None;
        if let Err(e) = self.registry.set_current(&name) {
            tracing::warn!(error = %e, "Failed to persist current exercise");
            self.status = Some(format!("Could not save progress: {e:#}"));
        }

        self.schedule_auto_run()
    }

    /// Run now, or remember to run once the in-flight run finishes
    fn schedule_auto_run(&mut self) -> Vec<Effect> {
        if self.running.is_some() {
            self.rerun_pending = true;
            return Vec::new();
        }
        self.begin_run()
    }

    fn begin_run(&mut self) -> Vec<Effect> {
        let exercise = self.current_exercise().clone();
        self.running = Some(exercise.name.clone());
        self.status = Some(format!("Running {}...", exercise.name));
        vec![Effect::Run(exercise)]
    }

    fn finish_run(&mut self, exercise: String, result: ValidationResult) -> Vec<Effect> {
        self.running = None;

        let newly_completed = result.success
            && self
                .registry
                .get_by_name(&exercise)
                .map(|e| !e.completed)
                .unwrap_or(false);

        self.status = Some(match self.registry.record_attempt(&exercise, result.success) {
            Err(e) => {
                tracing::warn!(exercise = %exercise, error = %e, "Failed to record attempt");
                format!("Could not save progress: {e:#}")
            }
            Ok(_) if newly_completed => format!("✓ {exercise} completed! Press n for the next one"),
            Ok(_) if result.success => format!("✓ {exercise} passed"),
            Ok(attempts) => format!("✗ {exercise} failed (attempt {attempts})"),
        });
        self.last_result = Some(result);

        if self.rerun_pending {
            self.rerun_pending = false;
            return self.begin_run();
        }
        Vec::new()
    }

    /// Only a write to the current exercise's source triggers a run
    fn accepts(&self, event: &WatchEvent) -> bool {
        event.kind == WatchEventKind::Write
            && has_source_extension(&event.path, &self.source_extension)
            && event.path == self.current_exercise().source_path
    }

    pub fn registry(&self) -> &ExerciseRegistry {
        &self.registry
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.registry.exercises()[self.current]
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn list_cursor(&self) -> usize {
        self.list_cursor
    }

    pub fn running(&self) -> Option<&str> {
        self.running.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn rerun_pending(&self) -> bool {
        self.rerun_pending
    }

    /// Latest result, only if it belongs to the current exercise
    pub fn last_result(&self) -> Option<&ValidationResult> {
        self.last_result
            .as_ref()
            .filter(|r| r.exercise == self.current_exercise().name)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn watch_error(&self) -> Option<&str> {
        self.watch_error.as_deref()
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}
