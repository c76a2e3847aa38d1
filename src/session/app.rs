//! Event loop
//!
//! The main thread owns the [`Session`] and processes one [`Message`] at a
//! time. Background threads post into the same channel:
//! - input reader (crossterm key events)
//! - one "await next file event" thread per re-arm
//! - one runner thread per validation run
//! - watcher error forwarder

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};

use super::keys::action_for_key;
use super::message::{Effect, Message};
use super::state::Session;
use super::tui::Tui;
use crate::exercise::Exercise;
use crate::runner::Runner;
use crate::watcher::Watcher;

/// Redraw cadence when nothing else happens (spinner animation)
const TICK_RATE: Duration = Duration::from_millis(100);

/// Poll timeout for the input thread, bounds how long it outlives the loop
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct App {
    session: Session,
    runner: Arc<Runner>,
    watcher: Arc<Watcher>,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    running: Arc<AtomicBool>,
}

impl App {
    pub fn new(session: Session, runner: Arc<Runner>, watcher: Arc<Watcher>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session,
            runner,
            watcher,
            tx,
            rx,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Run until the learner quits; returns the final session state
    pub fn run(mut self, tui: &mut Tui) -> Result<Session> {
        self.spawn_input_reader();
        self.spawn_error_forwarder();

        let effects = self.session.start();
        let mut quit = self.perform(effects);
        let outcome = self.event_loop(tui, &mut quit);

        self.running.store(false, Ordering::SeqCst);
        self.watcher.close();

        outcome.map(|()| self.session)
    }

    fn event_loop(&mut self, tui: &mut Tui, quit: &mut bool) -> Result<()> {
        tui.draw(&self.session)?;

        while !*quit {
            let message = match self.rx.recv_timeout(TICK_RATE) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => Message::Tick,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let effects = self.session.update(message);
            *quit = self.perform(effects) || self.session.should_quit();
            tui.draw(&self.session)?;
        }

        Ok(())
    }

    /// Start every effect on its own thread; returns true on quit
    fn perform(&self, effects: Vec<Effect>) -> bool {
        let mut quit = false;
        for effect in effects {
            match effect {
                Effect::Run(exercise) => self.spawn_run(exercise),
                Effect::AwaitFileEvent => self.spawn_file_await(),
                Effect::Quit => quit = true,
            }
        }
        quit
    }

    fn spawn_run(&self, exercise: Exercise) {
        let runner = Arc::clone(&self.runner);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let _ = tx.send(Message::RunStarted {
                exercise: exercise.name.clone(),
            });
            let result = runner.run_exercise(&exercise);
            let _ = tx.send(Message::RunFinished {
                exercise: exercise.name,
                result,
            });
        });
    }

    fn spawn_file_await(&self) {
        let events = self.watcher.subscribe();
        let tx = self.tx.clone();

        thread::spawn(move || {
            let message = match events.next() {
                Some(event) => Message::FileChanged(event),
                None => Message::WatcherClosed,
            };
            let _ = tx.send(message);
        });
    }

    fn spawn_input_reader(&self) {
        let tx = self.tx.clone();
        let running = Arc::clone(&self.running);

        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match event::poll(POLL_TIMEOUT) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            if let Some(action) = action_for_key(key.code, key.modifiers) {
                                if tx.send(Message::Key(action)).is_err() {
                                    break;
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to read terminal event");
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to poll terminal events");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_error_forwarder(&self) {
        let errors = self.watcher.errors();
        let tx = self.tx.clone();

        thread::spawn(move || {
            while let Some(error) = errors.next() {
                if tx.send(Message::WatchError(error.to_string())).is_err() {
                    break;
                }
            }
        });
    }
}
