//! Filesystem watcher
//!
//! Wraps `notify` into two bounded queues: normalized [`WatchEvent`]s and
//! backend errors. A single delivery thread owns the translation from raw
//! `notify` events; consumers only ever see [`WatchEventKind`].
//!
//! When a queue is full the newest event is dropped with a warning. A learner
//! saving a file produces bursts of near-identical events and only the next
//! one matters, so stalling delivery would be worse than losing some.

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const EVENT_QUEUE_CAPACITY: usize = 256;
pub const ERROR_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Write,
    Create,
    Remove,
    Rename,
    Attribute,
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WatchEventKind::Write => "write",
            WatchEventKind::Create => "create",
            WatchEventKind::Remove => "remove",
            WatchEventKind::Rename => "rename",
            WatchEventKind::Attribute => "attribute",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    /// Normalize a raw notification; one event per affected path
    ///
    /// Access notifications and kinds the backend couldn't classify yield
    /// nothing.
    pub fn from_notify(event: &notify::Event) -> Vec<WatchEvent> {
        let Some(kind) = classify(&event.kind) else {
            return Vec::new();
        };

        event
            .paths
            .iter()
            .map(|path| WatchEvent {
                path: path.clone(),
                kind,
            })
            .collect()
    }
}

fn classify(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Create),
        EventKind::Remove(_) => Some(WatchEventKind::Remove),
        EventKind::Modify(ModifyKind::Name(_)) => Some(WatchEventKind::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(WatchEventKind::Attribute),
        EventKind::Modify(_) => Some(WatchEventKind::Write),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot watch {}: {source}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("watch backend error: {0}")]
    Backend(#[from] notify::Error),
    #[error("watcher is closed")]
    Closed,
    #[error("failed to start watcher thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Consumer handle on one of the watcher's queues
///
/// Clones share the same queue: each item is delivered to exactly one
/// caller.
pub struct Subscription<T> {
    rx: Arc<Mutex<Receiver<T>>>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl<T> Subscription<T> {
    fn new(rx: Receiver<T>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Receiver<T>> {
        self.rx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for exactly one item; `None` once the watcher is closed and the
    /// queue is drained
    pub fn next(&self) -> Option<T> {
        self.lock().recv().ok()
    }

    /// Like [`next`](Self::next) but gives up after `timeout`
    pub fn next_timeout(&self, timeout: Duration) -> Option<T> {
        match self.lock().recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_next(&self) -> Option<T> {
        self.lock().try_recv().ok()
    }
}

enum Raw {
    Notify(notify::Result<notify::Event>),
    Shutdown,
}

/// Recursive filesystem watcher with bounded event and error queues
pub struct Watcher {
    backend: Mutex<Option<RecommendedWatcher>>,
    raw_tx: Sender<Raw>,
    delivery: Mutex<Option<JoinHandle<()>>>,
    events: Subscription<WatchEvent>,
    errors: Subscription<WatchError>,
    watched: Mutex<BTreeSet<PathBuf>>,
    closed: AtomicBool,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("watched", &self.watched())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Watcher {
    pub fn new() -> Result<Self, WatchError> {
        let (raw_tx, raw_rx) = mpsc::channel::<Raw>();
        let (event_tx, event_rx) = mpsc::sync_channel(EVENT_QUEUE_CAPACITY);
        let (error_tx, error_rx) = mpsc::sync_channel(ERROR_QUEUE_CAPACITY);

        let callback_tx = raw_tx.clone();
        let backend = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            // Receiver gone means we're shutting down
            let _ = callback_tx.send(Raw::Notify(res));
        })?;

        let delivery = thread::Builder::new()
            .name("kata-watcher".to_string())
            .spawn(move || deliver(raw_rx, event_tx, error_tx))
            .map_err(WatchError::Thread)?;

        Ok(Self {
            backend: Mutex::new(Some(backend)),
            raw_tx,
            delivery: Mutex::new(Some(delivery)),
            events: Subscription::new(event_rx),
            errors: Subscription::new(error_rx),
            watched: Mutex::new(BTreeSet::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Watch a subtree recursively
    pub fn add(&self, path: &Path) -> Result<PathBuf, WatchError> {
        let canonical = path.canonicalize().map_err(|source| WatchError::Path {
            path: path.to_path_buf(),
            source,
        })?;

        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        let backend = backend.as_mut().ok_or(WatchError::Closed)?;
        backend.watch(&canonical, RecursiveMode::Recursive)?;

        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonical.clone());

        tracing::info!(path = %canonical.display(), "Watching");
        Ok(canonical)
    }

    /// Stop watching a subtree previously passed to [`add`](Self::add)
    pub fn remove(&self, path: &Path) -> Result<(), WatchError> {
        // The directory may already be gone, so try the literal path first
        let known = self
            .watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path);
        let key = if known {
            path.to_path_buf()
        } else {
            path.canonicalize().map_err(|source| WatchError::Path {
                path: path.to_path_buf(),
                source,
            })?
        };

        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        let backend = backend.as_mut().ok_or(WatchError::Closed)?;
        backend.unwatch(&key)?;
        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);

        tracing::info!(path = %key.display(), "Stopped watching");
        Ok(())
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> Subscription<WatchEvent> {
        self.events.clone()
    }

    pub fn errors(&self) -> Subscription<WatchError> {
        self.errors.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop delivery and release the OS watcher; safe to call more than once
    ///
    /// Subscribers drain what was already queued and then get `None`.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.raw_tx.send(Raw::Shutdown);
        self.backend
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let handle = self
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("Watcher delivery thread panicked");
            }
        }

        tracing::info!("Watcher closed");
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn deliver(raw_rx: Receiver<Raw>, events: SyncSender<WatchEvent>, errors: SyncSender<WatchError>) {
    for raw in raw_rx {
        match raw {
            Raw::Shutdown => break,
            Raw::Notify(Ok(event)) => {
                for watch_event in WatchEvent::from_notify(&event) {
                    match events.try_send(watch_event) {
                        Ok(()) => {}
                        Err(TrySendError::Full(dropped)) => tracing::warn!(
                            path = %dropped.path.display(),
                            kind = %dropped.kind,
                            "Event queue full, dropping event"
                        ),
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                }
            }
            Raw::Notify(Err(e)) => match errors.try_send(WatchError::Backend(e)) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    tracing::warn!(error = %dropped, "Error queue full, dropping error")
                }
                Err(TrySendError::Disconnected(_)) => return,
            },
        }
    }
}
