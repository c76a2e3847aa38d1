use crate::exercise::Exercise;
use crate::runner::ValidationResult;
use crate::watcher::WatchEvent;

/// User intent decoded from a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Previous,
    ToggleHint,
    ToggleList,
    Run,
    /// Enter
    Select,
    /// Esc
    Dismiss,
    Quit,
    CursorUp,
    CursorDown,
}

/// Everything the session reacts to, posted to the main loop's channel
#[derive(Debug)]
pub enum Message {
    Key(Action),
    Tick,
    RunStarted { exercise: String },
    RunFinished {
        exercise: String,
        result: ValidationResult,
    },
    FileChanged(WatchEvent),
    WatchError(String),
    /// The event subscription ended; no more file messages will arrive
    WatcherClosed,
}

/// Work the session asks the loop to perform off the main thread
#[derive(Debug)]
pub enum Effect {
    Run(Exercise),
    /// Wait for exactly one more watcher event
    AwaitFileEvent,
    Quit,
}
