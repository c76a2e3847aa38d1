use crossterm::event::{KeyCode, KeyModifiers};

use super::message::Action;

/// Key bindings shown in the footer, in display order
pub const KEY_HINTS: &[(&str, &str)] = &[
    ("n/p", "next/prev"),
    ("r", "run"),
    ("h", "hint"),
    ("l", "list"),
    ("q", "quit"),
];

pub fn action_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('n') => Some(Action::Next),
        KeyCode::Char('p') => Some(Action::Previous),
        KeyCode::Char('h') => Some(Action::ToggleHint),
        KeyCode::Char('l') => Some(Action::ToggleList),
        KeyCode::Char('r') => Some(Action::Run),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::CursorUp),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::CursorDown),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Esc => Some(Action::Dismiss),
        _ => None,
    }
}
