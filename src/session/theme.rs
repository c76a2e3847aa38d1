use ratatui::style::{Color, Modifier, Style};

/// Palette for exercise and run states
pub struct StatusColors;

impl StatusColors {
    pub const PASSED: Color = Color::Green;
    pub const FAILED: Color = Color::Red;
    pub const RUNNING: Color = Color::Yellow;
    pub const PENDING: Color = Color::Gray;
    pub const WARNING: Color = Color::LightYellow;
    pub const ACCENT: Color = Color::Cyan;
    pub const BORDER: Color = Color::DarkGray;
}

pub struct Theme;

impl Theme {
    pub fn header() -> Style {
        Style::default()
            .fg(StatusColors::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(StatusColors::BORDER)
    }

    pub fn border() -> Style {
        Style::default().fg(StatusColors::BORDER)
    }

    pub fn passed() -> Style {
        Style::default().fg(StatusColors::PASSED)
    }

    pub fn failed() -> Style {
        Style::default().fg(StatusColors::FAILED)
    }

    pub fn running() -> Style {
        Style::default().fg(StatusColors::RUNNING)
    }

    pub fn pending() -> Style {
        Style::default().fg(StatusColors::PENDING)
    }

    pub fn warning() -> Style {
        Style::default().fg(StatusColors::WARNING)
    }

    pub fn key() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(StatusColors::ACCENT)
            .add_modifier(Modifier::BOLD)
    }
}
