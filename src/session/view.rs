//! Dashboard rendering
//!
//! Layout:
//! - Header with logo, run spinner and overall progress
//! - Body for the active view (welcome, exercise + result, list, hint)
//! - One-line footer with status, watcher warnings and keybinds
//!
//! Everything here is a pure function of [`Session`].

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::keys::KEY_HINTS;
use super::state::{Session, View};
use super::theme::{StatusColors, Theme};
use crate::exercise::Exercise;
use crate::runner::format_duration;

const HEADER_HEIGHT: u16 = 5;

/// Height of the exercise summary panel in the main view
const DETAILS_HEIGHT: u16 = 7;

const PROGRESS_BAR_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], session);

    match session.view() {
        View::Welcome => render_welcome(frame, chunks[1], session),
        View::Main => render_main(frame, chunks[1], session),
        View::List => render_list(frame, chunks[1], session),
        View::Hint => render_hint(frame, chunks[1], session),
    }

    render_footer(frame, chunks[2], session);
}

fn render_header(frame: &mut Frame, area: Rect, session: &Session) {
    let stats = session.registry().stats();
    let pct = stats.percentage / 100.0;

    let mut lines: Vec<Line> = crate::LOGO
        .lines()
        .map(|l| Line::from(Span::styled(l, Theme::header())))
        .collect();

    let indicator = if session.is_running() {
        spinner_char(session.spinner_frame())
    } else {
        ' '
    };

    lines.push(Line::from(vec![
        Span::styled(format!("   {indicator} "), Theme::running()),
        Span::styled(
            format!(
                "{}/{} ({:.0}%)",
                stats.completed, stats.total, stats.percentage
            ),
            Style::default().fg(StatusColors::PASSED),
        ),
        Span::raw(" "),
        Span::styled(progress_bar_compact(pct, PROGRESS_BAR_WIDTH), Theme::passed()),
    ]));

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_welcome(frame: &mut Frame, area: Rect, session: &Session) {
    let exercise = session.current_exercise();
    let block = bordered(" Welcome ");

    let lines = vec![
        Line::from(Span::styled("Welcome to kata!", Theme::header())),
        Line::from(""),
        Line::from("Open the exercise file in your editor. Every time you save it,"),
        Line::from("kata builds and checks it and shows the result here."),
        Line::from(""),
        Line::from(vec![
            Span::raw("Starting with "),
            Span::styled(exercise.name.clone(), Theme::key()),
            Span::raw(format!(" ({})", exercise.title)),
        ]),
        Line::from(Span::styled(
            exercise.source_path.display().to_string(),
            Theme::dimmed(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("Enter", Theme::key()),
            Span::raw(" to begin."),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_main(frame: &mut Frame, area: Rect, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(DETAILS_HEIGHT), Constraint::Min(3)])
        .split(area);

    render_details(frame, chunks[0], session);
    render_result(frame, chunks[1], session);
}

fn render_details(frame: &mut Frame, area: Rect, session: &Session) {
    let exercise = session.current_exercise();
    let position = format!(
        " {} ({}/{}) ",
        exercise.name,
        session.current_index() + 1,
        session.registry().len()
    );

    let (state, state_style) = if exercise.completed {
        ("✓ completed", Theme::passed())
    } else {
        ("○ in progress", Theme::pending())
    };

    let mut lines = vec![
        Line::from(Span::styled(exercise.title.clone(), Theme::header())),
        Line::from(vec![
            Span::styled(state, state_style),
            Span::styled(
                format!(
                    "  │ {}  │ {}  │ mode: {}  │ attempts: {}",
                    exercise.category,
                    difficulty_stars(exercise.difficulty),
                    exercise.validation.mode,
                    exercise.attempts
                ),
                Theme::dimmed(),
            ),
        ]),
        Line::from(Span::styled(
            exercise.source_path.display().to_string(),
            Theme::dimmed(),
        )),
    ];
    if !exercise.summary.is_empty() {
        lines.push(Line::from(exercise.summary.clone()));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(bordered(&position))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_result(frame: &mut Frame, area: Rect, session: &Session) {
    let exercise = session.current_exercise();

    let running_here = session.running() == Some(exercise.name.as_str());
    let (title, lines) = match session.last_result() {
        _ if running_here => (
            " Result ".to_string(),
            vec![Line::from(Span::styled(
                format!("{} Checking {}...", spinner_char(session.spinner_frame()), exercise.name),
                Theme::running(),
            ))],
        ),
        Some(result) => {
            let (label, style) = if result.success {
                ("PASSED", Theme::passed())
            } else {
                ("FAILED", Theme::failed())
            };
            let mut lines = vec![Line::from(vec![
                Span::styled(label, style),
                Span::styled(
                    format!("  in {}", format_duration(result.duration)),
                    Theme::dimmed(),
                ),
            ])];
            lines.push(Line::from(""));
            lines.extend(result.feedback().lines().map(|l| Line::from(l.to_string())));
            (" Result ".to_string(), lines)
        }
        None => (
            " Result ".to_string(),
            vec![Line::from(Span::styled(
                "Not checked yet. Save the file or press r.",
                Theme::dimmed(),
            ))],
        ),
    };

    frame.render_widget(
        Paragraph::new(lines)
            .block(bordered(&title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_list(frame: &mut Frame, area: Rect, session: &Session) {
    let exercises = session.registry().exercises();
    let block = bordered(&format!(" Exercises ({}) ", exercises.len())).title_style(Theme::header());

    // Keep the cursor visible: two border rows plus the header row
    let visible = area.height.saturating_sub(4) as usize;
    let offset = session
        .list_cursor()
        .saturating_sub(visible.saturating_sub(1));

    let header = Row::new(vec!["", "#", "Name", "Category", "Mode"]).style(Theme::header());

    let rows: Vec<Row> = exercises
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, exercise)| {
            let style = if i == session.list_cursor() {
                Theme::selected()
            } else if i == session.current_index() {
                Theme::header()
            } else if exercise.completed {
                Theme::passed()
            } else {
                Theme::pending()
            };

            Row::new(vec![
                completion_icon(exercise).to_string(),
                (i + 1).to_string(),
                exercise.name.clone(),
                exercise.category.clone(),
                exercise.validation.mode.to_string(),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(20),
        Constraint::Length(8),
    ];

    frame.render_widget(Table::new(rows, widths).block(block).header(header), area);
}

fn render_hint(frame: &mut Frame, area: Rect, session: &Session) {
    let exercise = session.current_exercise();
    let title = format!(" Hint (level {}) ", exercise.hint_level());

    let mut lines: Vec<Line> = exercise
        .hint()
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();

    if !exercise.objectives.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Objectives", Theme::header())));
        for objective in &exercise.objectives {
            lines.push(Line::from(format!("  • {objective}")));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "More detailed hints unlock as your attempts add up.",
        Theme::dimmed(),
    )));

    frame.render_widget(
        Paragraph::new(lines)
            .block(bordered(&title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, session: &Session) {
    let mut spans = Vec::new();

    if let Some(error) = session.watch_error() {
        spans.push(Span::styled(format!("⚠ watcher: {error}"), Theme::warning()));
        spans.push(Span::raw(" │ "));
    }

    if let Some(status) = session.status() {
        let style = if status.starts_with('✓') {
            Theme::passed()
        } else if status.starts_with('✗') {
            Theme::failed()
        } else {
            Style::default()
        };
        spans.push(Span::styled(status.to_string(), style));
        spans.push(Span::raw(" │ "));
    }

    for (i, (key, label)) in KEY_HINTS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(*key, Theme::key()));
        spans.push(Span::raw(format!(" {label}")));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn bordered(title: &str) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Theme::border())
}

fn completion_icon(exercise: &Exercise) -> &'static str {
    if exercise.completed {
        "✓"
    } else {
        "○"
    }
}

fn difficulty_stars(difficulty: u8) -> String {
    let filled = difficulty.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn spinner_char(frame: usize) -> char {
    const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
    SPINNER[frame % SPINNER.len()]
}

/// Create a compact progress bar string
fn progress_bar_compact(pct: f64, width: usize) -> String {
    let filled = ((pct * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}
