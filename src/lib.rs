//! kata - watch-mode exercise trainer
//!
//! Watches an exercise tree, re-validates the exercise the learner is editing
//! and drives a terminal dashboard with pass/fail state, hints and navigation.

pub mod checks;
pub mod commands;
pub mod config;
pub mod exercise;
pub mod logging;
pub mod runner;
pub mod session;
pub mod watcher;

/// Banner shown in the dashboard header
pub const LOGO: &str = r#" _         _
| | ____ _| |_ __ _
| |/ / _` | __/ _` |
|   < (_| | || (_| |"#;
