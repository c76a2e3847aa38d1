//! Integration tests for the kata validation loop
//!
//! Fixtures use a POSIX `sh` toolchain (`sh -n` as the build step) so the
//! scenarios run anywhere without a compiler installed.

mod common;
mod registry;
mod runner_scenarios;
mod session_flow;
mod watcher;
