//! Validation runner
//!
//! Turns an exercise's current source into a [`ValidationResult`] by driving
//! the configured toolchain:
//!
//! 1. bootstrap (artifact dir, scaffold file, required files)
//! 2. build
//! 3. mode check (`build` / `test` / `run` / `static`)
//! 4. scaffold marker scan
//!
//! Every external command runs through `sh -c` in the exercise directory and
//! is bounded by the exercise timeout.

mod pipeline;
mod process;
mod result;
mod scaffold;
mod toolchain;

pub use pipeline::Runner;
pub use process::{run_command, CommandOutput};
pub use result::{format_duration, Phase, PhaseResult, TodoMarker, ValidationResult};
pub use scaffold::{scan_file, scan_for_markers, SCAFFOLD_MARKER};
pub use toolchain::{has_source_extension, CommandContext, Scaffold, Toolchain};
