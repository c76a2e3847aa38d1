use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// Result of one toolchain command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub command: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration: Duration,
}

impl CommandOutput {
    /// stdout followed by stderr, the way a terminal would interleave them
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let mut out = self.stdout.clone();
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&self.stderr);
                out
            }
        }
    }

    pub fn summary(&self) -> String {
        let status = if self.timed_out {
            "TIMED OUT"
        } else if self.success {
            "PASSED"
        } else {
            "FAILED"
        };
        format!(
            "{} - {} ({}ms, exit code: {:?})",
            status,
            self.command,
            self.duration.as_millis(),
            self.exit_code
        )
    }
}

/// Run a shell command in `dir`, killing its whole process group after `timeout`
///
/// The child gets its own process group so that anything it spawns (a compiled
/// binary, a test harness) dies with it. Output captured before the deadline
/// is kept.
pub fn run_command(command: &str, dir: &Path, timeout: Duration) -> Result<CommandOutput> {
    let start = Instant::now();

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .spawn()
        .with_context(|| format!("Failed to spawn command: {command}"))?;

    tracing::debug!(command, dir = %dir.display(), pid = child.id(), "Spawned command");

    // Pipes are drained on their own threads so a chatty child can't block on
    // a full pipe while we wait on it.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let (exit_code, timed_out) = match child
        .wait_timeout(timeout)
        .with_context(|| format!("Failed to wait for command: {command}"))?
    {
        Some(status) => {
            // Background jobs may still hold the output pipes open
            reap_group(&child);
            (status.code(), false)
        }
        None => {
            kill_group(&mut child);
            let status = child.wait().ok();
            (status.and_then(|s| s.code()), true)
        }
    };

    let stdout = join_reader(stdout);
    let stderr = join_reader(stderr);
    let duration = start.elapsed();

    if timed_out {
        tracing::warn!(command, ?timeout, "Command timed out");
    }

    Ok(CommandOutput {
        command: command.to_string(),
        success: !timed_out && exit_code == Some(0),
        stdout,
        stderr,
        exit_code,
        timed_out,
        duration,
    })
}

fn kill_group(child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        tracing::debug!(error = %e, "killpg failed, killing child directly");
        let _ = child.kill();
    }
}

/// Kill whatever is left of the group after its leader exited
fn reap_group(child: &Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) => tracing::debug!(pgid = child.id(), "Killed leftover background processes"),
        Err(Errno::ESRCH) => {}
        Err(e) => tracing::debug!(error = %e, "killpg on finished group failed"),
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_successful_command() {
        let temp_dir = TempDir::new().unwrap();
        let output = run_command("echo hello", temp_dir.path(), Duration::from_secs(5)).unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "hello");
        assert!(!output.timed_out);
        assert!(output.summary().starts_with("PASSED"));
    }

    #[test]
    fn test_failing_command_keeps_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let output = run_command(
            "echo out; echo err >&2; exit 3",
            temp_dir.path(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[test]
    fn test_runs_in_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "found").unwrap();

        let output =
            run_command("cat marker.txt", temp_dir.path(), Duration::from_secs(5)).unwrap();
        assert_eq!(output.stdout, "found");
    }

    #[test]
    fn test_timeout_kills_process_group() {
        let temp_dir = TempDir::new().unwrap();
        let start = Instant::now();

        // The background sleep holds the stdout pipe open; only a group kill
        // lets the reader threads finish.
        let output = run_command(
            "echo started; sleep 5 & sleep 5",
            temp_dir.path(),
            Duration::from_millis(200),
        )
        .unwrap();

        assert!(output.timed_out);
        assert!(!output.success);
        assert!(output.stdout.contains("started"));
        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(output.summary().starts_with("TIMED OUT"));
    }

    #[test]
    fn test_background_job_does_not_outlive_command() {
        let temp_dir = TempDir::new().unwrap();
        let start = Instant::now();

        let output = run_command(
            "echo hi; sleep 4 &",
            temp_dir.path(),
            Duration::from_millis(200),
        )
        .unwrap();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!output.timed_out);
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hi");
    }
}
