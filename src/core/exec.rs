//! Bounded-timeout external command execution.
//!
//! The only blocking operations in the system are synchronous I/O, and the
//! only cancellation is the deadline enforced here: a child that outlives
//! its wall-clock deadline is killed and reported as `timed_out`, never as a
//! process-fatal error. Output pipes are drained on reader threads so a
//! chatty child cannot deadlock against a full pipe buffer while we poll.

use crate::core::error::HermitError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration_secs: f64,
}

/// Run a shell command line via `sh -c`.
pub fn run_shell(
    command: &str,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ExecResult, HermitError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    run(cmd, timeout)
}

/// Run a program with an argv, no shell involved.
pub fn run_argv(argv: &[&str], timeout: Duration) -> Result<ExecResult, HermitError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| HermitError::Validation("empty command".to_string()))?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    run(cmd, timeout)
}

fn run(mut cmd: Command, timeout: Duration) -> Result<ExecResult, HermitError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let started = Instant::now();
    let mut child = cmd.spawn()?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if started.elapsed() >= timeout {
            timed_out = true;
            // Best-effort kill; the child may have exited in between.
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        std::thread::sleep(Duration::from_millis(25));
    };

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(ExecResult {
        exit_code: status.and_then(|s| s.code()).unwrap_or(-1),
        stdout,
        stderr,
        timed_out,
        duration_secs: (started.elapsed().as_millis() as f64) / 1000.0,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<std::thread::JoinHandle<Vec<u8>>> {
    source.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).to_string())
        .unwrap_or_default()
}

/// Bound captured output, marking the cut.
pub fn truncate_output(output: &str, max_bytes: usize) -> (String, bool) {
    if output.len() <= max_bytes {
        return (output.to_string(), false);
    }
    let mut end = max_bytes;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    (format!("{}\n... (output truncated)", &output[..end]), true)
}

/// Locate a binary on `$PATH` without spawning anything.
pub fn which(bin: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(bin);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
