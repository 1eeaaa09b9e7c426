//! `bash_run`: the escape hatch for arbitrary shell commands.
//!
//! Explicit-tier. Runs under `sh -c` in the requested cwd (falling back to
//! the project focus), with a bounded wall-clock deadline. A blown deadline
//! is a reportable result (`timed_out: true`), not an error.

use crate::core::error::HermitError;
use crate::core::exec;
use crate::tools::ExecContext;
use crate::tools::schemas::BashRunParams;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;

pub fn run(p: &BashRunParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let cwd: Option<PathBuf> = match &p.cwd {
        Some(dir) => Some(PathBuf::from(dir)),
        None => ctx.project.focus().map(|f| f.to_path_buf()),
    };

    let mut result = exec::run_shell(&p.command, cwd.as_deref(), Duration::from_secs(p.timeout))?;
    if result.timed_out {
        result.stderr = format!(
            "{}\nCommand timed out after {} seconds",
            result.stderr, p.timeout
        );
    }

    let (stdout, stdout_truncated) =
        exec::truncate_output(&result.stdout, ctx.config.bash_max_output_bytes);
    let (stderr, stderr_truncated) =
        exec::truncate_output(&result.stderr, ctx.config.bash_max_output_bytes);

    Ok(json!({
        "command": p.command,
        "exit_code": result.exit_code,
        "stdout": stdout,
        "stderr": stderr,
        "timed_out": result.timed_out,
        "duration_seconds": result.duration_secs,
        "cwd": cwd.map(|d| d.display().to_string()),
        "stdout_truncated": stdout_truncated,
        "stderr_truncated": stderr_truncated,
    }))
}
