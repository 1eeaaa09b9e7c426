//! Hermit: a headless tool executor for remote LLM clients.
//!
//! **Hermit is daemonless.** It never runs in the background; a remote chat
//! client invokes it once per request over an external secure channel and
//! reads back exactly one JSON envelope. Continuity across invocations
//! comes from durable session logs, not from process state.
//!
//! # Core principles
//!
//! - **Headless**: no prompts, no TTY interaction; every answer is
//!   structured JSON with a `success` flag.
//! - **Session-aware**: an append-only JSONL log per session carries the
//!   project focus and the full audit trail across invocations.
//! - **Approval-gated**: every tool has exactly one tier (auto / confirm /
//!   explicit); explicit-tier tools refuse to run without `--auto-approve`.
//! - **Deterministic**: same tool, same params, same filesystem state →
//!   structurally identical results, whatever session runs them.
//!
//! # Usage
//!
//! ```bash
//! # List available tools
//! hermit --list-tools
//!
//! # Read a file
//! hermit --tool file_read --params '{"path": "/etc/hostname"}'
//!
//! # Set project focus, then work with relative paths
//! hermit --tool project_focus --params '{"path": "/root/myproject"}'
//! hermit --continue --tool file_read --params '{"path": "src/main.rs"}'
//!
//! # Explicit-tier tools need the approval flag
//! hermit --auto-approve --tool bash_run --params '{"command": "ls -la"}'
//! ```
//!
//! # Crate structure
//!
//! - [`core`]: session store, context resolver, approval gate, dispatcher
//! - [`tools`]: the tool registry and the individual tool implementations

pub mod cli;
pub mod core;
pub mod tools;

use crate::cli::Cli;
use crate::core::config::AgentConfig;
use crate::core::dispatch::{self, InvocationRequest};
use crate::core::error::HermitError;
use crate::core::response::{ContextInfo, ToolResponse};
use crate::core::session::{Continuation, SessionStore};
use clap::Parser;
use serde_json::{Value, json};

/// Run one invocation: print a JSON envelope, return the process exit code.
///
/// The exit code is 0 iff the envelope says `success: true`; callers are
/// expected to branch on the `success` field for anything finer-grained.
pub fn run() -> i32 {
    let cli = Cli::parse();
    let response = match execute(cli) {
        Ok(response) => response,
        // Anything that escapes the dispatcher (storage failures, bad
        // arguments, unreadable config) still comes back as an envelope.
        Err(err) => ToolResponse::error(
            "none",
            "agent",
            "none",
            err.kind(),
            &err.to_string(),
            json!({}),
            ContextInfo::default(),
        ),
    };

    println!("{}", response.to_json());
    if response.success { 0 } else { 1 }
}

fn execute(cli: Cli) -> Result<ToolResponse, HermitError> {
    if cli.list_tools {
        return Ok(ToolResponse::success(
            "none",
            "list_tools",
            "none",
            tools::list_tools(),
            ContextInfo::default(),
            false,
        ));
    }

    if cli.list_sessions {
        let cfg = AgentConfig::load()?;
        let store = SessionStore::new(&cfg);
        let sessions = store.list_sessions()?;
        return Ok(ToolResponse::success(
            "none",
            "list_sessions",
            "none",
            json!({ "count": sessions.len(), "sessions": sessions }),
            ContextInfo::default(),
            false,
        ));
    }

    let Some(tool) = cli.tool else {
        return Err(HermitError::Validation(
            "--tool is required. Use --list-tools to see available tools.".to_string(),
        ));
    };

    let params: Value = serde_json::from_str(&cli.params)
        .map_err(|e| HermitError::Validation(format!("Invalid JSON in --params: {}", e)))?;
    if !params.is_object() {
        return Err(HermitError::Validation(
            "--params must be a JSON object".to_string(),
        ));
    }

    let continuation = match (cli.resume, cli.continue_session) {
        (Some(id), _) => Continuation::Resume(id),
        (None, true) => Continuation::Continue,
        (None, false) => Continuation::New,
    };

    let cfg = AgentConfig::load()?;
    let store = SessionStore::new(&cfg);
    let request = InvocationRequest {
        tool,
        params,
        continuation,
        auto_approve: cli.auto_approve,
        dry_run: cli.dry_run,
    };

    dispatch::dispatch(&store, &cfg, &request)
}
