//! Tool registry and dispatch surface.
//!
//! The registry is an immutable static table: built once, passed
//! explicitly, no module-level mutable state. A name missing from the table
//! is a lookup failure, never a default tier.

pub mod bash;
pub mod code;
pub mod files;
pub mod project;
pub mod schemas;
pub mod services;
pub mod vps;

use crate::core::approval::ApprovalTier;
use crate::core::config::AgentConfig;
use crate::core::context::ProjectContext;
use crate::core::error::HermitError;
use schemas::ToolParams;
use serde_json::{Value, json};

/// Everything a handler may touch: the session's project context and the
/// runtime configuration. Handlers are pure functions of (params, context);
/// session recording stays in the dispatcher.
pub struct ExecContext<'a> {
    pub project: ProjectContext,
    pub config: &'a AgentConfig,
}

#[derive(Debug)]
pub struct ToolOutcome {
    pub result: Value,
    /// Set only by the focus-setting tool; the dispatcher turns it into a
    /// `context_change` record.
    pub new_focus: Option<String>,
}

impl ToolOutcome {
    fn result(value: Value) -> Self {
        ToolOutcome {
            result: value,
            new_focus: None,
        }
    }
}

pub struct ToolDescriptor {
    pub name: &'static str,
    pub tier: ApprovalTier,
    pub description: &'static str,
    pub params: &'static [&'static str],
}

pub const REGISTRY: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "project_focus",
        tier: ApprovalTier::Auto,
        description: "Set the current project context. Subsequent relative paths resolve against this project.",
        params: &["path"],
    },
    ToolDescriptor {
        name: "project_list",
        tier: ApprovalTier::Auto,
        description: "List available projects, discovered by common project markers (git, package.json, ...).",
        params: &["base_path"],
    },
    ToolDescriptor {
        name: "project_info",
        tier: ApprovalTier::Auto,
        description: "Detailed project information: file counts, languages, config files.",
        params: &["path"],
    },
    ToolDescriptor {
        name: "file_read",
        tier: ApprovalTier::Auto,
        description: "Read the contents of a file, optionally a 1-indexed line range.",
        params: &["path", "start_line", "end_line"],
    },
    ToolDescriptor {
        name: "file_write",
        tier: ApprovalTier::Confirm,
        description: "Write content to a file, creating parent directories if needed.",
        params: &["path", "content", "create_dirs"],
    },
    ToolDescriptor {
        name: "dir_tree",
        tier: ApprovalTier::Auto,
        description: "Directory structure as a tree, with depth limiting and pattern filtering.",
        params: &["path", "max_depth", "include_hidden", "pattern"],
    },
    ToolDescriptor {
        name: "code_explain",
        tier: ApprovalTier::Auto,
        description: "Gather code context (content, imports, functions, classes) for external analysis.",
        params: &["path", "question"],
    },
    ToolDescriptor {
        name: "code_debug",
        tier: ApprovalTier::Auto,
        description: "Gather debugging context: error text, traceback locations, file content.",
        params: &["path", "error", "context"],
    },
    ToolDescriptor {
        name: "service_list",
        tier: ApprovalTier::Auto,
        description: "List services from systemd, Docker, or pm2.",
        params: &["manager"],
    },
    ToolDescriptor {
        name: "service_status",
        tier: ApprovalTier::Auto,
        description: "Detailed service status; auto-detects the manager when unspecified.",
        params: &["name", "manager"],
    },
    ToolDescriptor {
        name: "service_start",
        tier: ApprovalTier::Confirm,
        description: "Start a stopped service.",
        params: &["name", "manager"],
    },
    ToolDescriptor {
        name: "service_stop",
        tier: ApprovalTier::Explicit,
        description: "Stop a running service. Requires explicit approval.",
        params: &["name", "manager"],
    },
    ToolDescriptor {
        name: "service_restart",
        tier: ApprovalTier::Confirm,
        description: "Restart a service.",
        params: &["name", "manager"],
    },
    ToolDescriptor {
        name: "vps_status",
        tier: ApprovalTier::Auto,
        description: "Host status: hostname, uptime, load, memory, disk, CPU.",
        params: &["include_processes", "include_network"],
    },
    ToolDescriptor {
        name: "bash_run",
        tier: ApprovalTier::Explicit,
        description: "Execute an arbitrary shell command. Escape hatch; requires explicit approval.",
        params: &["command", "timeout", "cwd"],
    },
];

pub fn lookup(name: &str) -> Option<&'static ToolDescriptor> {
    REGISTRY.iter().find(|t| t.name == name)
}

pub fn available_tools() -> Vec<&'static str> {
    REGISTRY.iter().map(|t| t.name).collect()
}

/// The `--list-tools` payload.
pub fn list_tools() -> Value {
    let tools: Vec<Value> = REGISTRY
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "approval_level": t.tier.as_str(),
                "description": t.description,
                "params": t.params,
            })
        })
        .collect();
    json!({ "count": tools.len(), "tools": tools })
}

/// Route validated params to the matching handler.
pub fn invoke(params: &ToolParams, ctx: &ExecContext) -> Result<ToolOutcome, HermitError> {
    match params {
        ToolParams::ProjectFocus(p) => project::focus(p, ctx),
        ToolParams::ProjectList(p) => project::list(p, ctx).map(ToolOutcome::result),
        ToolParams::ProjectInfo(p) => project::info(p, ctx).map(ToolOutcome::result),
        ToolParams::FileRead(p) => files::read(p, ctx).map(ToolOutcome::result),
        ToolParams::FileWrite(p) => files::write(p, ctx).map(ToolOutcome::result),
        ToolParams::DirTree(p) => files::tree(p, ctx).map(ToolOutcome::result),
        ToolParams::CodeExplain(p) => code::explain(p, ctx).map(ToolOutcome::result),
        ToolParams::CodeDebug(p) => code::debug(p, ctx).map(ToolOutcome::result),
        ToolParams::ServiceList(p) => services::list(p, ctx).map(ToolOutcome::result),
        ToolParams::ServiceStatus(p) => services::status(p, ctx).map(ToolOutcome::result),
        ToolParams::ServiceStart(p) => services::control(p, ctx, "start").map(ToolOutcome::result),
        ToolParams::ServiceStop(p) => services::control(p, ctx, "stop").map(ToolOutcome::result),
        ToolParams::ServiceRestart(p) => {
            services::control(p, ctx, "restart").map(ToolOutcome::result)
        }
        ToolParams::VpsStatus(p) => vps::status(p, ctx).map(ToolOutcome::result),
        ToolParams::BashRun(p) => bash::run(p, ctx).map(ToolOutcome::result),
    }
}
