//! CLI surface. Flags only; each process run is one request.

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "hermit",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hermit is the daemonless, headless tool executor that remote LLM clients call on demand to run session-aware, approval-gated actions on a VPS. 🦀",
    after_help = "Examples:\n  \
        hermit --list-tools\n  \
        hermit --tool file_read --params '{\"path\": \"/etc/hostname\"}'\n  \
        hermit --tool project_focus --params '{\"path\": \"/root/myproject\"}'\n  \
        hermit --continue --tool dir_tree\n  \
        hermit --resume sess_ab12cd34 --tool file_read --params '{\"path\": \"main.py\"}'\n  \
        hermit --auto-approve --tool bash_run --params '{\"command\": \"ls -la\"}'\n  \
        hermit --dry-run --tool file_write --params '{\"path\": \"t.txt\", \"content\": \"hi\"}'"
)]
pub struct Cli {
    /// Tool name to execute.
    #[clap(long)]
    pub tool: Option<String>,

    /// JSON parameters for the tool.
    #[clap(long, default_value = "{}")]
    pub params: String,

    /// Continue the most recent session.
    #[clap(long = "continue")]
    pub continue_session: bool,

    /// Resume a specific session by ID.
    #[clap(long, value_name = "SESSION_ID", conflicts_with = "continue_session")]
    pub resume: Option<String>,

    /// Override approval checks for explicit-tier tools.
    #[clap(long)]
    pub auto_approve: bool,

    /// Preview the action without executing it.
    #[clap(long)]
    pub dry_run: bool,

    /// List all available tools and exit.
    #[clap(long)]
    pub list_tools: bool,

    /// List all sessions and exit.
    #[clap(long)]
    pub list_sessions: bool,
}
