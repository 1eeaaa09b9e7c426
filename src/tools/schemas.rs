//! Typed tool parameters.
//!
//! Raw `--params` JSON is parsed into one typed struct per tool before the
//! dispatcher ever sees it: unknown fields are rejected, defaults applied,
//! and range constraints checked. The result is a tagged [`ToolParams`]
//! variant: one shape per tool name, no untyped maps flowing through.

use crate::core::config::BASH_TIMEOUT_CEILING_SECS;
use crate::core::error::HermitError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFocusParams {
    /// Absolute path to the project directory.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectListParams {
    pub base_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfoParams {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileReadParams {
    pub path: String,
    /// 1-indexed, inclusive.
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileWriteParams {
    pub path: String,
    pub content: String,
    #[serde(default = "default_true")]
    pub create_dirs: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirTreeParams {
    pub path: Option<String>,
    #[serde(default = "default_tree_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub include_hidden: bool,
    /// Glob-style name filter applied to files.
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeExplainParams {
    pub path: String,
    pub question: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeDebugParams {
    pub path: Option<String>,
    pub error: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceListParams {
    pub manager: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceTargetParams {
    pub name: String,
    pub manager: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpsStatusParams {
    #[serde(default)]
    pub include_processes: bool,
    #[serde(default)]
    pub include_network: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BashRunParams {
    pub command: String,
    #[serde(default = "default_bash_timeout")]
    pub timeout: u64,
    /// Working directory; falls back to the project focus.
    pub cwd: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_tree_depth() -> usize {
    3
}

fn default_bash_timeout() -> u64 {
    60
}

#[derive(Debug, Clone)]
pub enum ToolParams {
    ProjectFocus(ProjectFocusParams),
    ProjectList(ProjectListParams),
    ProjectInfo(ProjectInfoParams),
    FileRead(FileReadParams),
    FileWrite(FileWriteParams),
    DirTree(DirTreeParams),
    CodeExplain(CodeExplainParams),
    CodeDebug(CodeDebugParams),
    ServiceList(ServiceListParams),
    ServiceStatus(ServiceTargetParams),
    ServiceStart(ServiceTargetParams),
    ServiceStop(ServiceTargetParams),
    ServiceRestart(ServiceTargetParams),
    VpsStatus(VpsStatusParams),
    BashRun(BashRunParams),
}

const SERVICE_MANAGERS: &[&str] = &["systemd", "docker", "pm2"];

/// Parse and validate raw params for a known tool name.
pub fn parse(tool: &str, raw: Value) -> Result<ToolParams, HermitError> {
    let invalid = |e: serde_json::Error| HermitError::Validation(format!("{}: {}", tool, e));
    let params = match tool {
        "project_focus" => {
            let p: ProjectFocusParams = serde_json::from_value(raw).map_err(invalid)?;
            if !p.path.starts_with('/') {
                return Err(HermitError::Validation(
                    "project_focus: path must be absolute (start with /)".to_string(),
                ));
            }
            ToolParams::ProjectFocus(p)
        }
        "project_list" => ToolParams::ProjectList(serde_json::from_value(raw).map_err(invalid)?),
        "project_info" => ToolParams::ProjectInfo(serde_json::from_value(raw).map_err(invalid)?),
        "file_read" => {
            let p: FileReadParams = serde_json::from_value(raw).map_err(invalid)?;
            for (field, value) in [("start_line", p.start_line), ("end_line", p.end_line)] {
                if value == Some(0) {
                    return Err(HermitError::Validation(format!(
                        "file_read: {} is 1-indexed and must be >= 1",
                        field
                    )));
                }
            }
            ToolParams::FileRead(p)
        }
        "file_write" => ToolParams::FileWrite(serde_json::from_value(raw).map_err(invalid)?),
        "dir_tree" => {
            let p: DirTreeParams = serde_json::from_value(raw).map_err(invalid)?;
            if p.max_depth == 0 || p.max_depth > 10 {
                return Err(HermitError::Validation(
                    "dir_tree: max_depth must be between 1 and 10".to_string(),
                ));
            }
            ToolParams::DirTree(p)
        }
        "code_explain" => ToolParams::CodeExplain(serde_json::from_value(raw).map_err(invalid)?),
        "code_debug" => ToolParams::CodeDebug(serde_json::from_value(raw).map_err(invalid)?),
        "service_list" => {
            let p: ServiceListParams = serde_json::from_value(raw).map_err(invalid)?;
            validate_manager(tool, p.manager.as_deref())?;
            ToolParams::ServiceList(p)
        }
        "service_status" | "service_start" | "service_stop" | "service_restart" => {
            let p: ServiceTargetParams = serde_json::from_value(raw).map_err(invalid)?;
            validate_manager(tool, p.manager.as_deref())?;
            match tool {
                "service_status" => ToolParams::ServiceStatus(p),
                "service_start" => ToolParams::ServiceStart(p),
                "service_stop" => ToolParams::ServiceStop(p),
                _ => ToolParams::ServiceRestart(p),
            }
        }
        "vps_status" => ToolParams::VpsStatus(serde_json::from_value(raw).map_err(invalid)?),
        "bash_run" => {
            let p: BashRunParams = serde_json::from_value(raw).map_err(invalid)?;
            if p.timeout == 0 || p.timeout > BASH_TIMEOUT_CEILING_SECS {
                return Err(HermitError::Validation(format!(
                    "bash_run: timeout must be between 1 and {} seconds",
                    BASH_TIMEOUT_CEILING_SECS
                )));
            }
            ToolParams::BashRun(p)
        }
        other => {
            return Err(HermitError::NotFound(format!("Unknown tool: {}", other)));
        }
    };
    Ok(params)
}

fn validate_manager(tool: &str, manager: Option<&str>) -> Result<(), HermitError> {
    match manager {
        None => Ok(()),
        Some(m) if SERVICE_MANAGERS.contains(&m) => Ok(()),
        Some(m) => Err(HermitError::Validation(format!(
            "{}: unknown service manager '{}' (expected one of {})",
            tool,
            m,
            SERVICE_MANAGERS.join(", ")
        ))),
    }
}
