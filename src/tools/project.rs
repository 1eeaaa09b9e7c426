//! Project tools: `project_focus`, `project_list`, `project_info`.

use crate::core::context;
use crate::core::error::HermitError;
use crate::tools::schemas::{ProjectFocusParams, ProjectInfoParams, ProjectListParams};
use crate::tools::{ExecContext, ToolOutcome};
use serde_json::{Value, json};
use std::path::Path;

/// Set the project focus for subsequent tool calls. The dispatcher records
/// the resulting `context_change` in the session log.
pub fn focus(p: &ProjectFocusParams, ctx: &ExecContext) -> Result<ToolOutcome, HermitError> {
    let mut project = ctx.project.clone();
    project.set_focus(&p.path)?;

    let info = context::project_info(Path::new(&p.path))?;
    Ok(ToolOutcome {
        result: json!({
            "focused": true,
            "path": p.path,
            "project": info,
        }),
        new_focus: Some(p.path.clone()),
    })
}

pub fn list(p: &ProjectListParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let base = p
        .base_path
        .as_ref()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| ctx.config.projects_dir.clone());
    let projects = context::discover_projects(&base)?;

    Ok(json!({
        "base_path": base.display().to_string(),
        "count": projects.len(),
        "projects": projects,
    }))
}

pub fn info(p: &ProjectInfoParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let path = match (&p.path, ctx.project.focus()) {
        (Some(path), _) => std::path::PathBuf::from(path),
        (None, Some(focus)) => focus.to_path_buf(),
        (None, None) => {
            return Err(HermitError::Validation(
                "No project path specified and no project focus set. \
                 Use project_focus first or provide a path."
                    .to_string(),
            ));
        }
    };
    context::project_info(&path)
}
