//! The dispatch engine.
//!
//! One invocation flows through: session resolve → registry lookup → param
//! validation → approval gate → (dry run) → handler → audit append →
//! response. Every path terminates in exactly one structured response.
//!
//! Short-circuit rules: an unknown tool or an approval denial leaves no
//! `tool_call` record; in side effects it is as if the invocation never
//! happened. Validation and handler failures ARE recorded; the attempt and
//! its failure are both part of the audit trail. Only storage failures
//! escape as `Err`: a lost append must never be silent.

use crate::core::approval;
use crate::core::config::AgentConfig;
use crate::core::context::ProjectContext;
use crate::core::error::HermitError;
use crate::core::response::{ContextInfo, ToolResponse};
use crate::core::session::{Continuation, Session, SessionEntry, SessionStore};
use crate::tools::{self, ExecContext, schemas};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub tool: String,
    pub params: Value,
    pub continuation: Continuation,
    pub auto_approve: bool,
    pub dry_run: bool,
}

fn snapshot(session: &Session) -> ContextInfo {
    ContextInfo {
        project: session.project_focus(),
        session_id: Some(session.id.clone()),
    }
}

fn error_payload(err: &HermitError) -> Value {
    json!({ "type": err.kind(), "message": err.to_string() })
}

pub fn dispatch(
    store: &SessionStore,
    cfg: &AgentConfig,
    req: &InvocationRequest,
) -> Result<ToolResponse, HermitError> {
    let mut session = store.load_or_create(&req.continuation)?;

    let Some(descriptor) = tools::lookup(&req.tool) else {
        return Ok(ToolResponse::error(
            &session.id,
            &req.tool,
            "none",
            "NotFoundError",
            &format!("Unknown tool: {}", req.tool),
            json!({ "available_tools": tools::available_tools() }),
            snapshot(&session),
        ));
    };
    let tier = descriptor.tier;

    let params = match schemas::parse(&req.tool, req.params.clone()) {
        Ok(params) => params,
        Err(err) => {
            let focus = session.project_focus();
            store.append(
                &mut session,
                SessionEntry::tool_call(
                    &req.tool,
                    req.params.clone(),
                    None,
                    Some(error_payload(&err)),
                    focus.as_deref(),
                ),
            )?;
            return Ok(ToolResponse::error(
                &session.id,
                &req.tool,
                tier.as_str(),
                err.kind(),
                &err.to_string(),
                json!({}),
                snapshot(&session),
            ));
        }
    };

    if let Err(err) = approval::check(&req.tool, tier, req.auto_approve) {
        return Ok(ToolResponse::error(
            &session.id,
            &req.tool,
            tier.as_str(),
            err.kind(),
            &err.to_string(),
            json!({}),
            snapshot(&session),
        ));
    }

    if req.dry_run {
        return Ok(ToolResponse::success(
            &session.id,
            &req.tool,
            tier.as_str(),
            json!({
                "dry_run": true,
                "would_execute": req.tool,
                "params": req.params,
                "approval_level": tier.as_str(),
            }),
            snapshot(&session),
            true,
        ));
    }

    let focus_at_execution = session.project_focus();
    let exec_ctx = ExecContext {
        project: ProjectContext::new(focus_at_execution.as_deref()),
        config: cfg,
    };

    match tools::invoke(&params, &exec_ctx) {
        Ok(outcome) => {
            store.append(
                &mut session,
                SessionEntry::tool_call(
                    &req.tool,
                    req.params.clone(),
                    Some(outcome.result.clone()),
                    None,
                    focus_at_execution.as_deref(),
                ),
            )?;
            if let Some(new_focus) = &outcome.new_focus {
                store.append(&mut session, SessionEntry::context_change(Some(new_focus)))?;
            }
            Ok(ToolResponse::success(
                &session.id,
                &req.tool,
                tier.as_str(),
                outcome.result,
                snapshot(&session),
                false,
            ))
        }
        Err(err) => {
            store.append(
                &mut session,
                SessionEntry::tool_call(
                    &req.tool,
                    req.params.clone(),
                    None,
                    Some(error_payload(&err)),
                    focus_at_execution.as_deref(),
                ),
            )?;
            Ok(ToolResponse::error(
                &session.id,
                &req.tool,
                tier.as_str(),
                err.kind(),
                &err.to_string(),
                json!({}),
                snapshot(&session),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::EntryKind;
    use std::path::Path;

    fn setup(home: &Path) -> (SessionStore, AgentConfig) {
        let cfg = AgentConfig::with_home(home.to_path_buf());
        let store = SessionStore::new(&cfg);
        (store, cfg)
    }

    fn request(tool: &str, params: Value) -> InvocationRequest {
        InvocationRequest {
            tool: tool.to_string(),
            params,
            continuation: Continuation::New,
            auto_approve: false,
            dry_run: false,
        }
    }

    fn log_kinds(home: &Path, session_id: &str) -> Vec<EntryKind> {
        let path = home.join("sessions").join(format!("{}.jsonl", session_id));
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| {
                serde_json::from_str::<crate::core::session::SessionEntry>(l)
                    .unwrap()
                    .kind
            })
            .collect()
    }

    #[test]
    fn test_unknown_tool_short_circuits_without_audit() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let resp = dispatch(&store, &cfg, &request("frobnicate", json!({}))).unwrap();

        assert!(!resp.success);
        let err = resp.error.unwrap();
        assert_eq!(err.kind, "NotFoundError");
        assert!(err.details["available_tools"].as_array().unwrap().len() > 1);
        assert_eq!(log_kinds(tmp.path(), &resp.session_id), vec![EntryKind::SessionStart]);
    }

    #[test]
    fn test_explicit_denial_leaves_no_tool_call() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let resp = dispatch(&store, &cfg, &request("bash_run", json!({"command": "ls"}))).unwrap();

        assert!(!resp.success);
        assert_eq!(resp.error.as_ref().unwrap().kind, "ApprovalRequired");
        assert_eq!(resp.approval_level, "explicit");
        assert_eq!(log_kinds(tmp.path(), &resp.session_id), vec![EntryKind::SessionStart]);
    }

    #[test]
    fn test_explicit_runs_with_flag_and_is_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let mut req = request("bash_run", json!({"command": "echo ok"}));
        req.auto_approve = true;
        let resp = dispatch(&store, &cfg, &req).unwrap();

        assert!(resp.success);
        assert_eq!(resp.result.as_ref().unwrap()["stdout"], "ok\n");
        assert_eq!(
            log_kinds(tmp.path(), &resp.session_id),
            vec![EntryKind::SessionStart, EntryKind::ToolCall]
        );
    }

    #[test]
    fn test_dry_run_skips_side_effect_and_audit() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let target = tmp.path().join("out.txt");
        let mut req = request(
            "file_write",
            json!({"path": target.display().to_string(), "content": "data"}),
        );
        req.dry_run = true;
        let resp = dispatch(&store, &cfg, &req).unwrap();

        assert!(resp.success);
        assert!(resp.dry_run);
        let result = resp.result.unwrap();
        assert_eq!(result["would_execute"], "file_write");
        assert_eq!(result["params"]["content"], "data");
        assert!(!target.exists());
        assert_eq!(log_kinds(tmp.path(), &resp.session_id), vec![EntryKind::SessionStart]);
    }

    #[test]
    fn test_validation_failure_is_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let resp = dispatch(&store, &cfg, &request("file_read", json!({"bogus": 1}))).unwrap();

        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().kind, "ValidationError");
        assert_eq!(
            log_kinds(tmp.path(), &resp.session_id),
            vec![EntryKind::SessionStart, EntryKind::ToolCall]
        );
    }

    #[test]
    fn test_focus_then_resume_resolves_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let proj = tmp.path().join("proj");
        std::fs::create_dir(&proj).unwrap();
        std::fs::write(proj.join("relative.txt"), "found me").unwrap();
        let (store, cfg) = setup(&tmp.path().join("state"));

        let resp = dispatch(
            &store,
            &cfg,
            &request("project_focus", json!({"path": proj.display().to_string()})),
        )
        .unwrap();
        assert!(resp.success);
        assert_eq!(resp.context.project.as_deref(), Some(proj.to_str().unwrap()));
        assert_eq!(
            log_kinds(&tmp.path().join("state"), &resp.session_id),
            vec![
                EntryKind::SessionStart,
                EntryKind::ToolCall,
                EntryKind::ContextChange
            ]
        );

        let mut follow_up = request("file_read", json!({"path": "relative.txt"}));
        follow_up.continuation = Continuation::Resume(resp.session_id.clone());
        let resp2 = dispatch(&store, &cfg, &follow_up).unwrap();

        assert!(resp2.success, "{:?}", resp2.error);
        assert_eq!(resp2.session_id, resp.session_id);
        let result = resp2.result.unwrap();
        assert_eq!(result["content"], "found me");
        assert_eq!(
            result["path"],
            proj.join("relative.txt").display().to_string()
        );
    }

    #[test]
    fn test_relative_path_without_focus_is_precondition() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let resp =
            dispatch(&store, &cfg, &request("file_read", json!({"path": "relative.txt"}))).unwrap();

        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().kind, "PreconditionError");
        // The failed attempt is part of the audit trail.
        assert_eq!(
            log_kinds(tmp.path(), &resp.session_id),
            vec![EntryKind::SessionStart, EntryKind::ToolCall]
        );
    }

    #[test]
    fn test_identical_reads_across_sessions_are_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data.txt");
        std::fs::write(&data, "same bytes\n").unwrap();
        let (store, cfg) = setup(&tmp.path().join("state"));

        let req = request("file_read", json!({"path": data.display().to_string()}));
        let a = dispatch(&store, &cfg, &req).unwrap();
        let b = dispatch(&store, &cfg, &req).unwrap();

        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn test_resume_unknown_session_never_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, cfg) = setup(tmp.path());
        let mut req = request("vps_status", json!({}));
        req.continuation = Continuation::Resume("sess_doesnotexist".to_string());
        let resp = dispatch(&store, &cfg, &req).unwrap();

        assert!(resp.success);
        assert_ne!(resp.session_id, "sess_doesnotexist");
    }
}
