use hermit::core::approval::{self, ApprovalTier};
use hermit::core::config::AgentConfig;
use hermit::core::dispatch::{self, InvocationRequest};
use hermit::core::session::{Continuation, EntryKind, SessionStore};
use hermit::tools;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn registry_tiers_match_the_documented_policy() {
    for (name, tier) in [
        ("project_focus", ApprovalTier::Auto),
        ("file_read", ApprovalTier::Auto),
        ("file_write", ApprovalTier::Confirm),
        ("service_restart", ApprovalTier::Confirm),
        ("service_stop", ApprovalTier::Explicit),
        ("bash_run", ApprovalTier::Explicit),
    ] {
        assert_eq!(tools::lookup(name).unwrap().tier, tier, "{}", name);
    }
    assert!(tools::lookup("rm_rf_everything").is_none());
}

#[test]
fn approval_gate_is_a_pure_function_of_tier_and_flag() {
    assert!(approval::check("x", ApprovalTier::Auto, false).is_ok());
    assert!(approval::check("x", ApprovalTier::Confirm, false).is_ok());
    assert!(approval::check("x", ApprovalTier::Explicit, true).is_ok());
    assert_eq!(
        approval::check("x", ApprovalTier::Explicit, false)
            .unwrap_err()
            .kind(),
        "ApprovalRequired"
    );
}

#[test]
fn dispatch_round_trip_through_the_library() {
    let tmp = tempdir().unwrap();
    let cfg = AgentConfig::with_home(tmp.path().to_path_buf());
    let store = SessionStore::new(&cfg);

    let data = tmp.path().join("hello.txt");
    std::fs::write(&data, "from the library\n").unwrap();

    let response = dispatch::dispatch(
        &store,
        &cfg,
        &InvocationRequest {
            tool: "file_read".to_string(),
            params: json!({"path": data.display().to_string()}),
            continuation: Continuation::New,
            auto_approve: false,
            dry_run: false,
        },
    )
    .unwrap();

    assert!(response.success);
    assert_eq!(response.approval_level, "auto");
    assert_eq!(
        response.result.unwrap()["content"],
        "from the library\n"
    );

    let reloaded = store
        .load_or_create(&Continuation::Resume(response.session_id.clone()))
        .unwrap();
    assert_eq!(reloaded.id, response.session_id);
    assert!(reloaded.entries.iter().any(|e| e.kind == EntryKind::ToolCall));
}
