//! Response envelope shared by every surface.
//!
//! Exactly one of `result` / `error` is populated; `context` is always
//! present, including on errors, so callers can recover the session id and
//! current project focus from any response.

use crate::core::time;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub tool: String,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextInfo {
    pub project: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub session_id: String,
    pub tool: String,
    pub approval_level: String,
    pub dry_run: bool,
    pub result: Option<Value>,
    pub context: ContextInfo,
    pub error: Option<ErrorDetail>,
    pub timestamp: String,
}

impl ToolResponse {
    pub fn success(
        session_id: &str,
        tool: &str,
        approval_level: &str,
        result: Value,
        context: ContextInfo,
        dry_run: bool,
    ) -> Self {
        ToolResponse {
            success: true,
            session_id: session_id.to_string(),
            tool: tool.to_string(),
            approval_level: approval_level.to_string(),
            dry_run,
            result: Some(result),
            context,
            error: None,
            timestamp: time::now_iso(),
        }
    }

    pub fn error(
        session_id: &str,
        tool: &str,
        approval_level: &str,
        kind: &str,
        message: &str,
        details: Value,
        context: ContextInfo,
    ) -> Self {
        ToolResponse {
            success: false,
            session_id: session_id.to_string(),
            tool: tool.to_string(),
            approval_level: approval_level.to_string(),
            dry_run: false,
            result: None,
            context,
            error: Some(ErrorDetail {
                kind: kind.to_string(),
                message: message.to_string(),
                tool: tool.to_string(),
                details,
            }),
            timestamp: time::now_iso(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"error\":{{\"type\":\"StorageError\",\"message\":\"response serialization failed: {}\"}}}}",
                e
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_has_result_and_no_error() {
        let resp = ToolResponse::success(
            "sess_ab12cd34",
            "file_read",
            "auto",
            serde_json::json!({"content": "hello"}),
            ContextInfo {
                project: Some("/tmp/proj".into()),
                session_id: Some("sess_ab12cd34".into()),
            },
            false,
        );
        assert!(resp.success);
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
        assert_eq!(resp.context.project.as_deref(), Some("/tmp/proj"));
    }

    #[test]
    fn test_error_envelope_has_error_and_no_result() {
        let resp = ToolResponse::error(
            "sess_ab12cd34",
            "bash_run",
            "explicit",
            "ApprovalRequired",
            "Tool 'bash_run' requires explicit approval",
            serde_json::json!({}),
            ContextInfo::default(),
        );
        assert!(!resp.success);
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.kind, "ApprovalRequired");
        assert_eq!(err.tool, "bash_run");
    }

    #[test]
    fn test_wire_shape() {
        let resp = ToolResponse::success(
            "sess_x",
            "vps_status",
            "auto",
            serde_json::json!({}),
            ContextInfo::default(),
            true,
        );
        let value: Value = serde_json::from_str(&resp.to_json()).unwrap();
        // `error` and `context.project` serialize as explicit nulls, not
        // omitted keys, so callers can branch without key-existence checks.
        assert!(value.get("error").unwrap().is_null());
        assert!(value["context"].get("project").unwrap().is_null());
        assert_eq!(value["error"], Value::Null);
        assert_eq!(value["dry_run"], true);
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
