//! Tiered approval gate.
//!
//! Three tiers govern tool execution:
//! - `auto`: runs unconditionally.
//! - `confirm`: runs unconditionally; the calling client is expected to have
//!   confirmed with its operator first. Nothing here blocks: the process is
//!   headless and the convention lives on the caller's side of the channel.
//! - `explicit`: runs only when the invocation carries `--auto-approve`.
//!
//! The check is a pure function of (tier, flag) and runs strictly before the
//! handler. A denial has no side effects: no audit append, no handler call.

use crate::core::error::HermitError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalTier {
    Auto,
    Confirm,
    Explicit,
}

impl ApprovalTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalTier::Auto => "auto",
            ApprovalTier::Confirm => "confirm",
            ApprovalTier::Explicit => "explicit",
        }
    }
}

pub fn check(tool: &str, tier: ApprovalTier, auto_approve: bool) -> Result<(), HermitError> {
    match tier {
        ApprovalTier::Auto | ApprovalTier::Confirm => Ok(()),
        ApprovalTier::Explicit if auto_approve => Ok(()),
        ApprovalTier::Explicit => Err(HermitError::ApprovalRequired(format!(
            "Tool '{}' requires explicit approval. Use the --auto-approve flag to execute.",
            tool
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_and_confirm_proceed_without_flag() {
        assert!(check("file_read", ApprovalTier::Auto, false).is_ok());
        // Confirm-tier tools execute immediately; the confirmation protocol
        // is the caller's responsibility, not enforced here.
        assert!(check("file_write", ApprovalTier::Confirm, false).is_ok());
    }

    #[test]
    fn test_explicit_denied_without_flag() {
        let err = check("bash_run", ApprovalTier::Explicit, false).unwrap_err();
        assert_eq!(err.kind(), "ApprovalRequired");
        assert!(err.to_string().contains("bash_run"));
    }

    #[test]
    fn test_explicit_allowed_with_flag() {
        assert!(check("bash_run", ApprovalTier::Explicit, true).is_ok());
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(
            serde_json::to_value(ApprovalTier::Explicit).unwrap(),
            serde_json::json!("explicit")
        );
        assert_eq!(ApprovalTier::Confirm.as_str(), "confirm");
    }
}
