//! Shared timestamp and identifier helpers.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::SystemTime;
use ulid::Ulid;

/// Returns the current instant as an ISO-8601 UTC string (e.g.
/// `2026-08-06T09:14:03Z`). Every persisted record and every response
/// envelope uses this format.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format an arbitrary [`SystemTime`] (typically a file mtime) as ISO-8601 UTC.
pub fn iso_from_system_time(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Seconds elapsed since `t`, saturating at zero for clock skew.
pub fn secs_since(t: SystemTime) -> u64 {
    SystemTime::now()
        .duration_since(t)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Generate a session identifier: a fixed prefix plus the final eight
/// characters of a fresh ULID, lowercased. The tail is drawn from the
/// ULID's random component, so consecutive ids do not share a stamp.
pub fn new_session_id(prefix: &str) -> String {
    let ulid = Ulid::new().to_string().to_lowercase();
    format!("{}{}", prefix, &ulid[ulid.len() - 8..])
}
