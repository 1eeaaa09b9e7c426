//! Runtime configuration.
//!
//! Compiled defaults, optionally overridden by `<state root>/config.toml`.
//! The state root is `$HERMIT_HOME` when set, otherwise `$HOME/.hermit`.

use crate::core::error::HermitError;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const SESSION_ID_PREFIX: &str = "sess_";

const DEFAULT_SESSION_TTL_HOURS: u64 = 24;
const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_TREE_DEPTH: usize = 10;
const DEFAULT_MAX_TREE_ENTRIES: usize = 1000;
const DEFAULT_BASH_TIMEOUT_SECS: u64 = 60;
pub const BASH_TIMEOUT_CEILING_SECS: u64 = 300;
const DEFAULT_BASH_MAX_OUTPUT_BYTES: usize = 1024 * 1024;
const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 60;

/// Optional override file, all fields absent by default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    projects_dir: Option<PathBuf>,
    session_ttl_hours: Option<u64>,
    max_file_size_bytes: Option<u64>,
    max_tree_depth: Option<usize>,
    max_tree_entries: Option<usize>,
    bash_timeout_secs: Option<u64>,
    bash_max_output_bytes: Option<usize>,
    exec_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// State root (`$HERMIT_HOME` or `$HOME/.hermit`).
    pub home: PathBuf,
    /// Where session logs live: `<home>/sessions`.
    pub sessions_dir: PathBuf,
    /// Default base for project discovery.
    pub projects_dir: PathBuf,
    /// Sessions older than this (by file mtime) are classified expired.
    pub session_ttl_hours: u64,
    pub max_file_size_bytes: u64,
    pub max_tree_depth: usize,
    pub max_tree_entries: usize,
    /// Default `bash_run` deadline; requests may raise it up to the ceiling.
    pub bash_timeout_secs: u64,
    pub bash_max_output_bytes: usize,
    /// Deadline for service-manager and system probe commands.
    pub exec_timeout_secs: u64,
}

impl AgentConfig {
    pub fn load() -> Result<Self, HermitError> {
        let home = match env::var("HERMIT_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(env::var("HOME")?).join(".hermit"),
        };
        let mut cfg = Self::with_home(home);
        if let Ok(user_home) = env::var("HOME") {
            cfg.projects_dir = PathBuf::from(user_home).join("projects");
        }

        let config_path = cfg.home.join("config.toml");
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let overrides: ConfigFile = toml::from_str(&content).map_err(|e| {
                HermitError::Validation(format!("invalid {}: {}", config_path.display(), e))
            })?;
            cfg.apply(overrides);
        }

        Ok(cfg)
    }

    /// Compiled defaults rooted at `home`; no filesystem or environment
    /// access.
    pub fn with_home(home: PathBuf) -> Self {
        let sessions_dir = home.join("sessions");
        let projects_dir = home.join("projects");
        AgentConfig {
            home,
            sessions_dir,
            projects_dir,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            max_tree_entries: DEFAULT_MAX_TREE_ENTRIES,
            bash_timeout_secs: DEFAULT_BASH_TIMEOUT_SECS,
            bash_max_output_bytes: DEFAULT_BASH_MAX_OUTPUT_BYTES,
            exec_timeout_secs: DEFAULT_EXEC_TIMEOUT_SECS,
        }
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.projects_dir {
            self.projects_dir = v;
        }
        if let Some(v) = file.session_ttl_hours {
            self.session_ttl_hours = v;
        }
        if let Some(v) = file.max_file_size_bytes {
            self.max_file_size_bytes = v;
        }
        if let Some(v) = file.max_tree_depth {
            self.max_tree_depth = v;
        }
        if let Some(v) = file.max_tree_entries {
            self.max_tree_entries = v;
        }
        if let Some(v) = file.bash_timeout_secs {
            self.bash_timeout_secs = v.min(BASH_TIMEOUT_CEILING_SECS);
        }
        if let Some(v) = file.bash_max_output_bytes {
            self.bash_max_output_bytes = v;
        }
        if let Some(v) = file.exec_timeout_secs {
            self.exec_timeout_secs = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AgentConfig::with_home(PathBuf::from("/tmp/hermit-home"));
        assert_eq!(cfg.sessions_dir, PathBuf::from("/tmp/hermit-home/sessions"));
        assert_eq!(cfg.session_ttl_hours, 24);
        assert_eq!(cfg.max_tree_depth, 10);
        assert_eq!(cfg.bash_timeout_secs, 60);
    }

    #[test]
    fn test_overrides_clamp_bash_timeout() {
        let mut cfg = AgentConfig::with_home(PathBuf::from("/tmp/hermit-home"));
        let file: ConfigFile = toml::from_str("bash_timeout_secs = 9000").unwrap();
        cfg.apply(file);
        assert_eq!(cfg.bash_timeout_secs, BASH_TIMEOUT_CEILING_SECS);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let parsed: Result<ConfigFile, _> = toml::from_str("no_such_knob = true");
        assert!(parsed.is_err());
    }
}
