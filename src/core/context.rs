//! Project focus and path resolution.
//!
//! The project focus is the "current working project" that tools operate on
//! when their path parameters are relative, like `cd` for project context. The
//! focus itself is persisted in the session log; this module is a pure view
//! over it plus the resolution rules.

use crate::core::error::HermitError;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

const PROJECT_MARKERS: &[&str] = &[
    ".git",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "requirements.txt",
    "Cargo.toml",
    "go.mod",
    "Makefile",
];

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".git",
    "venv",
    ".venv",
    "target",
    "dist",
    "build",
    ".next",
    ".cache",
];

#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    focus: Option<PathBuf>,
}

impl ProjectContext {
    pub fn new(focus: Option<&str>) -> Self {
        ProjectContext {
            focus: focus.map(PathBuf::from),
        }
    }

    pub fn focus(&self) -> Option<&Path> {
        self.focus.as_deref()
    }

    pub fn focus_str(&self) -> Option<String> {
        self.focus.as_ref().map(|p| p.display().to_string())
    }

    /// Validate and set a new focus. The path must be an absolute path to an
    /// existing directory.
    pub fn set_focus(&mut self, path: &str) -> Result<(), HermitError> {
        let p = Path::new(path);
        if !p.is_absolute() {
            return Err(HermitError::Validation(format!(
                "Project path must be absolute: {}",
                path
            )));
        }
        if !p.exists() {
            return Err(HermitError::Validation(format!(
                "Project path does not exist: {}",
                path
            )));
        }
        if !p.is_dir() {
            return Err(HermitError::Validation(format!(
                "Project path is not a directory: {}",
                path
            )));
        }
        self.focus = Some(p.to_path_buf());
        Ok(())
    }

    /// Resolve a tool path parameter to an absolute path.
    ///
    /// Absolute paths pass through unchanged. Relative paths require a
    /// focus (without one this fails before any filesystem access) and
    /// are joined against it with `.`/`..` segments normalized lexically.
    /// Nothing prevents `..` from escaping the focus root; callers that
    /// need sandboxing must layer it on top.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, HermitError> {
        let p = Path::new(path);
        if p.is_absolute() {
            return Ok(p.to_path_buf());
        }
        let focus = self.focus.as_ref().ok_or_else(|| {
            HermitError::Precondition(format!(
                "Cannot resolve relative path '{}' without a project focus. \
                 Use project_focus to set the current project first.",
                path
            ))
        })?;
        Ok(normalize(&focus.join(p)))
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Discover projects directly under `base` by marker files.
pub fn discover_projects(base: &Path) -> Result<Vec<Value>, HermitError> {
    if !base.exists() {
        return Ok(vec![]);
    }

    let mut projects = Vec::new();
    for entry in std::fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        let markers: Vec<&str> = PROJECT_MARKERS
            .iter()
            .filter(|m| path.join(m).exists())
            .copied()
            .collect();
        if markers.is_empty() {
            continue;
        }

        projects.push(json!({
            "path": path.display().to_string(),
            "name": name,
            "type": detect_project_type(&markers),
            "markers": markers,
        }));
    }

    projects.sort_by(|a, b| {
        let an = a["name"].as_str().unwrap_or("").to_lowercase();
        let bn = b["name"].as_str().unwrap_or("").to_lowercase();
        an.cmp(&bn)
    });
    Ok(projects)
}

fn detect_project_type(markers: &[&str]) -> &'static str {
    if markers.contains(&"package.json") {
        "node"
    } else if markers.contains(&"pyproject.toml")
        || markers.contains(&"setup.py")
        || markers.contains(&"requirements.txt")
    {
        "python"
    } else if markers.contains(&"Cargo.toml") {
        "rust"
    } else if markers.contains(&"go.mod") {
        "go"
    } else if markers.contains(&".git") {
        "git"
    } else {
        "unknown"
    }
}

/// Summarize a project directory: counts, languages, config files, readme.
pub fn project_info(path: &Path) -> Result<Value, HermitError> {
    if !path.exists() {
        return Ok(json!({"path": path.display().to_string(), "exists": false}));
    }
    if !path.is_dir() {
        return Ok(json!({
            "path": path.display().to_string(),
            "exists": true,
            "is_dir": false,
        }));
    }

    let mut files = 0u64;
    let mut dirs = 0u64;
    let mut languages = BTreeSet::new();
    walk_counts(path, &mut files, &mut dirs, &mut languages)?;

    let config_files: Vec<&str> = [
        "package.json",
        "pyproject.toml",
        "setup.py",
        "requirements.txt",
        "Cargo.toml",
        "go.mod",
        "Makefile",
        "docker-compose.yml",
        "Dockerfile",
        ".env.example",
        "tsconfig.json",
    ]
    .iter()
    .filter(|c| path.join(c).exists())
    .copied()
    .collect();

    let readme = ["README.md", "README.rst", "README.txt", "README"]
        .iter()
        .find(|r| path.join(r).exists())
        .copied();

    Ok(json!({
        "path": path.display().to_string(),
        "name": path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
        "exists": true,
        "is_dir": true,
        "is_git": path.join(".git").exists(),
        "files_count": files,
        "directories_count": dirs,
        "config_files": config_files,
        "readme": readme,
        "languages": languages.into_iter().collect::<Vec<_>>(),
    }))
}

fn walk_counts(
    dir: &Path,
    files: &mut u64,
    dirs: &mut u64,
    languages: &mut BTreeSet<&'static str>,
) -> Result<(), HermitError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        // Unreadable subtrees are skipped rather than failing the summary.
        Err(_) => return Ok(()),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
            continue;
        }
        if path.is_dir() {
            *dirs += 1;
            walk_counts(&path, files, dirs, languages)?;
        } else {
            *files += 1;
            if let Some(lang) = language_for(&path) {
                languages.insert(lang);
            }
        }
    }
    Ok(())
}

fn language_for(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "py" => Some("Python"),
        "js" | "jsx" => Some("JavaScript"),
        "ts" | "tsx" => Some("TypeScript"),
        "rs" => Some("Rust"),
        "go" => Some("Go"),
        "rb" => Some("Ruby"),
        "java" => Some("Java"),
        "c" | "h" => Some("C"),
        "cpp" | "hpp" => Some("C++"),
        "sh" => Some("Shell"),
        "sql" => Some("SQL"),
        _ => None,
    }
}
