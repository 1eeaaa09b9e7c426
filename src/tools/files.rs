//! File tools: `file_read`, `file_write`, `dir_tree`.

use crate::core::error::HermitError;
use crate::tools::ExecContext;
use crate::tools::schemas::{DirTreeParams, FileReadParams, FileWriteParams};
use regex::Regex;
use serde_json::{Value, json};
use std::path::Path;

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

pub fn read(p: &FileReadParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let path = ctx.project.resolve(&p.path)?;

    if !path.exists() {
        return Err(HermitError::NotFound(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(HermitError::Validation(format!(
            "Not a file: {}",
            path.display()
        )));
    }

    let size = std::fs::metadata(&path)?.len();
    if size > ctx.config.max_file_size_bytes {
        return Err(HermitError::Validation(format!(
            "File too large ({} bytes). Maximum is {} bytes.",
            size, ctx.config.max_file_size_bytes
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let total_lines = lines.len();

    let ranged = p.start_line.is_some() || p.end_line.is_some();
    let (content, line_count) = if ranged {
        let start = p.start_line.unwrap_or(1).saturating_sub(1).min(total_lines);
        let end = p.end_line.unwrap_or(total_lines).min(total_lines);
        let slice = if start < end { &lines[start..end] } else { &lines[0..0] };
        (slice.concat(), slice.len())
    } else {
        (content.clone(), total_lines)
    };

    Ok(json!({
        "path": path.display().to_string(),
        "content": content,
        "lines": line_count,
        "total_lines": total_lines,
        "size_bytes": size,
        "truncated": ranged,
    }))
}

pub fn write(p: &FileWriteParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let path = ctx.project.resolve(&p.path)?;

    if p.create_dirs {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let existed = path.exists();
    let old_size = if existed {
        std::fs::metadata(&path)?.len()
    } else {
        0
    };

    std::fs::write(&path, &p.content)?;

    Ok(json!({
        "path": path.display().to_string(),
        "created": !existed,
        "modified": existed,
        "old_size_bytes": old_size,
        "new_size_bytes": std::fs::metadata(&path)?.len(),
        "lines": p.content.lines().count(),
    }))
}

pub fn tree(p: &DirTreeParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let root = match (&p.path, ctx.project.focus()) {
        (Some(path), _) => ctx.project.resolve(path)?,
        (None, Some(focus)) => focus.to_path_buf(),
        (None, None) => {
            return Err(HermitError::Validation(
                "No path specified and no project focus set. \
                 Use project_focus first or provide a path."
                    .to_string(),
            ));
        }
    };

    if !root.exists() {
        return Err(HermitError::NotFound(format!(
            "Directory not found: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(HermitError::Validation(format!(
            "Not a directory: {}",
            root.display()
        )));
    }

    let pattern = p
        .pattern
        .as_deref()
        .map(glob_to_regex)
        .transpose()
        .map_err(|e| HermitError::Validation(format!("dir_tree: bad pattern: {}", e)))?;

    let mut stats = TreeStats::default();
    let max_depth = p.max_depth.min(ctx.config.max_tree_depth);
    let tree = build_tree(
        &root,
        max_depth,
        p.include_hidden,
        pattern.as_ref(),
        ctx.config.max_tree_entries,
        0,
        &mut stats,
    )?;

    Ok(json!({
        "path": root.display().to_string(),
        "tree": tree,
        "total_files": stats.files,
        "total_dirs": stats.dirs,
        "truncated": stats.truncated,
    }))
}

#[derive(Default)]
struct TreeStats {
    files: usize,
    dirs: usize,
    truncated: bool,
}

fn build_tree(
    path: &Path,
    max_depth: usize,
    include_hidden: bool,
    pattern: Option<&Regex>,
    max_entries: usize,
    depth: usize,
    stats: &mut TreeStats,
) -> Result<Value, HermitError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let node = |children: Vec<Value>, truncated: bool, error: Option<&str>| {
        let mut n = json!({
            "name": name.as_str(),
            "type": "directory",
            "children": children,
        });
        if truncated {
            n["truncated"] = json!(true);
        }
        if let Some(msg) = error {
            n["error"] = json!(msg);
        }
        n
    };

    if depth >= max_depth || stats.files + stats.dirs >= max_entries {
        stats.truncated = stats.truncated || stats.files + stats.dirs >= max_entries;
        return Ok(node(vec![], true, None));
    }

    let mut entries = match std::fs::read_dir(path) {
        Ok(iter) => iter.flatten().map(|e| e.path()).collect::<Vec<_>>(),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Ok(node(vec![], false, Some("Permission denied")));
        }
        Err(e) => return Err(e.into()),
    };
    // Directories first, then files, both case-insensitively by name.
    entries.sort_by_key(|p| {
        (
            !p.is_dir(),
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
        )
    });

    let mut children = Vec::new();
    let mut hit_ceiling = false;
    for entry in entries {
        let entry_name = entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !include_hidden && entry_name.starts_with('.') {
            continue;
        }
        if entry.is_dir() && SKIP_DIRS.contains(&entry_name.as_str()) {
            continue;
        }
        if entry.is_file() {
            if let Some(re) = pattern {
                if !re.is_match(&entry_name) {
                    continue;
                }
            }
        }

        if stats.files + stats.dirs >= max_entries {
            stats.truncated = true;
            hit_ceiling = true;
            break;
        }

        if entry.is_file() {
            stats.files += 1;
            children.push(json!({
                "name": entry_name,
                "type": "file",
                "size": std::fs::metadata(&entry).map(|m| m.len()).unwrap_or(0),
            }));
        } else if entry.is_dir() {
            stats.dirs += 1;
            let child = build_tree(
                &entry,
                max_depth,
                include_hidden,
                pattern,
                max_entries,
                depth + 1,
                stats,
            )?;
            children.push(child);
        }
    }

    Ok(node(children, hit_ceiling, None))
}

/// Translate an fnmatch-style pattern (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AgentConfig;
    use crate::core::context::ProjectContext;

    fn ctx_with_focus<'a>(cfg: &'a AgentConfig, focus: &str) -> ExecContext<'a> {
        ExecContext {
            project: ProjectContext::new(Some(focus)),
            config: cfg,
        }
    }

    fn test_config(home: &Path) -> AgentConfig {
        AgentConfig::with_home(home.to_path_buf())
    }

    #[test]
    fn test_read_with_line_range() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("f.txt"), "one\ntwo\nthree\nfour\n").unwrap();
        let cfg = test_config(tmp.path());
        let ctx = ctx_with_focus(&cfg, &tmp.path().display().to_string());

        let p = FileReadParams {
            path: "f.txt".into(),
            start_line: Some(2),
            end_line: Some(3),
        };
        let result = read(&p, &ctx).unwrap();
        assert_eq!(result["content"], "two\nthree\n");
        assert_eq!(result["lines"], 2);
        assert_eq!(result["total_lines"], 4);
        assert_eq!(result["truncated"], true);
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let ctx = ctx_with_focus(&cfg, &tmp.path().display().to_string());
        let p = FileReadParams {
            path: "missing.txt".into(),
            start_line: None,
            end_line: None,
        };
        assert_eq!(read(&p, &ctx).unwrap_err().kind(), "NotFoundError");
    }

    #[test]
    fn test_write_creates_parents_and_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let ctx = ctx_with_focus(&cfg, &tmp.path().display().to_string());

        let p = FileWriteParams {
            path: "nested/dir/out.txt".into(),
            content: "alpha\nbeta\n".into(),
            create_dirs: true,
        };
        let result = write(&p, &ctx).unwrap();
        assert_eq!(result["created"], true);
        assert_eq!(result["modified"], false);
        assert_eq!(result["lines"], 2);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("nested/dir/out.txt")).unwrap(),
            "alpha\nbeta\n"
        );

        let result = write(&p, &ctx).unwrap();
        assert_eq!(result["created"], false);
        assert_eq!(result["modified"], true);
    }

    #[test]
    fn test_tree_depth_and_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.rs"), "").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/c.rs"), "").unwrap();
        std::fs::create_dir(tmp.path().join("node_modules")).unwrap();
        let cfg = test_config(tmp.path());
        let ctx = ctx_with_focus(&cfg, &tmp.path().display().to_string());

        let p = DirTreeParams {
            path: None,
            max_depth: 5,
            include_hidden: false,
            pattern: Some("*.rs".into()),
        };
        let result = tree(&p, &ctx).unwrap();
        assert_eq!(result["total_files"], 2);
        assert_eq!(result["total_dirs"], 1);
        let names: Vec<&str> = result["tree"]["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"a.rs"));
        assert!(!names.contains(&"b.txt"));
        assert!(!names.contains(&"node_modules"));
    }

    #[test]
    fn test_tree_without_path_or_focus_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let ctx = ExecContext {
            project: ProjectContext::new(None),
            config: &cfg,
        };
        let p = DirTreeParams {
            path: None,
            max_depth: 3,
            include_hidden: false,
            pattern: None,
        };
        assert_eq!(tree(&p, &ctx).unwrap_err().kind(), "ValidationError");
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("*.rs").unwrap();
        assert!(re.is_match("main.rs"));
        assert!(!re.is_match("main.rs.bak"));
        let re = glob_to_regex("data?.json").unwrap();
        assert!(re.is_match("data1.json"));
        assert!(!re.is_match("data12.json"));
    }
}
