//! Code context tools: `code_explain`, `code_debug`.
//!
//! These gather context for the remote LLM to analyze: file content plus a
//! cheap static structure sketch (imports, functions, classes). No analysis
//! happens here; the chat client on the other end of the channel does it.

use crate::core::error::HermitError;
use crate::tools::ExecContext;
use crate::tools::schemas::{CodeDebugParams, CodeExplainParams};
use regex::Regex;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

pub fn detect_file_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("py") => "python",
        Some("js") | Some("jsx") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("rs") => "rust",
        Some("go") => "go",
        Some("rb") => "ruby",
        Some("java") => "java",
        Some("c") | Some("h") => "c",
        Some("cpp") | Some("hpp") => "cpp",
        Some("sh") | Some("bash") | Some("zsh") => "shell",
        Some("sql") => "sql",
        Some("json") => "json",
        Some("yaml") | Some("yml") => "yaml",
        Some("toml") => "toml",
        Some("md") => "markdown",
        Some("html") => "html",
        Some("css") => "css",
        _ => "text",
    }
}

struct LangPatterns {
    imports: Vec<Regex>,
    functions: Vec<Regex>,
    classes: Vec<Regex>,
}

static PYTHON: LazyLock<LangPatterns> = LazyLock::new(|| LangPatterns {
    imports: vec![
        Regex::new(r"(?m)^import\s+([\w\.]+)").unwrap(),
        Regex::new(r"(?m)^from\s+([\w\.]+)\s+import").unwrap(),
    ],
    functions: vec![Regex::new(r"(?m)^(?:async\s+)?def\s+(\w+)").unwrap()],
    classes: vec![Regex::new(r"(?m)^class\s+(\w+)").unwrap()],
});

static JS_TS: LazyLock<LangPatterns> = LazyLock::new(|| LangPatterns {
    imports: vec![
        Regex::new(r#"import\s+(?:\{[^}]+\}|\*\s+as\s+\w+|\w+)\s+from\s+['"]([^'"]+)['"]"#)
            .unwrap(),
        Regex::new(r#"const\s+\w+\s*=\s*require\(['"]([^'"]+)['"]\)"#).unwrap(),
    ],
    functions: vec![
        Regex::new(r"(?:export\s+)?(?:async\s+)?function\s+(\w+)").unwrap(),
        Regex::new(r"(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s+)?\([^)]*\)\s*=>").unwrap(),
        Regex::new(r"(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s+)?function").unwrap(),
    ],
    classes: vec![Regex::new(r"(?:export\s+)?class\s+(\w+)").unwrap()],
});

static RUST: LazyLock<LangPatterns> = LazyLock::new(|| LangPatterns {
    imports: vec![Regex::new(r"(?m)^\s*use\s+([\w:]+)").unwrap()],
    functions: vec![Regex::new(r"(?m)^\s*(?:pub(?:\([\w\s]+\))?\s+)?(?:async\s+)?fn\s+(\w+)").unwrap()],
    classes: vec![
        Regex::new(r"(?m)^\s*(?:pub(?:\([\w\s]+\))?\s+)?(?:struct|enum|trait)\s+(\w+)").unwrap(),
    ],
});

/// Sketch a file's structure with per-language regex tables. Unknown
/// languages fall back to line counts.
pub fn extract_structure(content: &str, file_type: &str) -> Value {
    let patterns = match file_type {
        "python" => &*PYTHON,
        "javascript" | "typescript" => &*JS_TS,
        "rust" => &*RUST,
        _ => {
            let lines = content.lines().count();
            let non_empty = content.lines().filter(|l| !l.trim().is_empty()).count();
            return json!({ "lines": lines, "non_empty_lines": non_empty });
        }
    };

    json!({
        "imports": collect(&patterns.imports, content),
        "functions": collect(&patterns.functions, content),
        "classes": collect(&patterns.classes, content),
    })
}

fn collect(patterns: &[Regex], content: &str) -> Vec<String> {
    let mut out = BTreeSet::new();
    for pattern in patterns {
        for capture in pattern.captures_iter(content) {
            if let Some(m) = capture.get(1) {
                out.insert(m.as_str().to_string());
            }
        }
    }
    out.into_iter().collect()
}

pub fn explain(p: &CodeExplainParams, ctx: &ExecContext) -> Result<Value, HermitError> {
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
            "File too large ({} bytes)",
            size
        )));
    }

    let bytes = std::fs::read(&path)?;
    let content = String::from_utf8_lossy(&bytes).to_string();
    let file_type = detect_file_type(&path);

    let mut result = json!({
        "path": path.display().to_string(),
        "file_type": file_type,
        "content": content,
        "lines": content.lines().count(),
        "size_bytes": size,
        "structure": extract_structure(&content, file_type),
    });
    if let Some(question) = &p.question {
        result["question"] = json!(question);
    }
    Ok(result)
}

pub fn debug(p: &CodeDebugParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let mut result = json!({});

    if let Some(error) = &p.error {
        result["error"] = json!(error);
        let traceback = parse_traceback(error);
        if !traceback.is_empty() {
            result["traceback_files"] = json!(traceback);
        }
    }

    if let Some(path) = &p.path {
        let path = ctx.project.resolve(path)?;
        if path.is_file() {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let file_type = detect_file_type(&path);
                    result["file"] = json!({
                        "path": path.display().to_string(),
                        "file_type": file_type,
                        "content": content,
                        "lines": content.lines().count(),
                        "structure": extract_structure(&content, file_type),
                    });
                }
                Err(e) => {
                    result["file_error"] = json!(e.to_string());
                }
            }
        }
    }

    if let Some(context) = &p.context {
        result["additional_context"] = json!(context);
    }
    if let Some(focus) = ctx.project.focus_str() {
        result["project"] = json!(focus);
    }

    Ok(result)
}

static TRACEBACK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "([^"]+)", line (\d+)"#).unwrap());

/// Extract file/line references from a Python traceback, with a ±5-line
/// snippet around each when the file is readable. Stdlib and site-packages
/// frames are skipped.
fn parse_traceback(error: &str) -> Vec<Value> {
    let mut files = Vec::new();
    for capture in TRACEBACK_LINE.captures_iter(error) {
        let file_path = &capture[1];
        let line_num: usize = match capture[2].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if file_path.contains("/lib/") || file_path.contains("site-packages") {
            continue;
        }

        let mut info = json!({ "path": file_path, "line": line_num });
        if let Ok(content) = std::fs::read_to_string(file_path) {
            let lines: Vec<&str> = content.lines().collect();
            let start = line_num.saturating_sub(6);
            let end = (line_num + 5).min(lines.len());
            if start < end {
                info["snippet"] = json!({
                    "start_line": start + 1,
                    "end_line": end,
                    "lines": lines[start..end],
                    "error_line": line_num,
                });
            }
        }
        files.push(info);
    }
    files
}
