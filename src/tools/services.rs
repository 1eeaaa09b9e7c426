//! Service manager tools: `service_list`, `service_status`, and the
//! start/stop/restart control verbs. Supports systemd, Docker, and pm2.

use crate::core::error::HermitError;
use crate::core::exec::{self, ExecResult};
use crate::tools::ExecContext;
use crate::tools::schemas::{ServiceListParams, ServiceTargetParams};
use serde_json::{Value, json};
use std::time::Duration;

const MANAGERS: &[&str] = &["systemd", "docker", "pm2"];

fn manager_bin(manager: &str) -> &'static str {
    match manager {
        "systemd" => "systemctl",
        "docker" => "docker",
        _ => "pm2",
    }
}

fn available(manager: &str) -> bool {
    exec::which(manager_bin(manager)).is_some()
}

fn probe(argv: &[&str], ctx: &ExecContext) -> Result<ExecResult, HermitError> {
    exec::run_argv(argv, Duration::from_secs(ctx.config.exec_timeout_secs))
}

/// Find which manager knows a service by asking each in turn.
fn detect_manager(name: &str, ctx: &ExecContext) -> Option<&'static str> {
    if available("systemd") {
        if let Ok(result) = probe(&["systemctl", "cat", name], ctx) {
            if result.exit_code == 0 {
                return Some("systemd");
            }
        }
    }
    if available("docker") {
        if let Ok(result) = probe(&["docker", "inspect", name], ctx) {
            if result.exit_code == 0 {
                return Some("docker");
            }
        }
    }
    if available("pm2") {
        if let Ok(result) = probe(&["pm2", "jlist"], ctx) {
            if result.exit_code == 0 {
                if let Ok(processes) = serde_json::from_str::<Vec<Value>>(&result.stdout) {
                    if processes.iter().any(|p| p["name"] == name) {
                        return Some("pm2");
                    }
                }
            }
        }
    }
    None
}

fn resolve_manager(p: &ServiceTargetParams, ctx: &ExecContext) -> Result<&'static str, HermitError> {
    match p.manager.as_deref() {
        Some("systemd") => Ok("systemd"),
        Some("docker") => Ok("docker"),
        Some("pm2") => Ok("pm2"),
        // Unknown strings are rejected at the validation layer.
        Some(other) => Err(HermitError::Validation(format!(
            "Unknown manager: {}",
            other
        ))),
        None => detect_manager(&p.name, ctx).ok_or_else(|| {
            HermitError::NotFound(format!("Could not find service '{}' in any manager", p.name))
        }),
    }
}

pub fn list(p: &ServiceListParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let managers: Vec<&str> = match p.manager.as_deref() {
        Some(m) => vec![m],
        None => MANAGERS.to_vec(),
    };

    let mut services = json!({});
    for manager in managers {
        if !available(manager) {
            continue;
        }
        services[manager] = match manager {
            "systemd" => systemd_list(ctx)?,
            "docker" => docker_list(ctx)?,
            _ => pm2_list(ctx)?,
        };
    }
    Ok(json!({ "services": services }))
}

pub fn status(p: &ServiceTargetParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    match resolve_manager(p, ctx)? {
        "systemd" => systemd_status(&p.name, ctx),
        "docker" => docker_status(&p.name, ctx),
        _ => pm2_status(&p.name, ctx),
    }
}

pub fn control(
    p: &ServiceTargetParams,
    ctx: &ExecContext,
    action: &str,
) -> Result<Value, HermitError> {
    let manager = resolve_manager(p, ctx)?;
    let bin = manager_bin(manager);
    let result = probe(&[bin, action, &p.name], ctx)?;
    if result.timed_out {
        return Err(HermitError::Timeout(format!(
            "{} {} {} exceeded the {}s deadline",
            bin, action, p.name, ctx.config.exec_timeout_secs
        )));
    }
    Ok(json!({
        "name": p.name,
        "manager": manager,
        "action": action,
        "success": result.exit_code == 0,
        "output": result.stdout,
        "error": if result.exit_code != 0 { Some(result.stderr) } else { None },
    }))
}

fn systemd_list(ctx: &ExecContext) -> Result<Value, HermitError> {
    let result = probe(
        &[
            "systemctl",
            "list-units",
            "--type=service",
            "--all",
            "--no-pager",
            "--plain",
        ],
        ctx,
    )?;
    if result.exit_code != 0 {
        return Ok(json!([]));
    }

    let mut services = Vec::new();
    for line in result.stdout.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 4 && parts[0].ends_with(".service") {
            services.push(json!({
                "name": parts[0].trim_end_matches(".service"),
                "load": parts[1],
                "active": parts[2],
                "sub": parts[3],
                "description": parts[4..].join(" "),
            }));
        }
    }
    Ok(json!(services))
}

fn systemd_status(name: &str, ctx: &ExecContext) -> Result<Value, HermitError> {
    let result = probe(&["systemctl", "show", name, "--no-pager"], ctx)?;
    if result.exit_code != 0 {
        return Ok(json!({"name": name, "status": "unknown", "error": result.stderr}));
    }

    let mut info = json!({ "name": name, "manager": "systemd" });
    for line in result.stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "ActiveState" => info["status"] = json!(value),
            "SubState" => info["sub_state"] = json!(value),
            "MainPID" => {
                info["pid"] = match value.parse::<u32>() {
                    Ok(0) | Err(_) => Value::Null,
                    Ok(pid) => json!(pid),
                }
            }
            "UnitFileState" => info["enabled"] = json!(value == "enabled"),
            "ActiveEnterTimestamp" => info["started_at"] = json!(value),
            _ => {}
        }
    }
    Ok(info)
}

fn docker_list(ctx: &ExecContext) -> Result<Value, HermitError> {
    let result = probe(&["docker", "ps", "-a", "--format", "{{json .}}"], ctx)?;
    if result.exit_code != 0 {
        return Ok(json!([]));
    }

    let mut containers = Vec::new();
    for line in result.stdout.lines() {
        if let Ok(data) = serde_json::from_str::<Value>(line) {
            containers.push(json!({
                "name": data["Names"].as_str().unwrap_or(""),
                "image": data["Image"].as_str().unwrap_or(""),
                "status": data["State"].as_str().or(data["Status"].as_str()).unwrap_or(""),
                "ports": data["Ports"].as_str().unwrap_or(""),
            }));
        }
    }
    Ok(json!(containers))
}

fn docker_status(name: &str, ctx: &ExecContext) -> Result<Value, HermitError> {
    let result = probe(&["docker", "inspect", name, "--format", "{{json .}}"], ctx)?;
    if result.exit_code != 0 {
        return Ok(json!({"name": name, "status": "unknown", "error": result.stderr}));
    }

    match serde_json::from_str::<Value>(result.stdout.trim()) {
        Ok(data) => {
            let state = &data["State"];
            Ok(json!({
                "name": name,
                "manager": "docker",
                "status": state["Status"].as_str().unwrap_or("unknown"),
                "running": state["Running"].as_bool().unwrap_or(false),
                "pid": state["Pid"],
                "started_at": state["StartedAt"],
                "image": data["Config"]["Image"],
            }))
        }
        Err(_) => Ok(json!({
            "name": name,
            "status": "unknown",
            "error": "Failed to parse response",
        })),
    }
}

fn pm2_list(ctx: &ExecContext) -> Result<Value, HermitError> {
    let result = probe(&["pm2", "jlist"], ctx)?;
    if result.exit_code != 0 {
        return Ok(json!([]));
    }

    let processes: Vec<Value> = serde_json::from_str(&result.stdout).unwrap_or_default();
    let list: Vec<Value> = processes
        .iter()
        .map(|p| {
            json!({
                "name": p["name"].as_str().unwrap_or(""),
                "pm_id": p["pm_id"],
                "status": p["pm2_env"]["status"].as_str().unwrap_or("unknown"),
                "memory": p["monit"]["memory"],
                "cpu": p["monit"]["cpu"],
            })
        })
        .collect();
    Ok(json!(list))
}

fn pm2_status(name: &str, ctx: &ExecContext) -> Result<Value, HermitError> {
    let result = probe(&["pm2", "jlist"], ctx)?;
    if result.exit_code != 0 {
        return Ok(json!({"name": name, "status": "unknown", "error": "Failed to get process list"}));
    }

    let processes: Vec<Value> = serde_json::from_str(&result.stdout).unwrap_or_default();
    for p in &processes {
        if p["name"] == name {
            return Ok(json!({
                "name": name,
                "manager": "pm2",
                "pm_id": p["pm_id"],
                "status": p["pm2_env"]["status"].as_str().unwrap_or("unknown"),
                "pid": p["pid"],
                "memory": p["monit"]["memory"],
                "cpu": p["monit"]["cpu"],
                "restarts": p["pm2_env"]["restart_time"],
                "uptime": p["pm2_env"]["pm_uptime"],
            }));
        }
    }
    Ok(json!({"name": name, "status": "not_found", "error": "Process not found"}))
}
