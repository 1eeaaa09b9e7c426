//! Host status tool: `vps_status`.
//!
//! Reads /proc where possible and shells out (`df`, `ps`, `ip`) where not.
//! Individual probes degrade to `"unknown"` or an `error` field instead of
//! failing the whole report.

use crate::core::error::HermitError;
use crate::core::exec;
use crate::tools::ExecContext;
use crate::tools::schemas::VpsStatusParams;
use serde_json::{Value, json};
use std::time::Duration;

pub fn status(p: &VpsStatusParams, ctx: &ExecContext) -> Result<Value, HermitError> {
    let timeout = Duration::from_secs(ctx.config.exec_timeout_secs);

    let mut result = json!({
        "hostname": hostname(),
        "uptime": uptime(),
        "load_average": load_average(),
        "memory": memory_info(),
        "disk": disk_info(timeout),
        "cpu": cpu_info(),
    });

    if p.include_processes {
        result["processes"] = top_processes(10, timeout);
    }
    if p.include_network {
        result["network"] = network_info(timeout);
    }

    Ok(result)
}

fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn uptime() -> String {
    let Some(secs) = std::fs::read_to_string("/proc/uptime")
        .ok()
        .and_then(|s| s.split_whitespace().next().map(str::to_string))
        .and_then(|s| s.parse::<f64>().ok())
    else {
        return "unknown".to_string();
    };

    let secs = secs as u64;
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    parts.push(format!("{}m", minutes));
    parts.join(" ")
}

fn load_average() -> Value {
    let loads: Vec<f64> = std::fs::read_to_string("/proc/loadavg")
        .ok()
        .map(|s| {
            s.split_whitespace()
                .take(3)
                .filter_map(|p| p.parse().ok())
                .collect()
        })
        .unwrap_or_default();
    if loads.len() == 3 {
        json!(loads)
    } else {
        json!([0.0, 0.0, 0.0])
    }
}

fn memory_info() -> Value {
    let content = match std::fs::read_to_string("/proc/meminfo") {
        Ok(c) => c,
        Err(e) => return json!({ "error": e.to_string() }),
    };

    let kb = |key: &str| -> u64 {
        content
            .lines()
            .find(|l| l.starts_with(key))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            * 1024
    };

    let total = kb("MemTotal:");
    let available = kb("MemAvailable:");
    let free = kb("MemFree:");
    let buffers = kb("Buffers:");
    let cached = kb("Cached:");
    let used = total.saturating_sub(available);

    json!({
        "total_bytes": total,
        "available_bytes": available,
        "used_bytes": used,
        "free_bytes": free,
        "buffers_bytes": buffers,
        "cached_bytes": cached,
        "percent_used": percent(used, total),
        "total_human": human_size(total),
        "used_human": human_size(used),
        "available_human": human_size(available),
    })
}

fn disk_info(timeout: Duration) -> Value {
    let result = match exec::run_argv(
        &["df", "-B1", "--output=size,used,avail", "/"],
        timeout,
    ) {
        Ok(r) if r.exit_code == 0 => r,
        Ok(_) | Err(_) => return json!({ "error": "Failed to get disk info" }),
    };

    let Some(line) = result.stdout.lines().nth(1) else {
        return json!({ "error": "Failed to get disk info" });
    };
    let fields: Vec<u64> = line
        .split_whitespace()
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() != 3 {
        return json!({ "error": "Failed to get disk info" });
    }
    let (total, used, available) = (fields[0], fields[1], fields[2]);

    json!({
        "total_bytes": total,
        "used_bytes": used,
        "available_bytes": available,
        "free_bytes": total.saturating_sub(used),
        "percent_used": percent(used, total),
        "total_human": human_size(total),
        "used_human": human_size(used),
        "available_human": human_size(available),
    })
}

fn cpu_info() -> Value {
    let count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let model = std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|c| {
            c.lines()
                .find(|l| l.starts_with("model name"))
                .and_then(|l| l.split_once(':').map(|(_, v)| v.trim().to_string()))
        })
        .unwrap_or_else(|| "unknown".to_string());

    json!({ "count": count, "model": model })
}

fn top_processes(limit: usize, timeout: Duration) -> Value {
    let result = match exec::run_argv(&["ps", "aux", "--sort=-pcpu"], timeout) {
        Ok(r) if r.exit_code == 0 => r,
        Ok(_) | Err(_) => return json!([]),
    };

    let mut processes = Vec::new();
    for line in result.stdout.lines().skip(1).take(limit) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 11 {
            continue;
        }
        let command: String = parts[10..].join(" ").chars().take(80).collect();
        processes.push(json!({
            "user": parts[0],
            "pid": parts[1].parse::<u32>().unwrap_or(0),
            "cpu_percent": parts[2].parse::<f64>().unwrap_or(0.0),
            "memory_percent": parts[3].parse::<f64>().unwrap_or(0.0),
            "vsz": parts[4].parse::<u64>().unwrap_or(0),
            "rss": parts[5].parse::<u64>().unwrap_or(0),
            "command": command,
        }));
    }
    json!(processes)
}

fn network_info(timeout: Duration) -> Value {
    let result = match exec::run_argv(&["ip", "-j", "addr", "show"], timeout) {
        Ok(r) if r.exit_code == 0 => r,
        Ok(_) | Err(_) => return json!({ "error": "Failed to get network info" }),
    };
    let Ok(interfaces) = serde_json::from_str::<Vec<Value>>(&result.stdout) else {
        return json!({ "error": "Failed to get network info" });
    };

    let mut out = Vec::new();
    for iface in interfaces {
        if iface["ifname"] == "lo" {
            continue;
        }
        let addresses: Vec<Value> = iface["addr_info"]
            .as_array()
            .map(|addrs| {
                addrs
                    .iter()
                    .map(|a| {
                        json!({
                            "address": a["local"],
                            "family": a["family"],
                            "prefixlen": a["prefixlen"],
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.push(json!({
            "name": iface["ifname"],
            "state": iface["operstate"],
            "addresses": addresses,
        }));
    }
    json!({ "interfaces": out })
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((used as f64 / total as f64) * 1000.0).round() / 10.0
}

fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}
