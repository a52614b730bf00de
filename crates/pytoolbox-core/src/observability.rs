//! Observability: tracing init, audit log, security events.
//!
//! Uses config::ObservabilityConfig for PYTOOLBOX_QUIET, LOG_LEVEL, AUDIT_LOG, etc.
//! Every log line goes to stderr: stdout carries protocol frames.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing_subscriber::{prelude::*, EnvFilter};

static AUDIT_PATH: Mutex<Option<String>> = Mutex::new(None);
static SECURITY_EVENTS_PATH: Mutex<Option<String>> = Mutex::new(None);

/// Initialize tracing. Call at process startup.
/// When PYTOOLBOX_QUIET=1, only WARN and above are logged. RUST_LOG wins over both.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "pytoolbox=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

/// SHA-256 hex digest of submitted source, recorded instead of the code itself.
pub fn code_hash(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

fn cached_path(slot: &Mutex<Option<String>>, configured: Option<&String>) -> Option<String> {
    {
        let guard = slot.lock().ok()?;
        if let Some(ref p) = *guard {
            return Some(p.clone());
        }
    }
    let path = configured?.clone();
    if path.is_empty() {
        return None;
    }
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    {
        let mut guard = slot.lock().ok()?;
        *guard = Some(path.clone());
    }
    Some(path)
}

fn get_audit_path() -> Option<String> {
    let cfg = crate::config::ObservabilityConfig::from_env();
    cached_path(&AUDIT_PATH, cfg.audit_log.as_ref())
}

fn get_security_events_path() -> Option<String> {
    let cfg = crate::config::ObservabilityConfig::from_env();
    cached_path(&SECURITY_EVENTS_PATH, cfg.security_events_log.as_ref())
}

fn append_jsonl(path: &str, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Audit: execution_started (right before spawn)
pub fn audit_execution_started(code_hash: &str, interpreter: &Path, script: &Path, cwd: &Path) {
    tracing::debug!(
        interpreter = %interpreter.display(),
        cwd = %cwd.display(),
        "execution started"
    );
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now(),
            "event": "execution_started",
            "code_hash": code_hash,
            "interpreter": interpreter.to_string_lossy(),
            "script": script.to_string_lossy(),
            "cwd": cwd.to_string_lossy(),
        });
        append_jsonl(&path, &record);
    }
}

/// Audit: execution_completed
pub fn audit_execution_completed(
    code_hash: &str,
    exit_code: i32,
    duration_ms: u64,
    stdout_len: usize,
    stderr_len: usize,
) {
    tracing::debug!(exit_code, duration_ms, "execution completed");
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now(),
            "event": "execution_completed",
            "code_hash": code_hash,
            "exit_code": exit_code,
            "duration_ms": duration_ms,
            "stdout_len": stdout_len,
            "stderr_len": stderr_len,
            "success": exit_code == 0,
        });
        append_jsonl(&path, &record);
    }
}

/// Security event: a path resolved outside the workspace root
pub fn security_path_rejected(requested: &str, root: &Path) {
    tracing::warn!(
        "Rejected path outside workspace: {} (root: {})",
        requested,
        root.display()
    );
    let record = json!({
        "ts": now(),
        "event": "path_rejected",
        "requested": requested,
        "root": root.to_string_lossy(),
    });
    if let Some(path) = get_security_events_path() {
        append_jsonl(&path, &record);
    }
    if let Some(path) = get_audit_path() {
        append_jsonl(&path, &record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_hash_is_stable_hex() {
        let h = code_hash("print('hi')");
        assert_eq!(h.len(), 64);
        assert_eq!(h, code_hash("print('hi')"));
        assert_ne!(h, code_hash("print('bye')"));
    }

    #[test]
    fn test_append_jsonl_writes_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
        let p = path.to_string_lossy().to_string();
        append_jsonl(&p, &json!({"event": "a"}));
        append_jsonl(&p, &json!({"event": "b"}));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"b\""));
    }
}
