//! Config structs grouped by concern, loaded from the environment.

use super::env_keys::{execution, observability as obv_keys, paths, tools};
use super::loader::{env_bool, env_optional, env_or, load_dotenv};

/// Workspace and sandbox environment paths
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Workspace override (the CLI flag wins over this)
    pub workspace: Option<String>,
    /// Sandbox environment directory, relative to the workspace root
    pub venv_dir: String,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            workspace: env_optional(paths::PYTOOLBOX_WORKSPACE, &[]),
            venv_dir: env_or(paths::PYTOOLBOX_VENV_DIR, &[], || {
                paths::DEFAULT_VENV_DIR.to_string()
            }),
        }
    }
}

/// Code execution settings
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    /// `None` means block until the child exits.
    pub timeout_secs: Option<u64>,
    /// Interpreter used to create environments; `None` searches PATH.
    pub base_python: Option<String>,
}

impl ExecutionConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        let timeout_secs = env_optional(execution::PYTOOLBOX_EXEC_TIMEOUT_SECS, &[])
            .and_then(|s| match s.parse::<u64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Invalid PYTOOLBOX_EXEC_TIMEOUT_SECS: {}, ignoring", s);
                    None
                }
            })
            .filter(|v| *v > 0);
        Self {
            timeout_secs,
            base_python: env_optional(execution::PYTOOLBOX_PYTHON, execution::PYTHON_ALIASES),
        }
    }
}

/// Which tools the server exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSelection {
    /// Built-in default set
    Default,
    All,
    Only(Vec<String>),
}

impl ToolSelection {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Default;
        }
        if trimmed.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        Self::Only(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub selection: ToolSelection,
}

impl ToolsConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        let selection = env_optional(tools::PYTOOLBOX_ENABLED_TOOLS, &[])
            .map(|s| ToolSelection::parse(&s))
            .unwrap_or(ToolSelection::Default);
        Self { selection }
    }
}

/// Observability: quiet, log_level, log_json, audit_log, security_events_log
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
    pub security_events_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            load_dotenv();
            Self {
                quiet: env_bool(obv_keys::PYTOOLBOX_QUIET, &[], false),
                log_level: env_or(obv_keys::PYTOOLBOX_LOG_LEVEL, &[], || {
                    "pytoolbox=info".to_string()
                }),
                log_json: env_bool(obv_keys::PYTOOLBOX_LOG_JSON, &[], false),
                audit_log: env_optional(obv_keys::PYTOOLBOX_AUDIT_LOG, &[]),
                security_events_log: env_optional(obv_keys::PYTOOLBOX_SECURITY_EVENTS_LOG, &[]),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection_parse() {
        assert_eq!(ToolSelection::parse(""), ToolSelection::Default);
        assert_eq!(ToolSelection::parse(" ALL "), ToolSelection::All);
        assert_eq!(
            ToolSelection::parse("execute_python, read_file,,"),
            ToolSelection::Only(vec!["execute_python".into(), "read_file".into()])
        );
    }
}
