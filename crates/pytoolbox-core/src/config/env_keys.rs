//! Environment variable key constants.

/// Workspace and sandbox environment location
pub mod paths {
    pub const PYTOOLBOX_WORKSPACE: &str = "PYTOOLBOX_WORKSPACE";

    /// Sandbox environment directory, relative to the workspace root.
    pub const PYTOOLBOX_VENV_DIR: &str = "PYTOOLBOX_VENV_DIR";
    pub const DEFAULT_VENV_DIR: &str = ".venv";
}

/// Code execution
pub mod execution {
    /// Seconds before an execution is killed. Unset or 0 disables the timeout.
    pub const PYTOOLBOX_EXEC_TIMEOUT_SECS: &str = "PYTOOLBOX_EXEC_TIMEOUT_SECS";

    /// Base interpreter used to create sandbox environments.
    pub const PYTOOLBOX_PYTHON: &str = "PYTOOLBOX_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["PYTHON"];
}

/// Tool surface
pub mod tools {
    /// Comma-separated tool names, or `all`.
    pub const PYTOOLBOX_ENABLED_TOOLS: &str = "PYTOOLBOX_ENABLED_TOOLS";
}

/// Observability and logging
pub mod observability {
    pub const PYTOOLBOX_QUIET: &str = "PYTOOLBOX_QUIET";
    pub const PYTOOLBOX_LOG_LEVEL: &str = "PYTOOLBOX_LOG_LEVEL";
    pub const PYTOOLBOX_LOG_JSON: &str = "PYTOOLBOX_LOG_JSON";
    pub const PYTOOLBOX_AUDIT_LOG: &str = "PYTOOLBOX_AUDIT_LOG";
    pub const PYTOOLBOX_SECURITY_EVENTS_LOG: &str = "PYTOOLBOX_SECURITY_EVENTS_LOG";
}
