//! Error taxonomy shared by every pytoolbox component.
//!
//! Infrastructure failures are raised as [`ToolboxError`]. A non-zero exit code
//! from executed user code is *not* an error: it is part of the result payload.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolboxError>;

#[derive(Debug, Error)]
pub enum ToolboxError {
    /// The resolved path does not live under the workspace root.
    #[error("Path {path} is outside workspace root {root}")]
    PathEscape { path: String, root: PathBuf },

    /// Missing file, directory or manifest.
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: String },

    /// The sandbox environment has no interpreter at the expected location.
    #[error("Python executable not found in virtual environment: {}", .0.display())]
    InterpreterNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Spawn failure, wait failure, or a collaborator tool exiting unsuccessfully.
    #[error("{command} failed: {message}")]
    Subprocess { command: String, message: String },

    #[error("Execution exceeded timeout of {0:?}")]
    Timeout(Duration),

    /// Collaborator output or a manifest could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ToolboxError {
    /// Stable snake_case kind, surfaced to tool callers next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PathEscape { .. } => "path_escape",
            Self::NotFound { .. } | Self::InterpreterNotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Subprocess { .. } => "subprocess_failure",
            Self::Timeout(_) => "timeout",
            Self::Parse { .. } => "parse",
            Self::Io(_) => "io",
        }
    }

    pub fn not_found(what: &'static str, path: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    pub fn subprocess(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subprocess {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_not_found_is_not_found_kind() {
        let err = ToolboxError::InterpreterNotFound(PathBuf::from("/ws/.venv/bin/python"));
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("/ws/.venv/bin/python"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ToolboxError = io.into();
        assert_eq!(err.kind(), "io");
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn test_subprocess_message() {
        let err = ToolboxError::subprocess("pip install", "exit status 1");
        assert_eq!(err.kind(), "subprocess_failure");
        assert_eq!(err.to_string(), "pip install failed: exit status 1");
    }

    #[test]
    fn test_timeout_keeps_subsecond_limit() {
        let err = ToolboxError::Timeout(Duration::from_millis(300));
        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.to_string(), "Execution exceeded timeout of 300ms");
    }
}
