//! Locate the interpreter inside the workspace's sandbox environment.
//!
//! There is deliberately no fallback to a system-wide interpreter: if the
//! environment is missing, locating fails.

use std::path::{Path, PathBuf};

use pytoolbox_core::config::env_keys::paths::DEFAULT_VENV_DIR;
use pytoolbox_core::config::PathsConfig;
use pytoolbox_core::{Result, ToolboxError};

/// The two fixed virtual environment layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvLayout {
    /// `bin/python`
    Posix,
    /// `Scripts/python.exe`
    Windows,
}

impl EnvLayout {
    /// Layout used by environments created on this host.
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn bin_dir(self) -> &'static str {
        match self {
            Self::Posix => "bin",
            Self::Windows => "Scripts",
        }
    }

    pub fn interpreter(self) -> PathBuf {
        match self {
            Self::Posix => Path::new("bin").join("python"),
            Self::Windows => Path::new("Scripts").join("python.exe"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentLocator {
    /// Environment directory relative to the workspace root.
    venv_dir: PathBuf,
}

impl Default for EnvironmentLocator {
    fn default() -> Self {
        Self::new(DEFAULT_VENV_DIR)
    }
}

impl EnvironmentLocator {
    pub fn new(venv_dir: impl Into<PathBuf>) -> Self {
        Self {
            venv_dir: venv_dir.into(),
        }
    }

    pub fn from_config(cfg: &PathsConfig) -> Self {
        Self::new(&cfg.venv_dir)
    }

    pub fn env_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.venv_dir)
    }

    /// Where the interpreter is expected on this host, whether or not it exists.
    pub fn interpreter_path(&self, workspace_root: &Path) -> PathBuf {
        self.env_dir(workspace_root).join(EnvLayout::host().interpreter())
    }

    /// Resolve the interpreter, failing with `InterpreterNotFound` when absent.
    /// Checked on every call.
    pub fn locate_interpreter(&self, workspace_root: &Path) -> Result<PathBuf> {
        let python = self.interpreter_path(workspace_root);
        if !python.is_file() {
            return Err(ToolboxError::InterpreterNotFound(python));
        }
        Ok(python)
    }
}
