//! Create the workspace's sandbox environment with `python -m venv`.

use std::path::{Path, PathBuf};

use pytoolbox_core::{Result, ToolboxError};

use super::locator::EnvironmentLocator;
use crate::common::{isolated_python, run_captured};

/// Whether `ensure_environment` had to build anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStatus {
    Created,
    AlreadyPresent,
}

/// Base interpreter used to create environments: `configured` if given
/// (a name on PATH or a path), otherwise the first of `python3`, `python`.
pub fn which_python(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = configured {
        return which::which(name).map_err(|e| {
            ToolboxError::not_found("Python interpreter", format!("{} ({})", name, e))
        });
    }
    which::which("python3")
        .or_else(|_| which::which("python"))
        .map_err(|_| ToolboxError::not_found("Python interpreter", "python3 or python on PATH"))
}

/// Create `<root>/<venv_dir>` unless it already exists.
///
/// An existing environment directory is left alone even if it is broken;
/// the executor reports a missing interpreter in that case.
pub fn ensure_environment(
    workspace_root: &Path,
    locator: &EnvironmentLocator,
    base_python: Option<&str>,
) -> Result<EnvStatus> {
    let env_path = locator.env_dir(workspace_root);
    if env_path.exists() {
        tracing::debug!("Environment already present at {}", env_path.display());
        return Ok(EnvStatus::AlreadyPresent);
    }

    let python = which_python(base_python)?;
    tracing::info!(
        "Creating virtual environment at {} with {}",
        env_path.display(),
        python.display()
    );
    let mut cmd = isolated_python(&python);
    cmd.arg("-m")
        .arg("venv")
        .arg(&env_path)
        .current_dir(workspace_root);
    let out = run_captured(&mut cmd, "venv", None)?;
    if !out.success {
        return Err(ToolboxError::subprocess("venv", out.stderr.trim()));
    }
    Ok(EnvStatus::Created)
}
