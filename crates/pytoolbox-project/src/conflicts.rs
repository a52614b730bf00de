//! Requirement conflict detection.
//!
//! Requirements are parsed and matched by `packaging` inside the environment
//! (pip's vendored copy when `packaging` itself is not installed), so the
//! verdict is the one pip would reach.

use serde::{Deserialize, Serialize};
use std::path::Path;

use pytoolbox_core::{Result, ToolboxError};
use pytoolbox_sandbox::common::{isolated_python, run_captured};

const CONFLICTS_HELPER: &str = include_str!("helpers/conflicts.py");

/// Exit status of the helper when neither `packaging` nor pip can be imported.
const NO_PACKAGING_EXIT: i32 = 3;

/// `package` declares `requires`, but the installed version falls outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub package: String,
    pub requires: String,
    pub installed: String,
}

pub fn parse_helper_output(json: &str) -> Result<Vec<Conflict>> {
    serde_json::from_str(json).map_err(|e| ToolboxError::parse("conflict report", e))
}

/// Check every declared requirement against what `python` has installed.
///
/// Requirements on packages that are not installed, URL requirements and
/// requirements whose marker does not hold (optional extras included) are
/// ignored, as is metadata that does not parse. Prereleases satisfy a
/// specifier. When a name is installed twice the first entry wins.
///
/// `search_paths` replaces the interpreter's `sys.path` for discovery when
/// non-empty.
pub fn detect_conflicts(python: &Path, cwd: &Path, search_paths: &[&Path]) -> Result<Vec<Conflict>> {
    let mut cmd = isolated_python(python);
    cmd.arg("-c")
        .arg(CONFLICTS_HELPER)
        .args(search_paths)
        .current_dir(cwd);
    let out = run_captured(&mut cmd, "conflict check", None)?;
    if out.exit_code == NO_PACKAGING_EXIT {
        return Err(ToolboxError::subprocess(
            "conflict check",
            format!("{} (install pip or packaging into the environment)", out.stderr.trim()),
        ));
    }
    if !out.success {
        return Err(ToolboxError::subprocess("conflict check", out.stderr.trim()));
    }
    parse_helper_output(&out.stdout)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};
    use std::process::Command;

    /// Host `python3` that can import `packaging` in isolated mode, either
    /// directly or through pip.
    pub fn python_with_packaging() -> Option<PathBuf> {
        let python = which::which("python3").ok()?;
        let ok = Command::new(&python)
            .args([
                "-I",
                "-c",
                "try:\n import packaging.requirements\nexcept ImportError:\n import pip._vendor.packaging.requirements",
            ])
            .output()
            .ok()?
            .status
            .success();
        ok.then_some(python)
    }

    /// Write a minimal `<name>-<version>.dist-info` into `site`.
    pub fn dist_info(site: &Path, name: &str, version: &str, requires: &[&str]) {
        let dir = site.join(format!("{}-{}.dist-info", name, version));
        std::fs::create_dir_all(&dir).unwrap();
        let mut metadata = format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\n",
            name, version
        );
        for req in requires {
            metadata.push_str(&format!("Requires-Dist: {}\n", req));
        }
        std::fs::write(dir.join("METADATA"), metadata).unwrap();
    }
}
