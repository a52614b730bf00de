//! Installed-package inventory as seen by the environment's `importlib.metadata`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use pytoolbox_core::{Result, ToolboxError};
use pytoolbox_sandbox::common::{isolated_python, run_captured};

const PACKAGES_HELPER: &str = include_str!("helpers/packages.py");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

/// Distributions visible to `python`. `search_paths` replaces its `sys.path`
/// for discovery when non-empty.
pub fn list_packages(python: &Path, cwd: &Path, search_paths: &[&Path]) -> Result<Vec<PackageInfo>> {
    let mut cmd = isolated_python(python);
    cmd.arg("-c")
        .arg(PACKAGES_HELPER)
        .args(search_paths)
        .current_dir(cwd);
    let out = run_captured(&mut cmd, "package listing", None)?;
    if !out.success {
        return Err(ToolboxError::subprocess("package listing", out.stderr.trim()));
    }
    serde_json::from_str(&out.stdout).map_err(|e| ToolboxError::parse("package listing", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflicts::test_support::dist_info;

    #[test]
    fn test_lists_distributions_on_search_path() {
        let Ok(python) = which::which("python3") else {
            return;
        };
        let site = tempfile::tempdir().unwrap();
        dist_info(site.path(), "alpha", "1.2.3", &[]);
        dist_info(site.path(), "beta", "0.1", &["alpha"]);

        let mut packages = list_packages(&python, site.path(), &[site.path()]).unwrap();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            packages,
            vec![
                PackageInfo { name: "alpha".into(), version: "1.2.3".into() },
                PackageInfo { name: "beta".into(), version: "0.1".into() },
            ]
        );
    }
}
