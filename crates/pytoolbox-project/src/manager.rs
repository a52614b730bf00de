//! ProjectManager: the workspace's sandbox environment and its packages.
//!
//! Every pip invocation runs as `<env python> -m pip ...` with the workspace
//! root as working directory. Nothing here locks the environment; a
//! concurrent install and execution can race.

use std::ffi::OsStr;
use std::path::PathBuf;

use pytoolbox_core::config::ExecutionConfig;
use pytoolbox_core::{PathGuard, Result, ToolboxError};
use pytoolbox_sandbox::common::{isolated_python, run_captured, CapturedOutput};
use pytoolbox_sandbox::env::builder::{ensure_environment, EnvStatus};
use pytoolbox_sandbox::EnvironmentLocator;

use crate::conflicts::{detect_conflicts, Conflict};
use crate::inventory::{list_packages, PackageInfo};
use crate::manifest::{resolve_dependency_source, DependencySource, REQUIREMENTS_FILE};

#[derive(Debug, Clone)]
pub struct ProjectManager {
    guard: PathGuard,
    locator: EnvironmentLocator,
    base_python: Option<String>,
}

impl ProjectManager {
    pub fn new(guard: PathGuard, locator: EnvironmentLocator) -> Self {
        Self {
            guard,
            locator,
            base_python: None,
        }
    }

    pub fn with_config(mut self, cfg: &ExecutionConfig) -> Self {
        self.base_python = cfg.base_python.clone();
        self
    }

    /// Create the environment; a no-op when its directory already exists.
    pub fn create_environment(&self) -> Result<EnvStatus> {
        ensure_environment(
            self.guard.root().path(),
            &self.locator,
            self.base_python.as_deref(),
        )
    }

    /// Install from `requirements_file`, else `requirements.txt`, else
    /// `pyproject.toml`. Returns the source that was used.
    pub fn install_dependencies(&self, requirements_file: Option<&str>) -> Result<DependencySource> {
        let source = resolve_dependency_source(&self.guard, requirements_file)?;
        match &source {
            DependencySource::RequirementsFile(path) => {
                tracing::info!("Installing dependencies from {}", path.display());
                self.pip(&[OsStr::new("install"), OsStr::new("-r"), path.as_os_str()])?;
            }
            DependencySource::ProjectManifest { path, dependencies } => {
                if dependencies.is_empty() {
                    tracing::info!("{} declares no dependencies", path.display());
                    return Ok(source);
                }
                tracing::info!(
                    "Installing {} dependencies from {}",
                    dependencies.len(),
                    path.display()
                );
                if let Some(option) = dependencies.iter().find(|d| d.trim_start().starts_with('-')) {
                    return Err(ToolboxError::InvalidArgument(format!(
                        "Dependency '{}' in {} looks like a pip option",
                        option,
                        path.display()
                    )));
                }
                let mut args = vec!["install"];
                args.extend(dependencies.iter().map(String::as_str));
                self.pip(&args)?;
            }
        }
        Ok(source)
    }

    /// Upgrade `name`, pinned to `version` when given.
    pub fn update_package(&self, name: &str, version: Option<&str>) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
            return Err(ToolboxError::InvalidArgument(format!(
                "Invalid package name: '{}'",
                name
            )));
        }
        let target = match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => format!("{}=={}", name, v),
            None => name.to_string(),
        };
        self.pip(&["install", "--upgrade", target.as_str()])?;
        Ok(())
    }

    /// Write `pip freeze` output to `<root>/requirements.txt`.
    pub fn freeze_requirements(&self) -> Result<PathBuf> {
        let out = self.pip(&["freeze"])?;
        let path = self.guard.validate(REQUIREMENTS_FILE)?;
        std::fs::write(&path, out.stdout)?;
        Ok(path)
    }

    /// Distributions installed in the environment.
    pub fn list_installed(&self) -> Result<Vec<PackageInfo>> {
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;
        list_packages(&python, root, &[])
    }

    pub fn find_conflicts(&self) -> Result<Vec<Conflict>> {
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;
        detect_conflicts(&python, root, &[])
    }

    fn pip<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<CapturedOutput> {
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;
        let label = format!(
            "pip {}",
            args.first()
                .map(|a| a.as_ref().to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        let mut cmd = isolated_python(&python);
        cmd.args(["-m", "pip"]).args(args).current_dir(root);
        let out = run_captured(&mut cmd, &label, None)?;
        if !out.success {
            return Err(ToolboxError::subprocess(label, out.stderr.trim()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pytoolbox_core::WorkspaceRoot;
    use std::path::Path;

    fn fake_venv(root: &Path) -> Option<()> {
        let host = which::which("python3").ok()?;
        let interpreter = EnvironmentLocator::default().interpreter_path(root);
        std::fs::create_dir_all(interpreter.parent()?).ok()?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&host, &interpreter).ok()?;
        #[cfg(windows)]
        std::fs::copy(&host, &interpreter).ok()?;
        Some(())
    }

    fn manager() -> (tempfile::TempDir, ProjectManager) {
        let tmp = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(WorkspaceRoot::new(tmp.path()).unwrap());
        (tmp, ProjectManager::new(guard, EnvironmentLocator::default()))
    }

    #[test]
    fn test_operations_need_environment() {
        let (tmp, pm) = manager();
        std::fs::write(tmp.path().join("requirements.txt"), "six\n").unwrap();
        assert!(matches!(
            pm.install_dependencies(None).unwrap_err(),
            ToolboxError::InterpreterNotFound(_)
        ));
        assert!(matches!(
            pm.list_installed().unwrap_err(),
            ToolboxError::InterpreterNotFound(_)
        ));
        assert_eq!(pm.freeze_requirements().unwrap_err().kind(), "not_found");
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let (_tmp, pm) = manager();
        let err = pm.install_dependencies(None).unwrap_err();
        assert!(matches!(err, ToolboxError::NotFound { .. }));
    }

    #[test]
    fn test_empty_pyproject_dependencies_is_noop() {
        let (tmp, pm) = manager();
        std::fs::write(
            tmp.path().join("pyproject.toml"),
            "[project]\nname = \"x\"\ndependencies = []\n",
        )
        .unwrap();
        // No environment exists, so reaching pip would fail.
        assert!(matches!(
            pm.install_dependencies(None).unwrap(),
            DependencySource::ProjectManifest { .. }
        ));
    }

    #[test]
    fn test_update_package_rejects_bad_names() {
        let (_tmp, pm) = manager();
        for bad in ["", "  ", "--index-url=http://evil", "a b"] {
            assert_eq!(
                pm.update_package(bad, None).unwrap_err().kind(),
                "invalid_argument",
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_create_environment_existing_dir_is_noop() {
        let (tmp, pm) = manager();
        std::fs::create_dir(tmp.path().join(".venv")).unwrap();
        assert_eq!(pm.create_environment().unwrap(), EnvStatus::AlreadyPresent);
    }

    #[test]
    fn test_pyproject_options_are_rejected() {
        let (tmp, pm) = manager();
        std::fs::write(
            tmp.path().join("pyproject.toml"),
            "[project]\nname = \"x\"\ndependencies = [\"six\", \"--index-url=http://evil\"]\n",
        )
        .unwrap();
        // Rejected before the environment is even looked up.
        let err = pm.install_dependencies(None).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(err.to_string().contains("--index-url=http://evil"));
    }

    #[test]
    fn test_list_installed_with_host_python() {
        let (tmp, pm) = manager();
        if fake_venv(tmp.path()).is_none() {
            eprintln!("python3 not available, skipping");
            return;
        }
        let packages = pm.list_installed().unwrap();
        assert!(packages.iter().all(|p| !p.name.is_empty()));
    }

    #[test]
    fn test_helpers_ignore_workspace_modules() {
        let (tmp, pm) = manager();
        if fake_venv(tmp.path()).is_none() {
            return;
        }
        let marker = tmp.path().join("IMPORTED");
        let shadow = format!(
            "open({:?}, 'w').write('x')\nraise SystemExit(9)\n",
            marker.to_string_lossy()
        );
        std::fs::write(tmp.path().join("json.py"), &shadow).unwrap();
        std::fs::write(tmp.path().join("importlib.py"), &shadow).unwrap();

        pm.list_installed().unwrap();
        // May fail when the host has neither packaging nor pip; must not import the workspace.
        let _ = pm.find_conflicts();
        assert!(!marker.exists());
    }
}
