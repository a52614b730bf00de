//! ToolServer: the components bound to one workspace plus the enabled tools.

use std::path::Path;

use pytoolbox_analysis::Analyzer;
use pytoolbox_core::config::{ExecutionConfig, PathsConfig, ToolSelection, ToolsConfig};
use pytoolbox_core::{PathGuard, WorkspaceRoot};
use pytoolbox_fs::FileOperations;
use pytoolbox_project::ProjectManager;
use pytoolbox_sandbox::{EnvironmentLocator, Executor};

use super::tools::{enabled_tools, Tool};

pub struct ToolServer {
    pub(super) root: WorkspaceRoot,
    pub(super) locator: EnvironmentLocator,
    pub(super) files: FileOperations,
    pub(super) analyzer: Analyzer,
    pub(super) project: ProjectManager,
    pub(super) executor: Executor,
    enabled: Vec<Tool>,
}

impl ToolServer {
    pub fn new(
        root: WorkspaceRoot,
        paths: &PathsConfig,
        execution: &ExecutionConfig,
        selection: &ToolSelection,
    ) -> Self {
        let guard = PathGuard::new(root.clone());
        let locator = EnvironmentLocator::from_config(paths);
        Self {
            files: FileOperations::new(guard.clone()),
            analyzer: Analyzer::new(guard.clone(), locator.clone()),
            project: ProjectManager::new(guard.clone(), locator.clone()).with_config(execution),
            executor: Executor::new(guard, locator.clone()).with_config(execution),
            locator,
            enabled: enabled_tools(selection),
            root,
        }
    }

    /// Build from the environment-backed config layer.
    pub fn from_env(root: WorkspaceRoot) -> Self {
        Self::new(
            root,
            &PathsConfig::from_env(),
            &ExecutionConfig::from_env(),
            &ToolsConfig::from_env().selection,
        )
    }

    pub fn workspace_root(&self) -> &Path {
        self.root.path()
    }

    pub fn enabled(&self) -> &[Tool] {
        &self.enabled
    }

    pub fn is_enabled(&self, tool: Tool) -> bool {
        self.enabled.contains(&tool)
    }
}
