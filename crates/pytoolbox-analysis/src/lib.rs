//! Python source analysis: structure summaries, formatting and linting.
//!
//! All three delegate to tooling inside the workspace's sandbox environment
//! (`ast`, black/autopep8, pylint); the interpreter is located per call.

pub mod format;
pub mod lint;
pub mod structure;

use pytoolbox_core::{PathGuard, Result, ToolboxError};
use pytoolbox_sandbox::EnvironmentLocator;

pub use format::FormatStyle;
pub use lint::LintIssue;
pub use structure::{ClassInfo, CodeStructure, ExprNode, FunctionInfo, ImportInfo};

#[derive(Debug, Clone)]
pub struct Analyzer {
    guard: PathGuard,
    locator: EnvironmentLocator,
}

impl Analyzer {
    pub fn new(guard: PathGuard, locator: EnvironmentLocator) -> Self {
        Self { guard, locator }
    }

    /// Imports, functions, classes and global names of a workspace file.
    pub fn parse_structure(&self, path: &str) -> Result<CodeStructure> {
        let file = self.guard.validate(path)?;
        if !file.is_file() {
            return Err(ToolboxError::not_found("File", path));
        }
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;
        structure::analyze_file(&python, &file, root)
    }

    pub fn format(&self, code: &str, style: FormatStyle) -> Result<String> {
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;
        format::format_source(&python, root, code, style)
    }

    pub fn lint(&self, path: &str) -> Result<Vec<LintIssue>> {
        let file = self.guard.validate(path)?;
        if !file.is_file() {
            return Err(ToolboxError::not_found("File", path));
        }
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;
        lint::lint_file(&python, &file, root)
    }
}
