//! MCP tool definitions and the enabled-tool selection.

use serde_json::{json, Value};

use pytoolbox_core::config::ToolSelection;

/// Every tool the server knows. Only the enabled subset is listed or callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    ExecutePython,
    ReadFile,
    WriteFile,
    DeleteFile,
    ListDirectory,
    CreateDirectory,
    AnalyzePythonFile,
    FormatCode,
    LintCode,
    CreateVenv,
    InstallDependencies,
    ListPackages,
    CheckConflicts,
    UpdatePackage,
    FreezeRequirements,
}

/// Enabled when `PYTOOLBOX_ENABLED_TOOLS` is unset.
pub const DEFAULT_ENABLED_TOOLS: &[Tool] = &[Tool::ExecutePython];

impl Tool {
    pub const ALL: [Tool; 15] = [
        Tool::ExecutePython,
        Tool::ReadFile,
        Tool::WriteFile,
        Tool::DeleteFile,
        Tool::ListDirectory,
        Tool::CreateDirectory,
        Tool::AnalyzePythonFile,
        Tool::FormatCode,
        Tool::LintCode,
        Tool::CreateVenv,
        Tool::InstallDependencies,
        Tool::ListPackages,
        Tool::CheckConflicts,
        Tool::UpdatePackage,
        Tool::FreezeRequirements,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::ExecutePython => "execute_python",
            Tool::ReadFile => "read_file",
            Tool::WriteFile => "write_file",
            Tool::DeleteFile => "delete_file",
            Tool::ListDirectory => "list_directory",
            Tool::CreateDirectory => "create_directory",
            Tool::AnalyzePythonFile => "analyze_python_file",
            Tool::FormatCode => "format_code",
            Tool::LintCode => "lint_code",
            Tool::CreateVenv => "create_venv",
            Tool::InstallDependencies => "install_dependencies",
            Tool::ListPackages => "list_packages",
            Tool::CheckConflicts => "check_conflicts",
            Tool::UpdatePackage => "update_package",
            Tool::FreezeRequirements => "freeze_requirements",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.name() == name)
    }

    /// MCP tool definition with its JSON input schema.
    pub fn definition(self) -> Value {
        let (description, properties, required): (&str, Value, Vec<&str>) = match self {
            Tool::ExecutePython => (
                "Execute Python code in the workspace's virtual environment. Returns stdout, stderr and exit_code; a non-zero exit code is a normal result.",
                json!({
                    "code": {"type": "string", "description": "Python source to run"}
                }),
                vec!["code"],
            ),
            Tool::ReadFile => (
                "Read the contents of a file",
                json!({
                    "path": {"type": "string", "description": "File path relative to the workspace root"},
                    "start_line": {"type": "integer", "description": "First line to return (1-based, inclusive)"},
                    "end_line": {"type": "integer", "description": "Last line to return (1-based, inclusive)"}
                }),
                vec!["path"],
            ),
            Tool::WriteFile => (
                "Write content to a file",
                json!({
                    "path": {"type": "string", "description": "File path relative to the workspace root"},
                    "content": {"type": "string", "description": "Content to write"},
                    "mode": {"type": "string", "enum": ["w", "a"], "description": "'w' to overwrite (default), 'a' to append"}
                }),
                vec!["path", "content"],
            ),
            Tool::DeleteFile => (
                "Delete a file",
                json!({
                    "path": {"type": "string", "description": "File path relative to the workspace root"}
                }),
                vec!["path"],
            ),
            Tool::ListDirectory => (
                "List contents of a directory",
                json!({
                    "path": {"type": "string", "description": "Directory path relative to the workspace root (default: '.')"}
                }),
                vec![],
            ),
            Tool::CreateDirectory => (
                "Create a directory, including missing parents",
                json!({
                    "path": {"type": "string", "description": "Directory path relative to the workspace root"}
                }),
                vec!["path"],
            ),
            Tool::AnalyzePythonFile => (
                "Analyze the structure of a Python file",
                json!({
                    "path": {"type": "string", "description": "Python file relative to the workspace root"}
                }),
                vec!["path"],
            ),
            Tool::FormatCode => (
                "Format Python code according to style guidelines",
                json!({
                    "code": {"type": "string", "description": "Python source to format"},
                    "style": {"type": "string", "enum": ["black", "pep8"], "description": "Formatter (default: black)"}
                }),
                vec!["code"],
            ),
            Tool::LintCode => (
                "Run linting on Python code",
                json!({
                    "path": {"type": "string", "description": "Python file relative to the workspace root"}
                }),
                vec!["path"],
            ),
            Tool::CreateVenv => ("Create a virtual environment", json!({}), vec![]),
            Tool::InstallDependencies => (
                "Install project dependencies",
                json!({
                    "requirements_file": {"type": "string", "description": "Requirements file relative to the workspace root (default: requirements.txt, then pyproject.toml)"}
                }),
                vec![],
            ),
            Tool::ListPackages => ("List installed packages", json!({}), vec![]),
            Tool::CheckConflicts => ("Check for dependency conflicts", json!({}), vec![]),
            Tool::UpdatePackage => (
                "Upgrade a package to the latest or a specific version",
                json!({
                    "package": {"type": "string", "description": "Package name"},
                    "version": {"type": "string", "description": "Exact version to install"}
                }),
                vec!["package"],
            ),
            Tool::FreezeRequirements => (
                "Write requirements.txt from the installed packages",
                json!({}),
                vec![],
            ),
        };
        json!({
            "name": self.name(),
            "description": description,
            "inputSchema": {
                "type": "object",
                "properties": properties,
                "required": required
            }
        })
    }
}

/// Resolve the configured selection to a sorted, de-duplicated tool list.
/// Unknown names are logged and dropped.
pub fn enabled_tools(selection: &ToolSelection) -> Vec<Tool> {
    let mut tools: Vec<Tool> = match selection {
        ToolSelection::Default => DEFAULT_ENABLED_TOOLS.to_vec(),
        ToolSelection::All => Tool::ALL.to_vec(),
        ToolSelection::Only(names) => names
            .iter()
            .filter_map(|n| {
                let tool = Tool::from_name(n);
                if tool.is_none() {
                    tracing::warn!("Ignoring unknown tool in PYTOOLBOX_ENABLED_TOOLS: {}", n);
                }
                tool
            })
            .collect(),
    };
    tools.sort();
    tools.dedup();
    tools
}
