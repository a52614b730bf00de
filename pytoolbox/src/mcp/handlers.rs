//! MCP request handlers: initialize and one handler per tool.
//!
//! Handlers return the text placed in the tool result. Structured results
//! are pretty-printed JSON.

use serde_json::{json, Value};

use pytoolbox_analysis::FormatStyle;
use pytoolbox_core::{Result, ToolboxError};
use pytoolbox_fs::WriteMode;
use pytoolbox_project::{DependencySource, EnvStatus};

use super::state::ToolServer;
use super::tools::Tool;

/// Handle the `initialize` request.
pub(super) fn handle_initialize(_params: &Value) -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {},
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": "pytoolbox",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolboxError::InvalidArgument(format!("'{}' is required", key)))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ToolboxError::InvalidArgument(format!(
            "'{}' must be a string",
            key
        ))),
    }
}

fn optional_line(args: &Value, key: &str) -> Result<Option<usize>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .filter(|n| *n >= 1)
            .map(|n| Some(n as usize))
            .ok_or_else(|| {
                ToolboxError::InvalidArgument(format!("'{}' must be a positive integer", key))
            }),
    }
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ToolboxError::parse("tool result", e))
}

/// Dispatch one call to an enabled tool.
pub(super) fn call_tool(server: &ToolServer, tool: Tool, args: &Value) -> Result<String> {
    match tool {
        Tool::ExecutePython => handle_execute_python(server, args),
        Tool::ReadFile => {
            let path = required_str(args, "path")?;
            server.files.read_file(
                path,
                optional_line(args, "start_line")?,
                optional_line(args, "end_line")?,
            )
        }
        Tool::WriteFile => {
            let path = required_str(args, "path")?;
            let content = required_str(args, "content")?;
            let mode: WriteMode = optional_str(args, "mode")?.unwrap_or("w").parse()?;
            server.files.write_file(path, content, mode)?;
            Ok(format!("Wrote {} bytes to {}", content.len(), path))
        }
        Tool::DeleteFile => {
            let path = required_str(args, "path")?;
            server.files.delete_file(path)?;
            Ok(format!("Deleted {}", path))
        }
        Tool::ListDirectory => {
            let path = optional_str(args, "path")?.unwrap_or(".");
            pretty(&server.files.list_directory(path)?)
        }
        Tool::CreateDirectory => {
            let path = required_str(args, "path")?;
            server.files.create_directory(path)?;
            Ok(format!("Created directory {}", path))
        }
        Tool::AnalyzePythonFile => {
            let path = required_str(args, "path")?;
            pretty(&server.analyzer.parse_structure(path)?)
        }
        Tool::FormatCode => {
            let code = required_str(args, "code")?;
            let style: FormatStyle = optional_str(args, "style")?.unwrap_or("black").parse()?;
            server.analyzer.format(code, style)
        }
        Tool::LintCode => {
            let path = required_str(args, "path")?;
            pretty(&server.analyzer.lint(path)?)
        }
        Tool::CreateVenv => handle_create_venv(server),
        Tool::InstallDependencies => {
            let file = optional_str(args, "requirements_file")?;
            let source = server.project.install_dependencies(file)?;
            Ok(describe_install(server, &source))
        }
        Tool::ListPackages => pretty(&server.project.list_installed()?),
        Tool::CheckConflicts => pretty(&server.project.find_conflicts()?),
        Tool::UpdatePackage => {
            let package = required_str(args, "package")?;
            let version = optional_str(args, "version")?;
            server.project.update_package(package, version)?;
            Ok(match version {
                Some(v) => format!("Installed {}=={}", package, v),
                None => format!("Upgraded {}", package),
            })
        }
        Tool::FreezeRequirements => {
            let path = server.project.freeze_requirements()?;
            Ok(format!("Wrote {}", display_relative(server, &path)))
        }
    }
}

fn handle_execute_python(server: &ToolServer, args: &Value) -> Result<String> {
    let code = required_str(args, "code")?;
    let result = server.executor.execute(code, None)?;
    pretty(&result)
}

fn handle_create_venv(server: &ToolServer) -> Result<String> {
    let env_dir = server.locator.env_dir(server.workspace_root());
    let shown = display_relative(server, &env_dir);
    Ok(match server.project.create_environment()? {
        EnvStatus::Created => format!("Created virtual environment at {}", shown),
        EnvStatus::AlreadyPresent => format!("Virtual environment already exists at {}", shown),
    })
}

fn describe_install(server: &ToolServer, source: &DependencySource) -> String {
    match source {
        DependencySource::RequirementsFile(path) => {
            format!("Installed dependencies from {}", display_relative(server, path))
        }
        DependencySource::ProjectManifest { path, dependencies } if dependencies.is_empty() => {
            format!("{} declares no dependencies", display_relative(server, path))
        }
        DependencySource::ProjectManifest { path, dependencies } => format!(
            "Installed {} dependencies from {}",
            dependencies.len(),
            display_relative(server, path)
        ),
    }
}

fn display_relative(server: &ToolServer, path: &std::path::Path) -> String {
    path.strip_prefix(server.workspace_root())
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_advertises_tools() {
        let v = handle_initialize(&json!({}));
        assert_eq!(v["protocolVersion"], "2024-11-05");
        assert_eq!(v["serverInfo"]["name"], "pytoolbox");
        assert!(v["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_argument_helpers() {
        let args = json!({"path": "a.py", "n": 3, "zero": 0, "s": 5, "nil": null});
        assert_eq!(required_str(&args, "path").unwrap(), "a.py");
        assert_eq!(required_str(&args, "missing").unwrap_err().kind(), "invalid_argument");
        assert_eq!(optional_str(&args, "nil").unwrap(), None);
        assert!(optional_str(&args, "s").is_err());
        assert_eq!(optional_line(&args, "n").unwrap(), Some(3));
        assert!(optional_line(&args, "zero").is_err());
        assert!(optional_line(&args, "path").is_err());
        assert_eq!(optional_line(&args, "missing").unwrap(), None);
    }
}
