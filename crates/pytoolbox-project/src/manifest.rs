//! Where dependencies come from: an explicit file, `requirements.txt`, or
//! the `project.dependencies` table of `pyproject.toml`.

use serde::Deserialize;
use std::path::PathBuf;

use pytoolbox_core::{PathGuard, Result, ToolboxError};

pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const PROJECT_MANIFEST: &str = "pyproject.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// Handed to `pip install -r`.
    RequirementsFile(PathBuf),
    /// Specifier strings from `pyproject.toml`, handed to `pip install` directly.
    ProjectManifest {
        path: PathBuf,
        dependencies: Vec<String>,
    },
}

#[derive(Deserialize)]
struct PyProject {
    project: Option<ProjectTable>,
}

#[derive(Deserialize)]
struct ProjectTable {
    dependencies: Option<Vec<String>>,
}

/// `project.dependencies` from a `pyproject.toml` document, if declared.
pub fn project_dependencies(content: &str) -> Result<Option<Vec<String>>> {
    let doc: PyProject =
        toml::from_str(content).map_err(|e| ToolboxError::parse(PROJECT_MANIFEST, e))?;
    Ok(doc.project.and_then(|p| p.dependencies))
}

/// Resolve the dependency source in order: `explicit` file, the root
/// `requirements.txt`, the root `pyproject.toml`.
pub fn resolve_dependency_source(
    guard: &PathGuard,
    explicit: Option<&str>,
) -> Result<DependencySource> {
    if let Some(file) = explicit {
        let path = guard.validate(file)?;
        if !path.is_file() {
            return Err(ToolboxError::not_found("Requirements file", file));
        }
        return Ok(DependencySource::RequirementsFile(path));
    }

    let requirements = guard.validate(REQUIREMENTS_FILE)?;
    if requirements.is_file() {
        return Ok(DependencySource::RequirementsFile(requirements));
    }

    let manifest = guard.validate(PROJECT_MANIFEST)?;
    if manifest.is_file() {
        let content = std::fs::read_to_string(&manifest)?;
        if let Some(dependencies) = project_dependencies(&content)? {
            return Ok(DependencySource::ProjectManifest {
                path: manifest,
                dependencies,
            });
        }
    }

    Err(ToolboxError::not_found(
        "Dependency manifest",
        format!(
            "no {} or {} with [project].dependencies",
            REQUIREMENTS_FILE, PROJECT_MANIFEST
        ),
    ))
}
