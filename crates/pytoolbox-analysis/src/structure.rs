//! Structural summary of a Python source file.
//!
//! Parsing is done by the sandbox interpreter's own `ast` module through a
//! small embedded helper that prints JSON. Decorator and base-class
//! expressions come back as [`ExprNode`] and are rendered here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use pytoolbox_core::{Result, ToolboxError};
use pytoolbox_sandbox::common::{isolated_python, run_captured};

const STRUCTURE_HELPER: &str = include_str!("helpers/structure.py");

/// Exit code the helper uses for a source file that does not parse.
const SYNTAX_ERROR_EXIT: i32 = 2;

/// Expression node kinds that can appear in decorator or base-class position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExprNode {
    Name { id: String },
    Attribute { value: Box<ExprNode>, attr: String },
    /// `@decorator(...)`: rendered as the callee, arguments dropped.
    Call { func: Box<ExprNode> },
    Other { text: String },
}

impl ExprNode {
    /// Dotted display form: `name`, `module.attr`, or the callee of a call.
    pub fn render(&self) -> String {
        match self {
            Self::Name { id } => id.clone(),
            Self::Attribute { value, attr } => format!("{}.{}", value.render(), attr),
            Self::Call { func } => func.render(),
            Self::Other { text } => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// `module` or `module.name` for from-imports.
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub args: Vec<String>,
    pub decorators: Vec<String>,
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<String>,
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeStructure {
    pub imports: Vec<ImportInfo>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub global_variables: Vec<String>,
}

// Wire shapes emitted by the helper, before expression rendering.

#[derive(Deserialize)]
struct RawFunction {
    name: String,
    args: Vec<String>,
    decorators: Vec<ExprNode>,
    docstring: Option<String>,
}

#[derive(Deserialize)]
struct RawClass {
    name: String,
    bases: Vec<ExprNode>,
    methods: Vec<String>,
    docstring: Option<String>,
}

#[derive(Deserialize)]
struct RawStructure {
    imports: Vec<ImportInfo>,
    functions: Vec<RawFunction>,
    classes: Vec<RawClass>,
    global_variables: Vec<String>,
}

impl From<RawStructure> for CodeStructure {
    fn from(raw: RawStructure) -> Self {
        let render_all =
            |nodes: Vec<ExprNode>| -> Vec<String> { nodes.iter().map(ExprNode::render).collect() };
        Self {
            imports: raw.imports,
            functions: raw
                .functions
                .into_iter()
                .map(|f| FunctionInfo {
                    name: f.name,
                    args: f.args,
                    decorators: render_all(f.decorators),
                    docstring: f.docstring,
                })
                .collect(),
            classes: raw
                .classes
                .into_iter()
                .map(|c| ClassInfo {
                    name: c.name,
                    bases: render_all(c.bases),
                    methods: c.methods,
                    docstring: c.docstring,
                })
                .collect(),
            global_variables: raw.global_variables,
        }
    }
}

/// Decode the helper's JSON output.
pub fn parse_helper_output(json: &str) -> Result<CodeStructure> {
    let raw: RawStructure =
        serde_json::from_str(json).map_err(|e| ToolboxError::parse("structure summary", e))?;
    Ok(raw.into())
}

/// Summarize `file` (already validated) with `python`.
pub fn analyze_file(python: &Path, file: &Path, cwd: &Path) -> Result<CodeStructure> {
    let mut cmd = isolated_python(python);
    cmd.arg("-c")
        .arg(STRUCTURE_HELPER)
        .arg(file)
        .current_dir(cwd);
    let out = run_captured(&mut cmd, "structure analysis", None)?;
    if out.exit_code == SYNTAX_ERROR_EXIT {
        return Err(ToolboxError::parse(
            format!("Python source {}", file.display()),
            out.stderr.trim(),
        ));
    }
    if !out.success {
        return Err(ToolboxError::subprocess(
            "structure analysis",
            out.stderr.trim(),
        ));
    }
    parse_helper_output(&out.stdout)
}
