//! Code formatting through external formatters installed in the sandbox.

use std::path::Path;
use std::str::FromStr;

use pytoolbox_core::{Result, ToolboxError};
use pytoolbox_sandbox::common::{isolated_python, run_captured};

/// black exits with 123 when it cannot parse its input.
const BLACK_INVALID_INPUT_EXIT: i32 = 123;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatStyle {
    #[default]
    Black,
    /// autopep8
    Pep8,
}

impl FromStr for FormatStyle {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "black" => Ok(Self::Black),
            "pep8" => Ok(Self::Pep8),
            other => Err(ToolboxError::InvalidArgument(format!(
                "Unsupported style: {}",
                other
            ))),
        }
    }
}

impl FormatStyle {
    fn module_args(self) -> &'static [&'static str] {
        match self {
            Self::Black => &["-m", "black", "--quiet", "-"],
            Self::Pep8 => &["-m", "autopep8", "-"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Pep8 => "autopep8",
        }
    }
}

/// Format `code` by piping it through the formatter for `style`.
///
/// Source black rejects as malformed comes back unchanged.
pub fn format_source(python: &Path, cwd: &Path, code: &str, style: FormatStyle) -> Result<String> {
    let mut cmd = isolated_python(python);
    cmd.args(style.module_args()).current_dir(cwd);
    let out = run_captured(&mut cmd, style.label(), Some(code))?;

    if out.success {
        return Ok(out.stdout);
    }
    if style == FormatStyle::Black && out.exit_code == BLACK_INVALID_INPUT_EXIT {
        tracing::debug!("black rejected input, returning it unchanged");
        return Ok(code.to_string());
    }
    Err(ToolboxError::subprocess(style.label(), out.stderr.trim()))
}
