//! Lint a file with pylint and parse its text report.

use serde::Serialize;
use std::path::Path;

use pytoolbox_core::{Result, ToolboxError};
use pytoolbox_sandbox::common::{isolated_python, run_captured};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub path: String,
    pub line: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Parse pylint's colon-delimited text report.
///
/// Lines without `:` or with fewer than three fields are skipped. The message
/// is every field after the third rejoined with `:`, so colons inside the
/// message survive.
pub fn parse_lint_report(report: &str) -> Vec<LintIssue> {
    report
        .lines()
        .filter(|line| line.contains(':'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(':').collect();
            if parts.len() < 3 {
                return None;
            }
            Some(LintIssue {
                path: parts[0].to_string(),
                line: parts[1].to_string(),
                kind: parts[2].to_string(),
                message: parts[3..].join(":").trim().to_string(),
            })
        })
        .collect()
}

/// Run pylint on `file` (already validated).
///
/// pylint's exit status is a bit mask of message categories, so a non-zero
/// status with a report is a normal result. A failure with no report at all
/// means pylint itself did not run.
pub fn lint_file(python: &Path, file: &Path, cwd: &Path) -> Result<Vec<LintIssue>> {
    let mut cmd = isolated_python(python);
    cmd.args(["-m", "pylint"]).arg(file).current_dir(cwd);
    let out = run_captured(&mut cmd, "pylint", None)?;
    if !out.success && out.stdout.trim().is_empty() {
        return Err(ToolboxError::subprocess("pylint", out.stderr.trim()));
    }
    Ok(parse_lint_report(&out.stdout))
}
