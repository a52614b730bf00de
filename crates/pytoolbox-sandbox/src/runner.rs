//! The executor: run arbitrary Python source inside the workspace's sandbox
//! environment and report what it printed.
//!
//! One call = one staged script + one child process. A non-zero exit code is
//! data in [`ExecutionResult`]; only infrastructure failures are errors. The
//! staged script is removed on every exit path, including early aborts.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use pytoolbox_core::config::ExecutionConfig;
use pytoolbox_core::{observability, PathGuard, Result, ToolboxError};

use crate::common::{isolate_process_group, wait_with_output};
use crate::env::locator::EnvironmentLocator;

const STAGED_PREFIX: &str = "pytoolbox-exec-";
const STAGED_SUFFIX: &str = ".py";

/// Source to run plus an optional working directory inside the workspace.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub code: String,
    pub working_dir: Option<String>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Execution result from the sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Ephemeral, uniquely named script file. Deleted when dropped.
struct StagedScript {
    path: tempfile::TempPath,
}

impl StagedScript {
    fn create(code: &str, staging_dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGED_PREFIX).suffix(STAGED_SUFFIX);
        let mut file = match staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(code.as_bytes())?;
        file.flush()?;
        // Close our handle so the interpreter can open the file on every platform;
        // the TempPath still owns deletion.
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Delete now and report failures; dropping also deletes but stays silent.
    fn remove(self) -> Result<()> {
        self.path.close()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Executor {
    guard: PathGuard,
    locator: EnvironmentLocator,
    timeout: Option<Duration>,
    staging_dir: Option<PathBuf>,
}

impl Executor {
    pub fn new(guard: PathGuard, locator: EnvironmentLocator) -> Self {
        Self {
            guard,
            locator,
            timeout: None,
            staging_dir: None,
        }
    }

    pub fn with_config(self, cfg: &ExecutionConfig) -> Self {
        self.with_timeout(cfg.timeout_secs.map(Duration::from_secs))
    }

    /// `None` blocks until the script exits.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stage scripts here instead of the host temp directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Run `code` with the sandbox interpreter.
    pub fn execute(&self, code: &str, working_dir: Option<&str>) -> Result<ExecutionResult> {
        let staged = StagedScript::create(code, self.staging_dir.as_deref())?;
        // `staged` is dropped (and the file removed) on every early return below.
        let result = self.run_staged(code, &staged, working_dir)?;
        staged.remove()?;
        Ok(result)
    }

    pub fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.execute(&request.code, request.working_dir.as_deref())
    }

    fn run_staged(
        &self,
        code: &str,
        staged: &StagedScript,
        working_dir: Option<&str>,
    ) -> Result<ExecutionResult> {
        let root = self.guard.root().path();
        let python = self.locator.locate_interpreter(root)?;

        let cwd = match working_dir {
            Some(dir) => {
                let resolved = self.guard.validate(dir)?;
                if !resolved.is_dir() {
                    return Err(ToolboxError::not_found("Working directory", dir));
                }
                resolved
            }
            None => root.to_path_buf(),
        };

        let code_hash = observability::code_hash(code);
        observability::audit_execution_started(&code_hash, &python, staged.path(), &cwd);
        let start = Instant::now();

        let mut cmd = Command::new(&python);
        cmd.arg(staged.path())
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = isolate_process_group(&mut cmd)
            .spawn()
            .map_err(|e| {
                ToolboxError::subprocess(
                    python.display().to_string(),
                    format!("failed to spawn: {}", e),
                )
            })?;

        let output = wait_with_output(&mut child, "python", self.timeout)?;

        observability::audit_execution_completed(
            &code_hash,
            output.exit_code,
            start.elapsed().as_millis() as u64,
            output.stdout.len(),
            output.stderr.len(),
        );

        Ok(ExecutionResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
        })
    }
}
