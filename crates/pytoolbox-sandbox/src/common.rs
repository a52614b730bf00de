//! Child process output capture shared by the executor and collaborator tools.
//!
//! stdout/stderr are drained on background threads while the child runs.
//! Without this, a child writing more than a pipe buffer (~64KB) blocks on
//! write and we deadlock waiting for it to exit.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pytoolbox_core::{Result, ToolboxError};

/// Poll interval while a timeout is armed.
pub const WAIT_POLL_INTERVAL_MS: u64 = 50;

/// Decoded output of a finished child process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Map an exit status to an integer. Signal deaths become `-signal` on unix.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return -sig;
        }
    }
    -1
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    stream.map(|mut s| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = s.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_text(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// `python -I`: isolated mode. The interpreter ignores `PYTHON*` variables and
/// the user site, and leaves the working directory off `sys.path`, so modules in
/// the workspace cannot shadow the ones a helper or tool imports.
pub fn isolated_python(python: &Path) -> Command {
    let mut cmd = Command::new(python);
    cmd.arg("-I");
    cmd
}

/// Start the child as the leader of a new process group so a timeout can
/// kill everything it spawned.
pub fn isolate_process_group(cmd: &mut Command) -> &mut Command {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    cmd
}

/// SIGKILL the child's process group on unix, then the child itself.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        if let Ok(pid) = i32::try_from(child.id()) {
            let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
        }
    }
    let _ = child.kill();
}

/// Wait for `child`, collecting its piped output. Output is decoded lossily:
/// invalid UTF-8 becomes U+FFFD.
///
/// With `timeout = None` this blocks until the child exits. When the timeout
/// elapses the child's process group is killed and the child reaped before
/// `Timeout` is returned. Output captured so far is discarded.
pub fn wait_with_output(
    child: &mut Child,
    label: &str,
    timeout: Option<Duration>,
) -> Result<CapturedOutput> {
    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let status = match timeout {
        None => child
            .wait()
            .map_err(|e| ToolboxError::subprocess(label, format!("wait failed: {}", e)))?,
        Some(limit) => {
            let start = Instant::now();
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) => {}
                    Err(e) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ToolboxError::subprocess(
                            label,
                            format!("wait failed: {}", e),
                        ));
                    }
                }
                if start.elapsed() > limit {
                    tracing::warn!("{} exceeded timeout of {:?}, killing", label, limit);
                    kill_process_group(child);
                    let _ = child.wait();
                    // A descendant outside the group may still hold the pipes open.
                    // The drain threads are detached rather than joined.
                    drop(stdout_handle);
                    drop(stderr_handle);
                    return Err(ToolboxError::Timeout(limit));
                }
                thread::sleep(Duration::from_millis(WAIT_POLL_INTERVAL_MS));
            }
        }
    };

    Ok(CapturedOutput {
        stdout: join_text(stdout_handle),
        stderr: join_text(stderr_handle),
        exit_code: exit_code(&status),
        success: status.success(),
    })
}

/// Run `cmd` to completion, optionally feeding `input` on stdin.
/// Used for collaborator tools (pip, black, pylint); no timeout.
pub fn run_captured(cmd: &mut Command, label: &str, input: Option<&str>) -> Result<CapturedOutput> {
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| ToolboxError::subprocess(label, format!("failed to spawn: {}", e)))?;

    let writer = match (input, child.stdin.take()) {
        (Some(text), Some(mut stdin)) => {
            let text = text.to_string();
            Some(thread::spawn(move || {
                // A child that exits early closes the pipe; that is not our error.
                let _ = stdin.write_all(text.as_bytes());
            }))
        }
        _ => None,
    };

    let output = wait_with_output(&mut child, label, None);
    if let Some(w) = writer {
        let _ = w.join();
    }
    output
}
