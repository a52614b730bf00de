//! Path validation utilities.
//!
//! Ensures paths stay within the workspace root to prevent path traversal attacks.
//! Resolution follows the host filesystem (symlinks, `..`) *before* the prefix
//! comparison; nothing is memoized, every call re-resolves against the disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, ToolboxError};
use crate::observability;
use crate::workspace::WorkspaceRoot;

/// Same bound the kernel uses before giving up with ELOOP.
const MAX_SYMLINK_DEPTH: usize = 40;

/// Call-through guard bound to one workspace root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: WorkspaceRoot,
}

impl PathGuard {
    pub fn new(root: WorkspaceRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &WorkspaceRoot {
        &self.root
    }

    /// Resolve `path` (relative to the root, or absolute) and reject escapes.
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        validate_path_under_root(self.root.path(), path.as_ref())
    }

    /// Path of an already validated location, relative to the root.
    pub fn relative<'a>(&self, validated: &'a Path) -> &'a Path {
        validated.strip_prefix(self.root.path()).unwrap_or(validated)
    }
}

/// Validate `path` is within `root`. `root` must already be canonical.
pub fn validate_path_under_root(root: &Path, path: &Path) -> Result<PathBuf> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let resolved = resolve_path(&full)?;
    if !resolved.starts_with(root) {
        observability::security_path_rejected(&path.to_string_lossy(), root);
        return Err(ToolboxError::PathEscape {
            path: path.to_string_lossy().to_string(),
            root: root.to_path_buf(),
        });
    }
    Ok(resolved)
}

/// Resolve `path` one component at a time, the way the kernel walks it.
///
/// `resolved` only ever holds components that were checked against the disk,
/// so `..` pops a real directory, never a name that was not looked at. Symlinks
/// (dangling ones included) are expanded where they occur. Components past the
/// last existing one are kept as written.
fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let mut pending: Vec<PathBuf> = Vec::new();
    queue_components(&mut pending, path);

    let mut resolved = PathBuf::new();
    let mut links = 0usize;
    while let Some(next) = pending.pop() {
        match next.components().next() {
            None | Some(Component::CurDir) => {}
            Some(Component::ParentDir) => {
                resolved.pop();
            }
            Some(Component::Prefix(_)) | Some(Component::RootDir) => resolved.push(&next),
            Some(Component::Normal(name)) => {
                let candidate = resolved.join(name);
                match std::fs::symlink_metadata(&candidate) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        links += 1;
                        if links > MAX_SYMLINK_DEPTH {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidInput,
                                format!("too many levels of symbolic links: {}", path.display()),
                            ));
                        }
                        let target = std::fs::read_link(&candidate)?;
                        queue_components(&mut pending, &target);
                    }
                    _ => resolved = candidate,
                }
            }
        }
    }
    Ok(resolved)
}

/// Push the components of `path` so the first one is popped next.
fn queue_components(pending: &mut Vec<PathBuf>, path: &Path) {
    pending.extend(
        path.components()
            .rev()
            .map(|c| PathBuf::from(c.as_os_str())),
    );
}
