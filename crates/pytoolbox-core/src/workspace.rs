//! The workspace root: the single directory every file operation is confined to.

use std::path::{Path, PathBuf};

use crate::error::{Result, ToolboxError};

/// Absolute, canonical workspace directory. Fixed for the server's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    /// Canonicalize `path` and check it is an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ToolboxError::InvalidArgument(
                "workspace root must not be empty".to_string(),
            ));
        }
        let canonical = path
            .canonicalize()
            .map_err(|_| ToolboxError::not_found("Workspace root", path.display().to_string()))?;
        if !canonical.is_dir() {
            return Err(ToolboxError::InvalidArgument(format!(
                "workspace root is not a directory: {}",
                canonical.display()
            )));
        }
        Ok(Self(canonical))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.0.join(rel)
    }
}

impl AsRef<Path> for WorkspaceRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canonicalizes() {
        let tmp = tempfile::tempdir().unwrap();
        let dotted = tmp.path().join(".");
        let root = WorkspaceRoot::new(&dotted).unwrap();
        assert_eq!(root.path(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_root_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = WorkspaceRoot::new(tmp.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_empty_root_rejected() {
        let err = WorkspaceRoot::new("").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_file_root_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();
        let err = WorkspaceRoot::new(&file).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }
}
