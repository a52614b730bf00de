//! File operations confined to the workspace root.
//!
//! Every operation re-validates its path through [`PathGuard`]; no resolved
//! path is kept between calls since the tree may change underneath us.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::UNIX_EPOCH;

use pytoolbox_core::{PathGuard, Result, ToolboxError};

/// How `write_file` opens its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

impl FromStr for WriteMode {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "w" => Ok(Self::Overwrite),
            "a" => Ok(Self::Append),
            other => Err(ToolboxError::InvalidArgument(format!(
                "Unsupported write mode: {} (expected 'w' or 'a')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One row of a directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntryInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub modified: f64,
    /// Path relative to the workspace root.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct FileOperations {
    guard: PathGuard,
}

impl FileOperations {
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    /// Read a file, optionally only lines `start_line..=end_line` (1-based).
    pub fn read_file(
        &self,
        path: &str,
        start_line: Option<usize>,
        end_line: Option<usize>,
    ) -> Result<String> {
        let file_path = self.guard.validate(path)?;
        if !file_path.is_file() {
            return Err(ToolboxError::not_found("File", path));
        }
        let content = std::fs::read_to_string(&file_path)?;
        if start_line.is_none() && end_line.is_none() {
            return Ok(content);
        }

        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let start_idx = start_line.map(|s| s.saturating_sub(1)).unwrap_or(0);
        let end_idx = end_line.unwrap_or(lines.len()).min(lines.len());
        if start_idx >= end_idx {
            return Ok(String::new());
        }
        Ok(lines[start_idx..end_idx].concat())
    }

    /// Write (or append) `content`, creating parent directories as needed.
    pub fn write_file(&self, path: &str, content: &str, mode: WriteMode) -> Result<()> {
        let file_path = self.guard.validate(path)?;
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = match mode {
            WriteMode::Overwrite => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&file_path)?,
            WriteMode::Append => OpenOptions::new()
                .append(true)
                .create(true)
                .open(&file_path)?,
        };
        file.write_all(content.as_bytes())?;
        tracing::debug!("Wrote {} bytes to {}", content.len(), file_path.display());
        Ok(())
    }

    /// Delete a file. A symlink is removed itself, its target is left alone.
    pub fn delete_file(&self, path: &str) -> Result<()> {
        let requested = Path::new(path);
        let name = requested
            .file_name()
            .ok_or_else(|| ToolboxError::not_found("File", path))?;
        let parent = self
            .guard
            .validate(requested.parent().unwrap_or_else(|| Path::new("")))?;
        let entry = parent.join(name);
        match std::fs::symlink_metadata(&entry) {
            Ok(meta) if meta.is_file() || meta.file_type().is_symlink() => {
                std::fs::remove_file(&entry)?;
                Ok(())
            }
            _ => Err(ToolboxError::not_found("File", path)),
        }
    }

    /// List a directory's immediate children, sorted by name.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntryInfo>> {
        let dir_path = self.guard.validate(path)?;
        if !dir_path.is_dir() {
            return Err(ToolboxError::not_found("Directory", path));
        }

        let mut contents = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let entry = entry?;
            let item = entry.path();
            // Dangling symlinks fall back to the link's own metadata.
            let meta = item.metadata().or_else(|_| entry.metadata())?;
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
            contents.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                kind: if meta.is_file() {
                    EntryKind::File
                } else {
                    EntryKind::Directory
                },
                size: meta.len(),
                modified,
                path: self.relative_display(&item),
            });
        }
        contents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contents)
    }

    /// Create a directory and any missing parents. Existing directories are fine.
    pub fn create_directory(&self, path: &str) -> Result<()> {
        let dir_path = self.guard.validate(path)?;
        std::fs::create_dir_all(&dir_path)?;
        Ok(())
    }

    fn relative_display(&self, item: &Path) -> String {
        self.guard.relative(item).to_string_lossy().to_string()
    }
}
