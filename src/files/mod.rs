//! File store facade.
//!
//! Create/read/append/delete/list operations against paths resolved through a
//! shared [`BaseDirectory`]. Every operation is recorded in the [`AuditLog`].

pub mod audit;
pub mod base_dir;
pub mod pipeline;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{McpError, Result};

pub use audit::AuditLog;
pub use base_dir::BaseDirectory;
pub use pipeline::{MutationPipeline, MutationStep};

/// Which kind of directory entry to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// Filesystem CRUD facade.
pub struct FileStore {
    base: Arc<BaseDirectory>,
    audit: AuditLog,
}

impl FileStore {
    /// Create a store resolving against `base` and logging to `audit`.
    pub fn new(base: Arc<BaseDirectory>, audit: AuditLog) -> Self {
        Self { base, audit }
    }

    /// The shared base directory.
    pub fn base(&self) -> &Arc<BaseDirectory> {
        &self.base
    }

    /// Current base directory.
    pub fn base_directory(&self) -> PathBuf {
        self.base.get()
    }

    /// Change the base directory, creating it if needed.
    pub fn set_base_directory(&self, path: &str) -> Result<PathBuf> {
        let result = self.base.set(path);
        self.audit.record("set_base_directory", path, &result);
        result
    }

    /// Resolve `path` against the current base directory when `use_base` is set.
    pub fn resolve(&self, path: &str, use_base: bool) -> Result<PathBuf> {
        self.base.resolve(path, use_base)
    }

    /// Names of the regular files directly inside `directory` (default: the base).
    pub fn list_files(&self, directory: Option<&str>, use_base: bool) -> Result<Vec<String>> {
        self.audited("list_files", directory.unwrap_or("."), |store| {
            let dir = store.directory_target(directory, use_base)?;
            list_entries("list_files", &dir, EntryKind::File)
        })
    }

    /// Names of the directories directly inside `directory` (default: the base).
    pub fn list_directories(&self, directory: Option<&str>, use_base: bool) -> Result<Vec<String>> {
        self.audited("list_directories", directory.unwrap_or("."), |store| {
            let dir = store.directory_target(directory, use_base)?;
            list_entries("list_directories", &dir, EntryKind::Directory)
        })
    }

    /// Write `content` to `path`, replacing any existing file and creating parents.
    pub fn create(&self, path: &str, content: &str, use_base: bool) -> Result<PathBuf> {
        self.audited("create_file", path, |store| {
            let target = store.resolve(path, use_base)?;
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| McpError::DirectoryCreation {
                    operation: "create_file".to_string(),
                    path: parent.display().to_string(),
                    reason: e.to_string(),
                })?;
            }
            fs::write(&target, content).map_err(|e| McpError::from_io("create_file", &target, e))?;
            Ok(target)
        })
    }

    /// Read a file as UTF-8 text.
    pub fn read(&self, path: &str, use_base: bool) -> Result<String> {
        self.audited("read_file", path, |store| {
            let target = store.resolve(path, use_base)?;
            read_text("read_file", &target)
        })
    }

    /// Append a newline and `content`. The parent directory must already exist.
    pub fn append(&self, path: &str, content: &str, use_base: bool) -> Result<PathBuf> {
        self.audited("append_to_file", path, |store| {
            let target = store.resolve(path, use_base)?;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&target)
                .map_err(|e| McpError::from_io("append_to_file", &target, e))?;
            write!(file, "\n{}", content).map_err(|e| McpError::from_io("append_to_file", &target, e))?;
            Ok(target)
        })
    }

    /// Remove a file.
    pub fn delete(&self, path: &str, use_base: bool) -> Result<PathBuf> {
        self.audited("delete_file", path, |store| {
            let target = store.resolve(path, use_base)?;
            fs::remove_file(&target).map_err(|e| McpError::from_io("delete_file", &target, e))?;
            Ok(target)
        })
    }

    /// Create a directory and its parents. Succeeds if it already exists.
    pub fn create_directory(&self, path: &str, use_base: bool) -> Result<PathBuf> {
        self.audited("create_directory", path, |store| {
            let target = store.resolve(path, use_base)?;
            fs::create_dir_all(&target).map_err(|e| McpError::DirectoryCreation {
                operation: "create_directory".to_string(),
                path: target.display().to_string(),
                reason: e.to_string(),
            })?;
            Ok(target)
        })
    }

    /// Replace every occurrence of `search` with `replace` in a file.
    pub fn modify(&self, path: &str, search: &str, replace: &str, use_base: bool) -> Result<PathBuf> {
        let pipeline = MutationPipeline::new(vec![MutationStep::Replace {
            search: search.to_string(),
            replace: replace.to_string(),
        }]);
        self.audited("modify_file", path, |store| store.rewrite("modify_file", path, &pipeline, use_base))
    }

    /// Run `pipeline` over the file's content and write the result back.
    pub fn apply_modifications(
        &self,
        path: &str,
        pipeline: &MutationPipeline,
        use_base: bool,
    ) -> Result<PathBuf> {
        self.audited("apply_modifications", path, |store| {
            store.rewrite("apply_modifications", path, pipeline, use_base)
        })
    }

    fn rewrite(
        &self,
        operation: &str,
        path: &str,
        pipeline: &MutationPipeline,
        use_base: bool,
    ) -> Result<PathBuf> {
        let target = self.resolve(path, use_base)?;
        let content = read_text(operation, &target)?;
        let updated = pipeline.apply(content);
        fs::write(&target, updated).map_err(|e| McpError::from_io(operation, &target, e))?;
        tracing::debug!(
            path = %target.display(),
            steps = pipeline.steps().len(),
            skipped = pipeline.skipped(),
            "rewrote file"
        );
        Ok(target)
    }

    fn directory_target(&self, directory: Option<&str>, use_base: bool) -> Result<PathBuf> {
        match directory {
            Some(dir) => self.resolve(dir, use_base),
            None => Ok(self.base.get()),
        }
    }

    fn audited<T>(&self, operation: &str, path: &str, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let result = f(self);
        self.audit.record(operation, path, &result);
        result
    }
}

fn read_text(operation: &str, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| McpError::from_io(operation, path, e))
}

fn list_entries(operation: &str, dir: &Path, kind: EntryKind) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| McpError::from_io(operation, dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| McpError::from_io(operation, dir, e))?;
        let file_type = entry.file_type().map_err(|e| McpError::from_io(operation, dir, e))?;
        let wanted = match kind {
            EntryKind::File => file_type.is_file(),
            EntryKind::Directory => file_type.is_dir(),
        };
        if wanted {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
