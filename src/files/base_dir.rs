//! Base directory state and path resolution.

use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{McpError, Result};

/// Default base directory name, relative to the working directory.
pub const DEFAULT_BASE_DIR: &str = "output";

/// The mutable root against which relative file paths are resolved.
///
/// Shared by reference between the tools that read it; `set` swaps the path
/// under a write lock so a resolution always sees one whole value.
#[derive(Debug)]
pub struct BaseDirectory {
    current: RwLock<PathBuf>,
}

impl BaseDirectory {
    /// Create the directory (and parents) and use its canonical form as the base.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let canonical = create_canonical("init_base_directory", path.as_ref())?;
        tracing::info!(base = %canonical.display(), "base directory initialized");
        Ok(Self {
            current: RwLock::new(canonical),
        })
    }

    /// `<working directory>/output`, created if missing.
    pub fn from_working_dir() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::new(cwd.join(DEFAULT_BASE_DIR))
    }

    /// Current base directory.
    pub fn get(&self) -> PathBuf {
        self.current.read().clone()
    }

    /// Replace the base directory, creating it if needed. Returns the canonical path.
    pub fn set(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let canonical = create_canonical("set_base_directory", path.as_ref())?;
        *self.current.write() = canonical.clone();
        tracing::info!(base = %canonical.display(), "base directory changed");
        Ok(canonical)
    }

    /// Resolve a caller-supplied path.
    ///
    /// With `use_base`, the path is joined onto the current base and normalized;
    /// a result outside the base is rejected. Without it the path is used as given.
    pub fn resolve(&self, path: impl AsRef<Path>, use_base: bool) -> Result<PathBuf> {
        let path = path.as_ref();
        if !use_base {
            return Ok(path.to_path_buf());
        }

        let base = self.get();
        let joined = normalize(&base.join(path));
        if !joined.starts_with(&base) {
            return Err(McpError::InvalidArg {
                name: "path".to_string(),
                reason: format!(
                    "{} resolves outside the base directory {}",
                    path.display(),
                    base.display()
                ),
            });
        }
        Ok(joined)
    }
}

fn create_canonical(operation: &str, path: &Path) -> Result<PathBuf> {
    let dir_err = |err: std::io::Error| McpError::DirectoryCreation {
        operation: operation.to_string(),
        path: path.display().to_string(),
        reason: err.to_string(),
    };
    std::fs::create_dir_all(path).map_err(dir_err)?;
    std::fs::canonicalize(path).map_err(dir_err)
}

/// Lexically remove `.` segments and fold `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
