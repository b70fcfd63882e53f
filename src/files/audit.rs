//! Persistent audit trail of file operations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

/// Default audit log file, relative to the working directory.
pub const DEFAULT_AUDIT_LOG: &str = "file_operations.log";

/// Appends one line per file operation: timestamp, operation, target and outcome.
///
/// A failure to write the log never fails the operation being logged; it is
/// reported through `tracing` instead.
#[derive(Debug)]
pub struct AuditLog {
    path: Option<PathBuf>,
    lock: Mutex<()>,
}

impl AuditLog {
    /// Log to `path`, creating the file on first write.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            lock: Mutex::new(()),
        }
    }

    /// Only emit `tracing` events.
    pub fn disabled() -> Self {
        Self {
            path: None,
            lock: Mutex::new(()),
        }
    }

    /// Where the log is written, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record the outcome of `operation` on `resource`.
    pub fn record<T>(&self, operation: &str, resource: &str, outcome: &Result<T>) {
        let status = match outcome {
            Ok(_) => {
                tracing::info!(operation, resource, "file operation ok");
                "ok".to_string()
            }
            Err(e) => {
                tracing::warn!(operation, resource, error = %e, "file operation failed");
                format!("error: {}", e)
            }
        };

        let Some(path) = &self.path else {
            return;
        };
        let line = format!(
            "{} {} {} {}\n",
            chrono::Utc::now().to_rfc3339(),
            operation,
            resource,
            status
        );

        let _guard = self.lock.lock();
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), error = %e, "failed to write audit log");
        }
    }
}
