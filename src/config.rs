//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::files::audit::DEFAULT_AUDIT_LOG;
use crate::files::base_dir::DEFAULT_BASE_DIR;

/// MCP servers for document-store and filesystem CRUD.
///
/// Each subcommand runs one server speaking JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "resource-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Server to run.
    #[command(subcommand)]
    pub server: ServerCommand,
}

/// Which server to run.
#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Serve document database tools.
    Documents(DocumentArgs),
    /// Serve filesystem tools.
    Files(FileArgs),
}

/// Arguments of the document server.
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// Path to the database directory.
    /// Mutually exclusive with --cache.
    #[arg(long, value_name = "PATH", env = "RESOURCE_MCP_DB")]
    pub db: Option<String>,

    /// Use an in-memory (cache) database. This is the default when --db is not given.
    #[arg(long, env = "RESOURCE_MCP_CACHE")]
    pub cache: bool,
}

/// Arguments of the file server.
#[derive(Args, Debug, Clone, Default)]
pub struct FileArgs {
    /// Initial base directory (default: ./output).
    #[arg(long, value_name = "PATH", env = "RESOURCE_MCP_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// File receiving one line per file operation.
    #[arg(long, value_name = "PATH", env = "RESOURCE_MCP_AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Do not write the audit log file.
    #[arg(long)]
    pub no_audit_log: bool,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Two options that cannot be combined were both given.
    #[error("{0} and {1} are mutually exclusive")]
    Conflict(&'static str, &'static str),

    /// An option was given an empty value.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// How the document backend is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBackend {
    /// Persistent store at a path.
    Path(String),
    /// In-memory store.
    Cache,
}

/// Validated configuration of one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerConfig {
    /// Document server settings.
    Documents {
        /// Backend to open
        backend: DocumentBackend,
    },
    /// File server settings.
    Files {
        /// Initial base directory
        base_dir: PathBuf,
        /// Audit log file, if enabled
        audit_log: Option<PathBuf>,
    },
}

impl TryFrom<ServerCommand> for ServerConfig {
    type Error = ConfigError;

    fn try_from(command: ServerCommand) -> Result<Self, Self::Error> {
        match command {
            ServerCommand::Documents(args) => {
                let db = args.db.filter(|path| !path.trim().is_empty());
                let backend = match (db, args.cache) {
                    (Some(_), true) => return Err(ConfigError::Conflict("--db", "--cache")),
                    (Some(path), false) => DocumentBackend::Path(path),
                    (None, _) => DocumentBackend::Cache,
                };
                Ok(ServerConfig::Documents { backend })
            }
            ServerCommand::Files(args) => {
                if args.no_audit_log && args.audit_log.is_some() {
                    return Err(ConfigError::Conflict("--audit-log", "--no-audit-log"));
                }
                let base_dir = match args.base_dir {
                    Some(dir) if dir.as_os_str().is_empty() => {
                        return Err(ConfigError::Empty("--base-dir"))
                    }
                    Some(dir) => dir,
                    None => PathBuf::from(DEFAULT_BASE_DIR),
                };
                let audit_log = if args.no_audit_log {
                    None
                } else {
                    Some(args.audit_log.unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_LOG)))
                };
                Ok(ServerConfig::Files {
                    base_dir,
                    audit_log,
                })
            }
        }
    }
}
