//! Error types for the MCP servers.
//!
//! Maps backend, filesystem and decoding failures to MCP-friendly error responses.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stratadb::Error as StrataError;

/// MCP server errors.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum McpError {
    /// Error from the underlying document backend.
    #[error("backend error: {message}")]
    Backend {
        /// The error code reported by the backend
        code: String,
        /// Human-readable error message
        message: String,
    },

    /// Structured text (filter, update, document, step list) was not well-formed.
    #[error("malformed {what}: {reason}")]
    MalformedInput {
        /// Which argument failed to decode
        what: String,
        /// Decoder message
        reason: String,
    },

    /// A file or directory does not exist.
    #[error("{operation}: not found: {path}")]
    NotFound {
        /// Operation that failed
        operation: String,
        /// Target path
        path: String,
    },

    /// A directory could not be created.
    #[error("{operation}: cannot create directory {path}: {reason}")]
    DirectoryCreation {
        /// Operation that failed
        operation: String,
        /// Target path
        path: String,
        /// Underlying OS message
        reason: String,
    },

    /// Unknown tool requested.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Invalid argument value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Wrap an I/O error raised by `operation` on `path`.
    ///
    /// `NotFound` keeps its own kind so callers can tell a missing target
    /// apart from a permission or disk failure.
    pub fn from_io(operation: &str, path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            McpError::NotFound {
                operation: operation.to_string(),
                path: path.display().to_string(),
            }
        } else {
            McpError::Io(format!("{} {}: {}", operation, path.display(), err))
        }
    }

    /// Prefix a backend error with the database/collection it was raised against.
    pub fn in_collection(self, database: &str, collection: &str) -> Self {
        match self {
            McpError::Backend { code, message } => McpError::Backend {
                code,
                message: format!("{}.{}: {}", database, collection, message),
            },
            other => other,
        }
    }
}

impl From<StrataError> for McpError {
    fn from(err: StrataError) -> Self {
        let code = match &err {
            StrataError::BranchNotFound { .. } => "DATABASE_NOT_FOUND",
            StrataError::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            StrataError::InvalidKey { .. } => "INVALID_KEY",
            StrataError::InvalidPath { .. } => "INVALID_PATH",
            StrataError::InvalidInput { .. } => "INVALID_INPUT",
            StrataError::AccessDenied { .. } => "ACCESS_DENIED",
            StrataError::Io { .. } => "IO_ERROR",
            StrataError::Serialization { .. } => "SERIALIZATION_ERROR",
            _ => "BACKEND_ERROR",
        };

        McpError::Backend {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(format!("JSON error: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl McpError {
    /// Convert to JSON-RPC error code.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::UnknownTool(_) => rpc_codes::METHOD_NOT_FOUND,
            McpError::MissingArg(_)
            | McpError::InvalidArg { .. }
            | McpError::MalformedInput { .. }
            | McpError::NotFound { .. } => rpc_codes::INVALID_PARAMS,
            McpError::Protocol(_) => rpc_codes::INVALID_REQUEST,
            McpError::Backend { code, .. } => match code.as_str() {
                "DATABASE_NOT_FOUND" | "DOCUMENT_NOT_FOUND" | "INVALID_KEY" | "INVALID_PATH"
                | "INVALID_INPUT" => rpc_codes::INVALID_PARAMS,
                _ => rpc_codes::INTERNAL_ERROR,
            },
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;
