//! # resource-mcp
//!
//! MCP (Model Context Protocol) servers exposing CRUD primitives to AI agents.
//!
//! Two servers share one protocol layer, JSON-RPC 2.0 over stdin/stdout:
//!
//! - **documents**: list/insert/find/update/delete/count over an embedded
//!   document database, addressed by database and collection name
//! - **files**: create/read/append/delete/list over the local filesystem,
//!   resolved against a mutable base directory, plus ordered content
//!   modifications and a small template filler
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "documents": {
//!       "command": "/path/to/resource-mcp",
//!       "args": ["documents", "--db", "/path/to/data"]
//!     },
//!     "files": {
//!       "command": "/path/to/resource-mcp",
//!       "args": ["files", "--base-dir", "/path/to/output"]
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use resource_mcp::{AuditLog, BaseDirectory, FileStore, FileTools, McpServer};
//!
//! let base = BaseDirectory::from_working_dir().expect("Failed to create base directory");
//! let store = FileStore::new(Arc::new(base), AuditLog::disabled());
//! let mut server = McpServer::new(FileTools::new(store));
//!
//! // Run the server (reads from stdin, writes to stdout)
//! // server.run_sync().expect("Server error");
//! ```

#![warn(missing_docs)]

pub mod config;
mod convert;
pub mod documents;
mod error;
pub mod files;
mod server;
mod session;
mod text;
mod tools;

pub use convert::{decode, decode_object, json_to_value, value_to_json};
pub use documents::{DocumentStore, ResourceHandle};
pub use error::{McpError, Result};
pub use files::{AuditLog, BaseDirectory, FileStore, MutationPipeline, MutationStep};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::StoreSession;
pub use text::generate_text;
pub use tools::{DocumentTools, FileTools, ResourceTemplate, ToolDef, ToolHandler};
