//! MCP servers for document-store and filesystem CRUD.
//!
//! Run with `resource-mcp documents [--db PATH | --cache]` or
//! `resource-mcp files [--base-dir PATH]`.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use resource_mcp::config::{Cli, DocumentBackend, ServerConfig};
use resource_mcp::{
    AuditLog, BaseDirectory, DocumentStore, DocumentTools, FileStore, FileTools, McpServer,
    StoreSession, ToolHandler,
};

fn main() {
    let cli = Cli::parse();

    // Set up logging; stdout carries the protocol, so logs go to stderr.
    if cli.verbose || std::env::var_os("RUST_LOG").is_some() {
        let mut filter = EnvFilter::from_default_env();
        if cli.verbose {
            if let Ok(directive) = "resource_mcp=debug".parse() {
                filter = filter.add_directive(directive);
            }
        }
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match ServerConfig::try_from(cli.server) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match config {
        ServerConfig::Documents { backend } => {
            let session = match &backend {
                DocumentBackend::Cache => StoreSession::cache(),
                DocumentBackend::Path(path) => StoreSession::open(path),
            };
            let session = match session {
                Ok(session) => session,
                Err(e) => {
                    eprintln!("Error: Failed to open database ({:?}): {}", backend, e);
                    std::process::exit(1);
                }
            };
            tracing::info!(?backend, "starting document server");
            serve(DocumentTools::new(DocumentStore::new(session)))
        }

        ServerConfig::Files {
            base_dir,
            audit_log,
        } => {
            let base = match BaseDirectory::new(&base_dir) {
                Ok(base) => base,
                Err(e) => {
                    eprintln!("Error: Failed to prepare base directory: {}", e);
                    std::process::exit(1);
                }
            };
            let audit = match audit_log {
                Some(path) => AuditLog::to_file(path),
                None => AuditLog::disabled(),
            };
            tracing::info!(base = %base.get().display(), "starting file server");
            serve(FileTools::new(FileStore::new(Arc::new(base), audit)))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}

fn serve<H: ToolHandler>(handler: H) -> resource_mcp::Result<()> {
    let mut server = McpServer::new(handler);
    server.run_sync()
}
