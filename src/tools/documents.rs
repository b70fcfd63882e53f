//! Document store tools.
//!
//! Tools: list_databases, list_collections, insert_document, find_documents,
//!        update_document, delete_documents, count_documents
//!
//! Resources: greeting://{name}

use serde_json::{Map, Value as JsonValue};

use crate::convert::{get_object_arg, get_optional_u64, get_string_arg};
use crate::documents::{DocumentStore, ResourceHandle, DEFAULT_FIND_LIMIT};
use crate::error::{McpError, Result};
use crate::schema;
use crate::tools::{ResourceTemplate, ToolDef, ToolHandler};

const GREETING_SCHEME: &str = "greeting://";

/// Get all document tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "list_databases",
            "List all available databases.",
            schema!(object {}),
        ),
        ToolDef::new(
            "list_collections",
            "List all collections in a database. Returns an empty list if the database does not exist.",
            schema!(object {
                required: { "database_name": string }
            }),
        ),
        ToolDef::new(
            "insert_document",
            "Insert a document (JSON object) into a collection. The database and collection are \
             created on first write. Returns the document's _id, assigned if not supplied.",
            schema!(object {
                required: { "database_name": string, "collection_name": string, "document": json_object }
            }),
        ),
        ToolDef::new(
            "find_documents",
            "Find documents matching a query (JSON object, default {}). Supports equality, dotted \
             paths and $eq/$ne/$gt/$gte/$lt/$lte/$in/$nin/$exists/$and/$or/$nor. Returns at most \
             `limit` documents (default 10, 0 for no limit).",
            schema!(object {
                required: { "database_name": string, "collection_name": string },
                optional: { "query": json_object, "limit": integer }
            }),
        ),
        ToolDef::new(
            "update_document",
            "Set the fields of `update` on every document matching `query`. Fields not named in \
             the update are kept. Returns the number of documents modified.",
            schema!(object {
                required: { "database_name": string, "collection_name": string, "query": json_object, "update": json_object }
            }),
        ),
        ToolDef::new(
            "delete_documents",
            "Delete every document matching `query`. Returns the number of documents deleted.",
            schema!(object {
                required: { "database_name": string, "collection_name": string, "query": json_object }
            }),
        ),
        ToolDef::new(
            "count_documents",
            "Count documents matching a query (default {}).",
            schema!(object {
                required: { "database_name": string, "collection_name": string },
                optional: { "query": json_object }
            }),
        ),
    ]
}

/// Tool set of the document server.
pub struct DocumentTools {
    store: DocumentStore,
    tools: Vec<ToolDef>,
}

impl DocumentTools {
    /// Serve tools over `store`.
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            tools: tools(),
        }
    }
}

impl ToolHandler for DocumentTools {
    fn name(&self) -> &str {
        "resource-mcp-documents"
    }

    fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    fn call(&mut self, name: &str, args: Map<String, JsonValue>) -> Result<JsonValue> {
        dispatch(&mut self.store, name, args)
    }

    fn resource_templates(&self) -> Vec<ResourceTemplate> {
        vec![ResourceTemplate {
            uri_template: format!("{}{{name}}", GREETING_SCHEME),
            name: "greeting".to_string(),
            description: "Get a personalized greeting".to_string(),
        }]
    }

    fn read_resource(&self, uri: &str) -> Option<Result<String>> {
        let name = uri.strip_prefix(GREETING_SCHEME)?;
        Some(Ok(greeting(name)))
    }
}

/// The greeting served at `greeting://{name}`.
pub fn greeting(name: &str) -> String {
    format!("Hello Hi, {}!", name)
}

/// Dispatch a document tool call.
pub fn dispatch(
    store: &mut DocumentStore,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "list_databases" => {
            let names = store.list_databases()?;
            Ok(serde_json::json!(names))
        }

        "list_collections" => {
            let database = get_string_arg(&args, "database_name")?;
            let names = store.list_collections(&database)?;
            Ok(serde_json::json!(names))
        }

        "insert_document" => {
            let (database, collection) = handle_args(&args)?;
            let document = get_object_arg(&args, "document", None)?;

            store.insert(ResourceHandle::new(&database, &collection), document)
        }

        "find_documents" => {
            let (database, collection) = handle_args(&args)?;
            let query = get_object_arg(&args, "query", Some("{}"))?;
            let limit = match get_optional_u64(&args, "limit")? {
                Some(limit) => usize::try_from(limit).map_err(|_| McpError::InvalidArg {
                    name: "limit".to_string(),
                    reason: "limit exceeds supported range".to_string(),
                })?,
                None => DEFAULT_FIND_LIMIT,
            };

            let docs = store.find(ResourceHandle::new(&database, &collection), &query, limit)?;
            Ok(JsonValue::Array(docs))
        }

        "update_document" => {
            let (database, collection) = handle_args(&args)?;
            let query = get_object_arg(&args, "query", None)?;
            let update = get_object_arg(&args, "update", None)?;

            let modified = store.update(ResourceHandle::new(&database, &collection), &query, &update)?;
            Ok(JsonValue::Number(modified.into()))
        }

        "delete_documents" => {
            let (database, collection) = handle_args(&args)?;
            let query = get_object_arg(&args, "query", None)?;

            let deleted = store.delete(ResourceHandle::new(&database, &collection), &query)?;
            Ok(JsonValue::Number(deleted.into()))
        }

        "count_documents" => {
            let (database, collection) = handle_args(&args)?;
            let query = get_object_arg(&args, "query", Some("{}"))?;

            let count = store.count(ResourceHandle::new(&database, &collection), &query)?;
            Ok(JsonValue::Number(count.into()))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

fn handle_args(args: &Map<String, JsonValue>) -> Result<(String, String)> {
    Ok((
        get_string_arg(args, "database_name")?,
        get_string_arg(args, "collection_name")?,
    ))
}
