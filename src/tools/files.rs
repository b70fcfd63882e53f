//! Filesystem tools.
//!
//! Tools: get_base_directory, set_base_directory, list_files, list_directories,
//!        create_file, read_file, append_to_file, delete_file, create_directory,
//!        modify_file, apply_modifications, generate_text

use serde_json::{Map, Value as JsonValue};

use crate::convert::{
    get_object_arg, get_optional_bool, get_optional_string, get_string_arg, get_structured_arg,
};
use crate::error::{McpError, Result};
use crate::files::{FileStore, MutationPipeline};
use crate::schema;
use crate::text::generate_text;
use crate::tools::{ToolDef, ToolHandler};

/// Get all file tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "get_base_directory",
            "Get the base directory that relative file paths resolve against.",
            schema!(object {}),
        ),
        ToolDef::new(
            "set_base_directory",
            "Set the base directory for file operations. The directory is created if missing. \
             Returns its absolute path.",
            schema!(object {
                required: { "path": string }
            }),
        ),
        ToolDef::new(
            "list_files",
            "List the files directly inside a directory (default: the base directory).",
            schema!(object {
                optional: { "directory": string, "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "list_directories",
            "List the subdirectories directly inside a directory (default: the base directory).",
            schema!(object {
                optional: { "directory": string, "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "create_file",
            "Create or overwrite a file with the given content, creating parent directories.",
            schema!(object {
                required: { "path": string },
                optional: { "content": string, "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "read_file",
            "Read a text file.",
            schema!(object {
                required: { "path": string },
                optional: { "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "append_to_file",
            "Append a newline followed by content to a file. The parent directory must exist.",
            schema!(object {
                required: { "path": string, "content": string },
                optional: { "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "delete_file",
            "Delete a file.",
            schema!(object {
                required: { "path": string },
                optional: { "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "create_directory",
            "Create a directory and any missing parents. Succeeds if it already exists.",
            schema!(object {
                required: { "path": string },
                optional: { "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "modify_file",
            "Replace every occurrence of `search` with `replace` in a file.",
            schema!(object {
                required: { "path": string, "search": string, "replace": string },
                optional: { "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "apply_modifications",
            "Apply an ordered list of modifications to a file in one rewrite. Each step is \
             {\"search\", \"replace\"}, {\"append\"} or {\"prepend\"}; steps run against the \
             result of the previous step. Unrecognized steps are skipped.",
            schema!(object {
                required: { "path": string, "modifications": json_array },
                optional: { "use_base_directory": boolean }
            }),
        ),
        ToolDef::new(
            "generate_text",
            "Fill {name} placeholders in a template from a variables object.",
            schema!(object {
                required: { "template": string },
                optional: { "variables": json_object }
            }),
        ),
    ]
}

/// Tool set of the file server.
pub struct FileTools {
    store: FileStore,
    tools: Vec<ToolDef>,
}

impl FileTools {
    /// Serve tools over `store`.
    pub fn new(store: FileStore) -> Self {
        Self {
            store,
            tools: tools(),
        }
    }

    /// The underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }
}

impl ToolHandler for FileTools {
    fn name(&self) -> &str {
        "resource-mcp-files"
    }

    fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    fn call(&mut self, name: &str, args: Map<String, JsonValue>) -> Result<JsonValue> {
        dispatch(&self.store, name, args)
    }
}

/// Dispatch a file tool call.
pub fn dispatch(store: &FileStore, name: &str, args: Map<String, JsonValue>) -> Result<JsonValue> {
    let use_base = get_optional_bool(&args, "use_base_directory")?.unwrap_or(true);

    match name {
        "get_base_directory" => Ok(path_json(&store.base_directory())),

        "set_base_directory" => {
            let path = get_string_arg(&args, "path")?;
            let base = store.set_base_directory(&path)?;
            Ok(path_json(&base))
        }

        "list_files" => {
            let directory = get_optional_string(&args, "directory")?;
            let names = store.list_files(directory.as_deref(), use_base)?;
            Ok(serde_json::json!(names))
        }

        "list_directories" => {
            let directory = get_optional_string(&args, "directory")?;
            let names = store.list_directories(directory.as_deref(), use_base)?;
            Ok(serde_json::json!(names))
        }

        "create_file" => {
            let path = get_string_arg(&args, "path")?;
            let content = get_optional_string(&args, "content")?.unwrap_or_default();
            let target = store.create(&path, &content, use_base)?;
            Ok(path_json(&target))
        }

        "read_file" => {
            let path = get_string_arg(&args, "path")?;
            let content = store.read(&path, use_base)?;
            Ok(JsonValue::String(content))
        }

        "append_to_file" => {
            let path = get_string_arg(&args, "path")?;
            let content = get_string_arg(&args, "content")?;
            let target = store.append(&path, &content, use_base)?;
            Ok(path_json(&target))
        }

        "delete_file" => {
            let path = get_string_arg(&args, "path")?;
            let target = store.delete(&path, use_base)?;
            Ok(path_json(&target))
        }

        "create_directory" => {
            let path = get_string_arg(&args, "path")?;
            let target = store.create_directory(&path, use_base)?;
            Ok(path_json(&target))
        }

        "modify_file" => {
            let path = get_string_arg(&args, "path")?;
            let search = get_string_arg(&args, "search")?;
            let replace = get_string_arg(&args, "replace")?;
            let target = store.modify(&path, &search, &replace, use_base)?;
            Ok(path_json(&target))
        }

        "apply_modifications" => {
            let path = get_string_arg(&args, "path")?;
            let steps = get_structured_arg(&args, "modifications", None)?;
            let pipeline = MutationPipeline::from_json(&steps)?;
            let target = store.apply_modifications(&path, &pipeline, use_base)?;
            Ok(serde_json::json!({
                "path": target.display().to_string(),
                "applied": pipeline.steps().len(),
                "skipped": pipeline.skipped(),
            }))
        }

        "generate_text" => {
            let template = get_string_arg(&args, "template")?;
            let variables = get_object_arg(&args, "variables", Some("{}"))?;
            Ok(JsonValue::String(generate_text(&template, &variables)))
        }

        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

fn path_json(path: &std::path::Path) -> JsonValue {
    JsonValue::String(path.display().to_string())
}
