//! Conversion utilities between tool arguments, JSON and stratadb types.
//!
//! Tool callers hand over filters, updates and step lists either as JSON text
//! or as inline JSON values; [`decode`] and [`get_structured_arg`] normalize both
//! forms. The remaining helpers pull typed arguments out of a tool call and
//! convert between `serde_json::Value` and `stratadb::Value`.

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use stratadb::{Output, Value};

use crate::error::{McpError, Result};

/// Decode structured text into a JSON value.
///
/// Only well-formedness is checked; `what` names the argument in the error.
pub fn decode(what: &str, text: &str) -> Result<JsonValue> {
    serde_json::from_str(text).map_err(|e| McpError::MalformedInput {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

/// Decode structured text that must be a JSON object.
pub fn decode_object(what: &str, text: &str) -> Result<Map<String, JsonValue>> {
    into_object(what, decode(what, text)?)
}

fn into_object(what: &str, value: JsonValue) -> Result<Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(McpError::MalformedInput {
            what: what.to_string(),
            reason: format!("expected an object, got {}", type_name(&other)),
        }),
    }
}

pub(crate) fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Get a structured argument given either as JSON text or as an inline value.
///
/// Returns `default` (decoded) when the argument is absent.
pub fn get_structured_arg(
    args: &Map<String, JsonValue>,
    name: &str,
    default: Option<&str>,
) -> Result<JsonValue> {
    match args.get(name) {
        Some(JsonValue::String(text)) => decode(name, text),
        Some(JsonValue::Null) | None => match default {
            Some(text) => decode(name, text),
            None => Err(McpError::MissingArg(name.to_string())),
        },
        Some(value) => Ok(value.clone()),
    }
}

/// Same as [`get_structured_arg`], but the decoded value must be an object.
pub fn get_object_arg(
    args: &Map<String, JsonValue>,
    name: &str,
    default: Option<&str>,
) -> Result<Map<String, JsonValue>> {
    into_object(name, get_structured_arg(args, name, default)?)
}

/// Convert a JSON value to a stratadb Value.
pub fn json_to_value(json: JsonValue) -> Result<Value> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(McpError::InvalidArg {
                    name: "value".to_string(),
                    reason: "Number out of range".to_string(),
                })
            }
        }
        JsonValue::String(s) => Ok(Value::String(s)),
        JsonValue::Array(arr) => {
            let values: Result<Vec<Value>> = arr.into_iter().map(json_to_value).collect();
            Ok(Value::Array(values?))
        }
        JsonValue::Object(map) => {
            let mut obj = HashMap::new();
            for (k, v) in map {
                obj.insert(k, json_to_value(v)?);
            }
            Ok(Value::Object(obj))
        }
    }
}

/// Convert a stratadb Value to a JSON value.
pub fn value_to_json(value: Value) -> JsonValue {
    value.into()
}

/// Extract the document body from a JSON get, whichever shape the engine returns.
pub fn output_to_document(output: Output) -> Option<JsonValue> {
    match output {
        Output::Maybe(opt) => opt.map(value_to_json),
        Output::MaybeVersioned(opt) => opt.map(|vv| value_to_json(vv.value)),
        _ => None,
    }
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get an optional string argument from JSON arguments.
///
/// Absent or null yields `None`; any other non-string value is rejected.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Result<Option<String>> {
    optional_arg(args, name, "a string", |v| v.as_str().map(str::to_string))
}

/// Helper to get an optional u64 argument from JSON arguments.
pub fn get_optional_u64(args: &Map<String, JsonValue>, name: &str) -> Result<Option<u64>> {
    optional_arg(args, name, "a non-negative integer", JsonValue::as_u64)
}

/// Helper to get an optional boolean argument.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Result<Option<bool>> {
    optional_arg(args, name, "a boolean", JsonValue::as_bool)
}

fn optional_arg<T>(
    args: &Map<String, JsonValue>,
    name: &str,
    expected: &str,
    extract: impl FnOnce(&JsonValue) -> Option<T>,
) -> Result<Option<T>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => extract(value).map(Some).ok_or_else(|| McpError::InvalidArg {
            name: name.to_string(),
            reason: format!("expected {}, got {}", expected, type_name_or_number(value)),
        }),
    }
}

fn type_name_or_number(value: &JsonValue) -> String {
    match value {
        JsonValue::Number(n) => n.to_string(),
        other => type_name(other).to_string(),
    }
}
