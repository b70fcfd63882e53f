//! Query matching and field-level set updates over JSON documents.
//!
//! Filters use the familiar document-database shape: every top-level entry
//! must hold, keys may be dotted paths, plain values compare by equality and
//! `$`-prefixed operator objects compare by order or membership.

use std::cmp::Ordering;

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Field that carries a document's identity.
pub const ID_FIELD: &str = "_id";

const COMPARISON_OPS: &[&str] = &["$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin", "$exists"];

/// Check a filter for unknown operators before it is run against any document.
pub fn validate(filter: &Map<String, JsonValue>) -> Result<()> {
    for (key, condition) in filter {
        match key.as_str() {
            "$and" | "$or" | "$nor" => {
                for sub in sub_filters(key, condition)? {
                    validate(sub)?;
                }
            }
            k if k.starts_with('$') => return Err(malformed(QUERY, format!("unknown operator {}", k))),
            _ => {
                if let Some(ops) = operator_object(condition) {
                    for (op, operand) in ops {
                        if !COMPARISON_OPS.contains(&op.as_str()) {
                            return Err(malformed(QUERY, format!("unknown operator {}", op)));
                        }
                        if matches!(op.as_str(), "$in" | "$nin") && !operand.is_array() {
                            return Err(malformed(QUERY, format!("{} expects an array", op)));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Whether `document` satisfies `filter`. An empty filter matches everything.
///
/// Assumes the filter already passed [`validate`].
pub fn matches(document: &JsonValue, filter: &Map<String, JsonValue>) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => each_sub(condition).all(|sub| matches(document, sub)),
        "$or" => each_sub(condition).any(|sub| matches(document, sub)),
        "$nor" => !each_sub(condition).any(|sub| matches(document, sub)),
        path => {
            let field = lookup(document, path);
            match operator_object(condition) {
                Some(ops) => ops.iter().all(|(op, operand)| apply_operator(field, op, operand)),
                None => equals_or_contains(field, condition),
            }
        }
    })
}

/// Check an update body before any document is touched.
///
/// Keys are assigned verbatim, so operator keys and empty path segments are
/// rejected here rather than halfway through a scan.
pub fn validate_update(update: &Map<String, JsonValue>) -> Result<()> {
    for path in update.keys() {
        if path.starts_with('$') {
            return Err(malformed(
                UPDATE,
                format!("update fields are assigned verbatim; operator {} is not supported", path),
            ));
        }
        if path.split('.').any(str::is_empty) {
            return Err(malformed(UPDATE, format!("invalid field path {:?}", path)));
        }
    }
    Ok(())
}

/// Assign every entry of `update` into `document`, creating intermediate objects.
///
/// Returns whether the document changed. Assumes the update already passed
/// [`validate_update`].
pub fn apply_set(document: &mut JsonValue, update: &Map<String, JsonValue>) -> Result<bool> {
    let before = document.clone();
    for (path, value) in update {
        if path == ID_FIELD || path.starts_with("_id.") {
            if lookup(document, path) != Some(value) {
                return Err(malformed(UPDATE, "the _id field cannot be modified".to_string()));
            }
            continue;
        }
        assign(document, path, value.clone())?;
    }
    Ok(*document != before)
}

const QUERY: &str = "query";
const UPDATE: &str = "update";

fn malformed(what: &str, reason: String) -> McpError {
    McpError::MalformedInput {
        what: what.to_string(),
        reason,
    }
}

fn sub_filters<'a>(key: &str, condition: &'a JsonValue) -> Result<Vec<&'a Map<String, JsonValue>>> {
    let items = condition
        .as_array()
        .ok_or_else(|| malformed(QUERY, format!("{} expects an array of filters", key)))?;
    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| malformed(QUERY, format!("{} expects an array of filters", key)))
        })
        .collect()
}

fn each_sub(condition: &JsonValue) -> impl Iterator<Item = &Map<String, JsonValue>> {
    condition
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| item.as_object())
}

/// An object whose keys are all operators. Mixed objects compare literally.
fn operator_object(condition: &JsonValue) -> Option<&Map<String, JsonValue>> {
    match condition {
        JsonValue::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
            Some(map)
        }
        _ => None,
    }
}

fn lookup<'a>(document: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(document, |current, segment| match current {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn assign(document: &mut JsonValue, path: &str, value: JsonValue) -> Result<()> {
    let mut segments = path.split('.').peekable();
    let mut current = document;
    while let Some(segment) = segments.next() {
        let map = match current {
            JsonValue::Object(map) => map,
            _ => {
                return Err(malformed(UPDATE, format!(
                    "cannot set {}: parent is not an object",
                    path
                )))
            }
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
    }
    Ok(())
}

fn equals_or_contains(field: Option<&JsonValue>, expected: &JsonValue) -> bool {
    match (field, expected) {
        (None, JsonValue::Null) => true,
        (None, _) => false,
        (Some(JsonValue::Array(items)), JsonValue::Array(_)) => {
            field == Some(expected) || items.contains(expected)
        }
        (Some(JsonValue::Array(items)), _) => items.contains(expected),
        (Some(actual), _) => values_equal(actual, expected),
    }
}

fn apply_operator(field: Option<&JsonValue>, op: &str, operand: &JsonValue) -> bool {
    match op {
        "$eq" => equals_or_contains(field, operand),
        "$ne" => !equals_or_contains(field, operand),
        "$gt" => compare(field, operand).is_some_and(|o| o == Ordering::Greater),
        "$gte" => compare(field, operand).is_some_and(|o| o != Ordering::Less),
        "$lt" => compare(field, operand).is_some_and(|o| o == Ordering::Less),
        "$lte" => compare(field, operand).is_some_and(|o| o != Ordering::Greater),
        "$in" => operand
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| equals_or_contains(field, c))),
        "$nin" => operand
            .as_array()
            .is_some_and(|candidates| !candidates.iter().any(|c| equals_or_contains(field, c))),
        "$exists" => field.is_some() == truthy(operand),
        _ => false,
    }
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::Null => false,
        _ => true,
    }
}

/// Numbers compare numerically so `1` and `1.0` are equal.
fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering is only defined between two numbers or two strings.
fn compare(field: Option<&JsonValue>, operand: &JsonValue) -> Option<Ordering> {
    match (field?, operand) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
