//! Templated text generation.

use serde_json::{Map, Value as JsonValue};

/// Fill `{name}` placeholders in `template` from `variables`.
///
/// String values are inserted as-is, other values in their JSON form.
/// Placeholders with no matching variable, and unmatched braces, are kept verbatim.
pub fn generate_text(template: &str, variables: &Map<String, JsonValue>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match variables.get(name.trim()) {
            Some(JsonValue::String(s)) if !name.contains('{') => out.push_str(s),
            Some(value) if !name.contains('{') => out.push_str(&value.to_string()),
            _ => {
                // Not a placeholder we can fill; emit the brace and keep scanning after it.
                out.push('{');
                rest = after;
                continue;
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
