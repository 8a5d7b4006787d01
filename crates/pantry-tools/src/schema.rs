//! Small builders for the JSON schemas tools declare.

use serde_json::{json, Map, Value};

pub fn integer(description: &str) -> Value {
    json!({"type": "integer", "description": description})
}

pub fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

pub fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

/// An object accepting any keys; used for flat upstream parameter maps.
pub fn open_object(description: &str) -> Value {
    json!({"type": "object", "description": description, "additionalProperties": true})
}

pub fn array(description: &str, items: Value) -> Value {
    json!({"type": "array", "description": description, "items": items})
}

pub fn object<'a>(
    properties: impl IntoIterator<Item = (&'a str, Value)>,
    required: &[&str],
) -> Value {
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
