//! Descriptor layer merge logic
//!
//! Layers are merged as untyped JSON so partial layers compose:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins), so a layer that sets `plugins` owns the list
//! - Scalars: override (last wins)

use serde_json::{Map, Value};

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive)
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        (_, overlay) => overlay,
    }
}

/// Merge multiple layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

/// Build a single-key overlay from a dotted path, e.g.
/// `output.filename` + `"x.js"` → `{"output": {"filename": "x.js"}}`
pub fn overlay_at_path(path: &str, value: Value) -> Result<Value, String> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(format!("invalid override path '{}'", path));
    }

    Ok(parts.into_iter().rev().fold(value, |acc, key| {
        let mut map = Map::new();
        map.insert(key.trim().to_string(), acc);
        Value::Object(map)
    }))
}

/// Parse a `PATH=VALUE` assignment into an overlay.
///
/// The value is read as JSON when it parses (`8080`, `true`, `["a"]`),
/// otherwise as a plain string.
pub fn parse_assignment(assignment: &str) -> Result<Value, String> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=VALUE, got '{}'", assignment))?;

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    overlay_at_path(path, value)
}
