//! Helpers for pulling structured payloads out of free-form model output.

use serde_json::{Deserializer, Value};

/// Returns the first complete `{ ... }` value in `raw`, ignoring Markdown
/// fences and any prose the model wrapped around it.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    raw.match_indices('{').find_map(|(start, _)| {
        let tail = &raw[start..];
        let mut values = Deserializer::from_str(tail).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(_))) => Some(&tail[..values.byte_offset()]),
            _ => None,
        }
    })
}
