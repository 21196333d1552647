//! Model output handling.
//!
//! Workflows often prompt the model for JSON so downstream templates can
//! reference named sub-fields. Models wrap such output in code fences as
//! often as not, so parsing strips common fence forms first. Output that
//! still fails to parse is NOT an error: it falls back to raw text with a
//! warning, and the node result stays usable.

use serde_json::Value as JsonValue;

/// Strips a leading ```` ```json ````/```` ``` ```` fence and a trailing
/// ```` ``` ```` fence, if present.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    for prefix in ["```json", "```JSON", "```"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            text = stripped.trim_start();
            break;
        }
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped.trim_end();
    }
    text
}

/// Attempts to parse model output as structured JSON.
///
/// Returns the parsed value when the output is a JSON object or array;
/// otherwise returns the raw (fence-stripped) text as a JSON string.
#[must_use]
pub fn parse_model_output(raw: &str) -> JsonValue {
    let text = strip_code_fences(raw);

    match serde_json::from_str::<JsonValue>(text) {
        Ok(value) if value.is_object() || value.is_array() => value,
        _ => {
            if text.starts_with('{') || text.starts_with('[') {
                tracing::warn!("model output looked structured but was not valid JSON");
            }
            JsonValue::String(text.to_string())
        }
    }
}
