//! Template resolution for node configuration values.
//!
//! Two token grammars are recognized:
//! - `{{ $json.body.<field> }}` — a field of the trigger payload
//! - `{{ $node.<id>.<field> }}` — a field of an earlier node's result
//!
//! A token whose path is absent from the context is left in place verbatim.
//! This is load-bearing: partially configured nodes must not hard-fail
//! parameter resolution, and existing workflows rely on it. Resolution is a
//! single pass; substituted values are not re-scanned.

use crate::context::ExecutionContext;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

static JSON_BODY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\$json\.body\.(\w+)\s*\}\}").expect("valid trigger token pattern")
});

static NODE_FIELD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\$node\.(\w+)\.(\w+)\s*\}\}").expect("valid node token pattern")
});

/// Resolves every recognized token in `template` against `context`.
///
/// Pure and side-effect-free; safe to call concurrently.
#[must_use]
pub fn resolve(template: &str, context: &ExecutionContext) -> String {
    let resolved = JSON_BODY_TOKEN.replace_all(template, |caps: &Captures<'_>| {
        match context.trigger_field(&caps[1]) {
            Some(value) => stringify(value),
            None => caps[0].to_string(),
        }
    });

    NODE_FIELD_TOKEN
        .replace_all(&resolved, |caps: &Captures<'_>| {
            match context.node_field(&caps[1], &caps[2]) {
                Some(value) => stringify(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Interpolates a JSON value into a template string.
///
/// Strings are inserted raw (no surrounding quotes); everything else uses
/// compact JSON encoding.
fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_name() -> ExecutionContext {
        ExecutionContext::new(serde_json::json!({"name": "Ann"}))
    }

    #[test]
    fn resolves_trigger_field() {
        let context = context_with_name();
        assert_eq!(
            resolve("Hello {{ $json.body.name }}", &context),
            "Hello Ann"
        );
    }

    #[test]
    fn missing_trigger_field_leaves_token() {
        let context = ExecutionContext::new(serde_json::json!({}));
        assert_eq!(
            resolve("Hello {{ $json.body.name }}", &context),
            "Hello {{ $json.body.name }}"
        );
    }

    #[test]
    fn resolves_node_field() {
        let mut context = ExecutionContext::new(serde_json::json!({}));
        context.record_result("node1", serde_json::json!({"message": "sent"}));

        assert_eq!(
            resolve("Status: {{ $node.node1.message }}", &context),
            "Status: sent"
        );
    }

    #[test]
    fn missing_node_field_leaves_token() {
        let context = ExecutionContext::new(serde_json::json!({}));
        assert_eq!(
            resolve("{{ $node.node1.message }}", &context),
            "{{ $node.node1.message }}"
        );
    }

    #[test]
    fn plain_text_passes_through_unchanged() {
        let context = context_with_name();
        assert_eq!(resolve("no tokens here", &context), "no tokens here");
    }

    #[test]
    fn tolerates_irregular_whitespace() {
        let context = context_with_name();
        assert_eq!(resolve("{{$json.body.name}}", &context), "Ann");
        assert_eq!(resolve("{{   $json.body.name   }}", &context), "Ann");
    }

    #[test]
    fn non_string_values_use_compact_json() {
        let mut context = ExecutionContext::new(serde_json::json!({"count": 3}));
        context.record_result("llm", serde_json::json!({"text": {"subject": "Hi"}}));

        assert_eq!(resolve("{{ $json.body.count }}", &context), "3");
        assert_eq!(
            resolve("{{ $node.llm.text }}", &context),
            r#"{"subject":"Hi"}"#
        );
    }

    #[test]
    fn resolves_multiple_tokens_in_one_string() {
        let mut context = context_with_name();
        context.record_result("node1", serde_json::json!({"message": "done"}));

        assert_eq!(
            resolve(
                "{{ $json.body.name }}: {{ $node.node1.message }}",
                &context
            ),
            "Ann: done"
        );
    }
}
