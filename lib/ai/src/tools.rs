//! Callable tools exposed to the model.
//!
//! A small arithmetic toolbox the model may invoke through function
//! calling. Each tool takes JSON arguments and returns its result as a
//! string, matching what function-calling APIs expect in the tool-response
//! turn.

use serde_json::Value as JsonValue;

/// Definition of one callable tool, in provider-neutral form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: &'static str,
    /// What the tool does, shown to the model.
    pub description: &'static str,
    /// JSON schema for the arguments.
    pub parameters: JsonValue,
}

fn number_params(fields: &[&str]) -> JsonValue {
    let properties: serde_json::Map<String, JsonValue> = fields
        .iter()
        .map(|f| ((*f).to_string(), serde_json::json!({"type": "number"})))
        .collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": fields,
    })
}

/// Returns the definitions of every available tool.
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "sum",
            description: "Calculate the sum of two numbers",
            parameters: number_params(&["a", "b"]),
        },
        ToolDefinition {
            name: "multiply",
            description: "Multiply two numbers",
            parameters: number_params(&["a", "b"]),
        },
        ToolDefinition {
            name: "power",
            description: "Raise base to an exponent",
            parameters: number_params(&["base", "exponent"]),
        },
    ]
}

fn arg(args: &JsonValue, key: &str) -> Option<f64> {
    args.get(key).and_then(JsonValue::as_f64)
}

/// Executes a tool by name.
///
/// Returns `None` for unknown tool names or non-numeric arguments; the
/// backend reports that back to the model as a failed call.
#[must_use]
pub fn dispatch(name: &str, args: &JsonValue) -> Option<String> {
    let result = match name {
        "sum" => arg(args, "a")? + arg(args, "b")?,
        "multiply" => arg(args, "a")? * arg(args, "b")?,
        "power" => arg(args, "base")?.powf(arg(args, "exponent")?),
        _ => return None,
    };

    tracing::debug!(tool = name, args = %args, result, "tool invoked");

    // Integers print without a trailing ".0", like the model expects.
    if result.fract() == 0.0 && result.abs() < 1e15 {
        Some(format!("{}", result as i64))
    } else {
        Some(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_tools_are_defined() {
        let defs = definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["sum", "multiply", "power"]);
        for def in &defs {
            assert_eq!(def.parameters["type"], "object");
        }
    }

    #[test]
    fn sum_and_multiply() {
        assert_eq!(
            dispatch("sum", &serde_json::json!({"a": 2, "b": 3})).as_deref(),
            Some("5")
        );
        assert_eq!(
            dispatch("multiply", &serde_json::json!({"a": 4, "b": 2.5})).as_deref(),
            Some("10")
        );
    }

    #[test]
    fn power_handles_fractional_results() {
        assert_eq!(
            dispatch("power", &serde_json::json!({"base": 2, "exponent": 10})).as_deref(),
            Some("1024")
        );
        assert_eq!(
            dispatch("power", &serde_json::json!({"base": 2, "exponent": 0.5})).as_deref(),
            Some(&2f64.sqrt().to_string()[..])
        );
    }

    #[test]
    fn unknown_tool_or_bad_args_yield_none() {
        assert_eq!(dispatch("divide", &serde_json::json!({"a": 1, "b": 2})), None);
        assert_eq!(dispatch("sum", &serde_json::json!({"a": "x", "b": 2})), None);
    }
}
