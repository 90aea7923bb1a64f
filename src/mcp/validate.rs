//! Tool argument validation against input schemas.
//!
//! This is the single choke point between the free-form `arguments` map
//! and the handlers, which read fields positionally afterwards.

use serde_json::{Map, Value};

use super::protocol::InputSchema;

/// Check that required fields are present and that supplied values match
/// the declared property types. Unknown extra fields pass through.
pub fn validate_args(args: &Map<String, Value>, schema: &InputSchema) -> Result<(), String> {
    for required in &schema.required {
        if !args.contains_key(required) {
            return Err(format!("missing required parameter: {}", required));
        }
    }
    for (name, prop) in &schema.properties {
        let Some(value) = args.get(name) else {
            continue;
        };
        let Some(expected) = prop.get("type").and_then(Value::as_str) else {
            continue;
        };
        check_type(name, value, expected)?;
    }
    Ok(())
}

fn check_type(name: &str, value: &Value, expected: &str) -> Result<(), String> {
    let ok = match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("parameter {} must be a {}", name, expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn schema() -> InputSchema {
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "limit": {"type": "number"},
                "verbose": {"type": "boolean"},
                "phases": {"type": "array"},
                "data": {"type": "object"},
            }),
            &["project"],
        )
    }

    #[test]
    fn test_missing_required() {
        let err = validate_args(&args(json!({})), &schema()).unwrap_err();
        assert_eq!(err, "missing required parameter: project");
    }

    #[test]
    fn test_valid_args() {
        let a = args(json!({
            "project": "demo",
            "limit": 5,
            "verbose": true,
            "phases": ["a", "b"],
            "data": {"k": "v"},
        }));
        assert!(validate_args(&a, &schema()).is_ok());
    }

    #[test]
    fn test_type_mismatches() {
        let cases = [
            (json!({"project": 5}), "parameter project must be a string"),
            (
                json!({"project": "p", "limit": "ten"}),
                "parameter limit must be a number",
            ),
            (
                json!({"project": "p", "verbose": "yes"}),
                "parameter verbose must be a boolean",
            ),
            (
                json!({"project": "p", "phases": "a,b"}),
                "parameter phases must be a array",
            ),
            (
                json!({"project": "p", "data": []}),
                "parameter data must be a object",
            ),
        ];
        for (input, expected) in cases {
            let err = validate_args(&args(input), &schema()).unwrap_err();
            assert_eq!(err, expected);
        }
    }

    #[test]
    fn test_extra_fields_pass() {
        let a = args(json!({"project": "p", "unknown": 1}));
        assert!(validate_args(&a, &schema()).is_ok());
    }

    #[test]
    fn test_float_is_number() {
        let a = args(json!({"project": "p", "limit": 2.5}));
        assert!(validate_args(&a, &schema()).is_ok());
    }
}
