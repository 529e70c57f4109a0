//! Interpreter for compiled validators
//!
//! Walks a [`ValidatorExpr`] against a JSON value and reports the first
//! violation together with a JSONPath-style location.

use crate::schema::{UnknownFields, ValidatorExpr, ValidatorKind};
use serde_json::Value;
use thiserror::Error;

/// A value did not satisfy a validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// Location of the offending value, e.g. `$.items[2].id`
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Check `value` against `expr`.
///
/// # Example
///
/// ```
/// use mcpoas_core::{validate, ValidatorExpr};
/// use serde_json::json;
///
/// assert!(validate(&ValidatorExpr::string(), &json!("x")).is_ok());
/// assert!(validate(&ValidatorExpr::string(), &json!(1)).is_err());
/// ```
pub fn validate(expr: &ValidatorExpr, value: &Value) -> Result<(), ValidationError> {
    check(expr, value, "$")
}

fn check(expr: &ValidatorExpr, value: &Value, path: &str) -> Result<(), ValidationError> {
    match &expr.kind {
        ValidatorKind::Any => Ok(()),
        ValidatorKind::Nullable { inner } => {
            if value.is_null() {
                Ok(())
            } else {
                check(inner, value, path)
            }
        }
        ValidatorKind::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(mismatch(path, "boolean", value))
            }
        }
        ValidatorKind::Number { integer } => match value {
            Value::Number(n) if *integer && !is_integral(n) => {
                Err(ValidationError::new(path, "expected an integer"))
            }
            Value::Number(_) => Ok(()),
            _ => Err(mismatch(path, "number", value)),
        },
        ValidatorKind::String { allowed } => {
            let s = value.as_str().ok_or_else(|| mismatch(path, "string", value))?;
            match allowed {
                Some(allowed) if !allowed.iter().any(|a| a == s) => Err(ValidationError::new(
                    path,
                    format!("\"{}\" is not one of [{}]", s, allowed.join(", ")),
                )),
                _ => Ok(()),
            }
        }
        ValidatorKind::Literals { values } => {
            if values.contains(value) {
                Ok(())
            } else {
                Err(ValidationError::new(
                    path,
                    format!("{} is not one of the allowed values", value),
                ))
            }
        }
        ValidatorKind::Array { items } => {
            let elements = value.as_array().ok_or_else(|| mismatch(path, "array", value))?;
            for (i, element) in elements.iter().enumerate() {
                check(items, element, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        ValidatorKind::Object { properties, unknown } => {
            let map = value.as_object().ok_or_else(|| mismatch(path, "object", value))?;

            for (name, rule) in properties {
                match map.get(name) {
                    Some(v) => check(&rule.validator, v, &child_path(path, name))?,
                    None if rule.required => {
                        return Err(ValidationError::new(
                            path,
                            format!("missing required property \"{}\"", name),
                        ));
                    }
                    None => {}
                }
            }

            for (name, v) in map {
                if properties.contains_key(name) {
                    continue;
                }
                match unknown {
                    UnknownFields::AllowAny => {}
                    UnknownFields::Reject => {
                        return Err(ValidationError::new(
                            path,
                            format!("unknown property \"{}\"", name),
                        ));
                    }
                    UnknownFields::Typed(extra) => check(extra, v, &child_path(path, name))?,
                }
            }
            Ok(())
        }
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn child_path(parent: &str, name: &str) -> String {
    format!("{}.{}", parent, name)
}

fn mismatch(path: &str, expected: &str, value: &Value) -> ValidationError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    ValidationError::new(path, format!("expected {}, found {}", expected, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyRule;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn document_input() -> ValidatorExpr {
        let mut props = BTreeMap::new();
        props.insert("id".to_string(), PropertyRule::required(ValidatorExpr::string()));
        props.insert("limit".to_string(), PropertyRule::optional(ValidatorExpr::integer()));
        ValidatorExpr::object(props, UnknownFields::Reject)
    }

    #[test]
    fn test_strict_object() {
        let expr = document_input();

        assert!(validate(&expr, &json!({"id": "x"})).is_ok());
        assert!(validate(&expr, &json!({"id": "x", "limit": 25})).is_ok());

        let err = validate(&expr, &json!({"id": "x", "extra": 1})).unwrap_err();
        assert_eq!(err.message, "unknown property \"extra\"");

        let err = validate(&expr, &json!({})).unwrap_err();
        assert_eq!(err.message, "missing required property \"id\"");
    }

    #[test]
    fn test_optional_rejects_null_unless_nullable() {
        let expr = document_input();
        assert!(validate(&expr, &json!({"id": "x", "limit": null})).is_err());

        let mut props = BTreeMap::new();
        props.insert(
            "limit".to_string(),
            PropertyRule::optional(ValidatorExpr::integer().nullable()),
        );
        let expr = ValidatorExpr::object(props, UnknownFields::AllowAny);
        assert!(validate(&expr, &json!({"limit": null, "extra": true})).is_ok());
    }

    #[test]
    fn test_typed_unknown_fields() {
        let expr = ValidatorExpr::object(
            BTreeMap::new(),
            UnknownFields::Typed(Box::new(ValidatorExpr::number())),
        );
        assert!(validate(&expr, &json!({"a": 1, "b": 2.5})).is_ok());

        let err = validate(&expr, &json!({"a": "one"})).unwrap_err();
        assert_eq!(err.path, "$.a");
    }

    #[test]
    fn test_integer() {
        let expr = ValidatorExpr::integer();
        assert!(validate(&expr, &json!(3)).is_ok());
        assert!(validate(&expr, &json!(3.0)).is_ok());
        assert!(validate(&expr, &json!(3.5)).is_err());
        assert!(validate(&ValidatorExpr::number(), &json!(3.5)).is_ok());
    }

    #[test]
    fn test_enumeration_and_literals() {
        let expr = ValidatorExpr::enumeration(vec!["read".into(), "read_write".into()]);
        assert!(validate(&expr, &json!("read")).is_ok());
        assert!(validate(&expr, &json!("admin")).is_err());

        let expr = ValidatorExpr::literals(vec![json!(1), json!("all")]);
        assert!(validate(&expr, &json!(1)).is_ok());
        assert!(validate(&expr, &json!("all")).is_ok());
        assert!(validate(&expr, &json!(2)).is_err());
    }

    #[test]
    fn test_array_error_path() {
        let expr = ValidatorExpr::array(document_input());
        let err = validate(&expr, &json!([{"id": "a"}, {"id": 7}])).unwrap_err();
        assert_eq!(err.path, "$[1].id");
        assert_eq!(err.message, "expected string, found number");
    }
}
