//! Validator compilation
//!
//! Translates a [`ResolvedSchema`] into a [`ValidatorExpr`] under one of two
//! strictness policies. Input validators guard what callers may send and are
//! strict; output validators describe what the remote API returns and never
//! reject a real response for extra fields, drifting enums or `null`s in
//! optional fields.

use crate::document::Additional;
use crate::resolve::{ResolvedObject, ResolvedSchema, ResolvedShape};
use mcpoas_core::{PropertyRule, UnknownFields, ValidatorExpr, ValidatorKind};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

/// Strictness policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Caller-supplied arguments
    Input,
    /// Remote API responses
    Output,
}

/// Compile a resolved schema.
///
/// Description and example end up on the innermost expression; the
/// nullable flag wraps it afterwards.
pub fn compile(schema: &ResolvedSchema, mode: Mode) -> ValidatorExpr {
    let expr = compile_shape(schema, mode).with_doc(documentation(schema));
    if schema.nullable {
        expr.nullable()
    } else {
        expr
    }
}

fn compile_shape(schema: &ResolvedSchema, mode: Mode) -> ValidatorExpr {
    if let Some(values) = schema.enum_values.as_deref() {
        if !values.is_empty() && is_scalar(&schema.shape) {
            return compile_enum(values, mode);
        }
    }

    match &schema.shape {
        ResolvedShape::Object(object) => compile_object(object, mode),
        ResolvedShape::Array(items) => ValidatorExpr::array(
            items
                .as_deref()
                .map_or_else(ValidatorExpr::any, |items| compile(items, mode)),
        ),
        ResolvedShape::String => ValidatorExpr::string(),
        ResolvedShape::Number => ValidatorExpr::number(),
        ResolvedShape::Integer => ValidatorExpr::integer(),
        ResolvedShape::Boolean => ValidatorExpr::boolean(),
        ResolvedShape::Union | ResolvedShape::Unresolved => ValidatorExpr::any(),
    }
}

const fn is_scalar(shape: &ResolvedShape) -> bool {
    matches!(
        shape,
        ResolvedShape::String
            | ResolvedShape::Number
            | ResolvedShape::Integer
            | ResolvedShape::Boolean
            | ResolvedShape::Unresolved
    )
}

fn compile_enum(values: &[Value], mode: Mode) -> ValidatorExpr {
    let strings: Option<Vec<String>> = values
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect();

    match (strings, mode) {
        (Some(allowed), Mode::Input) => ValidatorExpr::enumeration(allowed),
        (Some(_), Mode::Output) => ValidatorExpr::string(),
        (None, Mode::Input) => ValidatorExpr::literals(values.to_vec()),
        (None, Mode::Output) => {
            trace!("mixed-type enumeration in output schema, left permissive");
            ValidatorExpr::any()
        }
    }
}

fn compile_object(object: &ResolvedObject, mode: Mode) -> ValidatorExpr {
    let properties: BTreeMap<String, PropertyRule> = object
        .properties
        .iter()
        .map(|(name, schema)| {
            let required = object.required.iter().any(|r| r == name);
            let mut validator = compile(schema, mode);
            if !required && mode == Mode::Output {
                validator = validator.nullable();
            }
            (name.clone(), PropertyRule { validator, required })
        })
        .collect();

    let unknown = match (mode, &object.additional) {
        (Mode::Output, _) | (Mode::Input, Additional::Any) => UnknownFields::AllowAny,
        (Mode::Input, Additional::Typed(extra)) => {
            let extra = compile(extra, Mode::Input);
            if extra.kind == ValidatorKind::Any {
                UnknownFields::AllowAny
            } else {
                UnknownFields::Typed(Box::new(extra))
            }
        }
        (Mode::Input, Additional::Unspecified | Additional::Forbidden) => UnknownFields::Reject,
    };

    ValidatorExpr::object(properties, unknown)
}

/// Description and example joined into one documentation string
fn documentation(schema: &ResolvedSchema) -> Option<String> {
    let example = schema.example.as_ref().map(|e| format!("Example: {}", e));
    match (schema.description.as_deref(), example) {
        (Some(desc), Some(example)) => Some(format!("{}\n\n{}", desc.trim(), example)),
        (Some(desc), None) => Some(desc.trim().to_string()),
        (None, example) => example,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ReferenceTable, SchemaNode};
    use crate::resolve::Resolver;
    use mcpoas_core::validate;
    use serde_json::json;

    fn compile_json(schema: Value, mode: Mode) -> ValidatorExpr {
        let refs = ReferenceTable::default();
        let resolved = Resolver::new(&refs, 8)
            .resolve_root(&SchemaNode::from_value(&schema))
            .unwrap();
        compile(&resolved, mode)
    }

    fn id_schema() -> Value {
        json!({"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]})
    }

    #[test]
    fn test_input_object_is_strict() {
        let expr = compile_json(id_schema(), Mode::Input);

        assert!(validate(&expr, &json!({"id": "x", "extra": 1})).is_err());
        assert!(validate(&expr, &json!({})).is_err());
        assert!(validate(&expr, &json!({"id": "x"})).is_ok());
    }

    #[test]
    fn test_output_object_is_lenient() {
        let expr = compile_json(
            json!({
                "type": "object",
                "properties": {"id": {"type": "string"}, "title": {"type": "string"}},
                "required": ["id"]
            }),
            Mode::Output,
        );

        assert!(validate(&expr, &json!({"id": "x", "extra": true})).is_ok());
        assert!(validate(&expr, &json!({"id": "x", "title": null})).is_ok());
        // required properties stay non-nullable
        assert!(validate(&expr, &json!({"id": null})).is_err());
    }

    #[test]
    fn test_input_optional_does_not_accept_null() {
        let expr = compile_json(
            json!({"type": "object", "properties": {"limit": {"type": "integer"}}}),
            Mode::Input,
        );
        assert!(validate(&expr, &json!({})).is_ok());
        assert!(validate(&expr, &json!({"limit": null})).is_err());
    }

    #[test]
    fn test_additional_properties_policies() {
        let any = compile_json(json!({"type": "object", "additionalProperties": true}), Mode::Input);
        assert!(validate(&any, &json!({"anything": [1, 2]})).is_ok());

        let typed = compile_json(
            json!({"type": "object", "additionalProperties": {"type": "string"}}),
            Mode::Input,
        );
        assert!(validate(&typed, &json!({"a": "b"})).is_ok());
        assert!(validate(&typed, &json!({"a": 1})).is_err());

        let forbidden = compile_json(json!({"type": "object", "additionalProperties": false}), Mode::Output);
        assert!(validate(&forbidden, &json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_string_enum_modes() {
        let schema = json!({"type": "string", "enum": ["read", "read_write"]});

        let input = compile_json(schema.clone(), Mode::Input);
        assert!(validate(&input, &json!("read")).is_ok());
        assert!(validate(&input, &json!("admin")).is_err());

        let output = compile_json(schema, Mode::Output);
        assert_eq!(output.kind, ValidatorKind::String { allowed: None });
        assert!(validate(&output, &json!("admin")).is_ok());
    }

    #[test]
    fn test_mixed_enum_modes() {
        let schema = json!({"enum": ["all", 1, true]});

        let input = compile_json(schema.clone(), Mode::Input);
        assert!(matches!(input.kind, ValidatorKind::Literals { ref values } if values.len() == 3));
        assert!(validate(&input, &json!(true)).is_ok());
        assert!(validate(&input, &json!(false)).is_err());

        let output = compile_json(schema, Mode::Output);
        assert_eq!(output.kind, ValidatorKind::Any);
    }

    #[test]
    fn test_array_items() {
        let expr = compile_json(json!({"type": "array", "items": {"type": "integer"}}), Mode::Input);
        assert!(validate(&expr, &json!([1, 2])).is_ok());
        assert!(validate(&expr, &json!(["1"])).is_err());

        let expr = compile_json(json!({"type": "array"}), Mode::Input);
        assert!(validate(&expr, &json!([1, "two", null])).is_ok());
    }

    #[test]
    fn test_union_and_unresolved_are_permissive() {
        let expr = compile_json(json!({"oneOf": [{"type": "string"}, {"type": "integer"}]}), Mode::Input);
        assert_eq!(expr.kind, ValidatorKind::Any);

        let expr = compile_json(json!({}), Mode::Input);
        assert_eq!(expr.kind, ValidatorKind::Any);
    }

    #[test]
    fn test_nullable_wraps_documented_inner() {
        let expr = compile_json(
            json!({"type": "string", "nullable": true, "description": "Emoji", "example": "🎉"}),
            Mode::Input,
        );
        assert!(expr.is_nullable());
        assert_eq!(expr.doc, None);
        assert_eq!(expr.documentation(), Some("Emoji\n\nExample: \"🎉\""));
        assert!(validate(&expr, &json!(null)).is_ok());
    }

    #[test]
    fn test_documentation_survives_optional_output_wrapping() {
        let expr = compile_json(
            json!({
                "type": "object",
                "properties": {"count": {"type": "number", "example": 3}}
            }),
            Mode::Output,
        );
        let rule = &expr.properties().unwrap()["count"];
        assert!(rule.validator.is_nullable());
        assert_eq!(rule.validator.documentation(), Some("Example: 3"));
    }
}
