//! JSON generation for compiled tool sets
//!
//! Provides two formats:
//! - Artifact: the full [`ToolSet`], reloadable without re-running the compiler
//! - Listing: MCP `tools/list` entries with JSON Schema, optionally paginated

use crate::schema::{ToolDefinition, ToolSet, UnknownFields, ValidatorExpr, ValidatorKind};
use serde_json::{json, Map, Value};

// ============================================================================
// Artifact
// ============================================================================

/// Serialize a tool set as compact JSON
pub fn generate_artifact(set: &ToolSet) -> Result<String, serde_json::Error> {
    serde_json::to_string(set)
}

/// Serialize a tool set as indented JSON
pub fn generate_artifact_pretty(set: &ToolSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(set)
}

/// Load a tool set previously written by [`generate_artifact`]
pub fn parse_artifact(json: &str) -> Result<ToolSet, serde_json::Error> {
    serde_json::from_str(json)
}

// ============================================================================
// JSON Schema rendering
// ============================================================================

/// Render a validator as a JSON Schema object
pub fn validator_to_json_schema(expr: &ValidatorExpr) -> Value {
    let mut schema = match &expr.kind {
        ValidatorKind::Any => Map::new(),
        ValidatorKind::Boolean => type_only("boolean"),
        ValidatorKind::Number { integer } => {
            type_only(if *integer { "integer" } else { "number" })
        }
        ValidatorKind::String { allowed } => {
            let mut m = type_only("string");
            if let Some(allowed) = allowed {
                m.insert("enum".into(), json!(allowed));
            }
            m
        }
        ValidatorKind::Literals { values } => {
            let mut m = Map::new();
            m.insert("enum".into(), Value::Array(values.clone()));
            m
        }
        ValidatorKind::Array { items } => {
            let mut m = type_only("array");
            m.insert("items".into(), validator_to_json_schema(items));
            m
        }
        ValidatorKind::Object { properties, unknown } => {
            let mut m = type_only("object");
            let mut props = Map::new();
            let mut required = Vec::new();
            for (name, rule) in properties {
                props.insert(name.clone(), validator_to_json_schema(&rule.validator));
                if rule.required {
                    required.push(Value::String(name.clone()));
                }
            }
            m.insert("properties".into(), Value::Object(props));
            if !required.is_empty() {
                m.insert("required".into(), Value::Array(required));
            }
            let additional = match unknown {
                UnknownFields::Reject => Value::Bool(false),
                UnknownFields::AllowAny => Value::Bool(true),
                UnknownFields::Typed(extra) => validator_to_json_schema(extra),
            };
            m.insert("additionalProperties".into(), additional);
            m
        }
        ValidatorKind::Nullable { inner } => return nullable_schema(validator_to_json_schema(inner)),
    };

    if let Some(ref doc) = expr.doc {
        schema.insert("description".into(), Value::String(doc.clone()));
    }
    Value::Object(schema)
}

fn type_only(ty: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("type".into(), Value::String(ty.to_string()));
    m
}

/// Widen a rendered schema to also admit `null`
fn nullable_schema(inner: Value) -> Value {
    let Value::Object(mut m) = inner else {
        return inner;
    };
    // `{}` already admits null
    if m.is_empty() || (m.len() == 1 && m.contains_key("description")) {
        return Value::Object(m);
    }

    if let Some(Value::Array(values)) = m.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
    match m.get("type").cloned() {
        Some(Value::String(ty)) => {
            m.insert("type".into(), json!([ty, "null"]));
            Value::Object(m)
        }
        Some(_) => Value::Object(m),
        None if m.contains_key("enum") => Value::Object(m),
        None => json!({"anyOf": [Value::Object(m), {"type": "null"}]}),
    }
}

// ============================================================================
// MCP tools/list
// ============================================================================

/// Render one tool as an MCP `tools/list` entry
pub fn tool_to_listing_entry(tool: &ToolDefinition) -> Value {
    let mut entry = Map::new();
    entry.insert("name".into(), Value::String(tool.name.clone()));
    entry.insert("title".into(), Value::String(tool.title.clone()));
    if !tool.description.is_empty() {
        entry.insert("description".into(), Value::String(tool.description.clone()));
    }
    entry.insert("inputSchema".into(), validator_to_json_schema(&tool.input));
    if let Some(ref output) = tool.output {
        entry.insert("outputSchema".into(), validator_to_json_schema(output));
    }
    entry.insert(
        "annotations".into(),
        json!({
            "title": tool.title,
            "readOnlyHint": tool.annotations.read_only,
            "destructiveHint": tool.annotations.destructive,
            "idempotentHint": tool.annotations.idempotent,
            "openWorldHint": tool.annotations.open_world,
        }),
    );
    Value::Object(entry)
}

/// Generate the full, unpaginated `tools/list` result
///
/// Format:
/// ```json
/// {"tools":[{"name":"...","inputSchema":{...},"annotations":{...}}]}
/// ```
pub fn generate_listing(set: &ToolSet) -> Value {
    let tools: Vec<Value> = set.tools.iter().map(tool_to_listing_entry).collect();
    json!({ "tools": tools })
}

/// Generate one page of the `tools/list` result
///
/// Returns the tools at `[cursor * page_size, (cursor + 1) * page_size)` and
/// a `nextCursor` when more tools exist. A zero page size is treated as one.
pub fn generate_paginated_listing(set: &ToolSet, cursor: usize, page_size: usize) -> Value {
    let page_size = page_size.max(1);
    let start = cursor.saturating_mul(page_size);
    let tools: Vec<Value> = set
        .tools
        .iter()
        .skip(start)
        .take(page_size)
        .map(tool_to_listing_entry)
        .collect();

    let mut page = Map::new();
    page.insert("tools".into(), Value::Array(tools));
    if start.saturating_add(page_size) < set.tools.len() {
        page.insert("nextCursor".into(), Value::String((cursor + 1).to_string()));
    }
    Value::Object(page)
}

// ============================================================================
// ListingPages - Pre-computed paginated listing
// ============================================================================

/// Pre-serialized `tools/list` pages.
///
/// Tool sets are immutable once loaded, so every page can be rendered once
/// and handed out by reference for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ListingPages {
    pages: Vec<String>,
}

impl ListingPages {
    /// Render every page of `set`.
    ///
    /// An empty set still yields one (empty) page.
    pub fn from_tool_set(set: &ToolSet, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let num_pages = set.tools.len().div_ceil(page_size).max(1);
        let pages = (0..num_pages)
            .map(|cursor| generate_paginated_listing(set, cursor, page_size).to_string())
            .collect();
        Self { pages }
    }

    /// Get a page by cursor index, `None` if out of bounds
    #[inline]
    pub fn get_page(&self, cursor: usize) -> Option<&str> {
        self.pages.get(cursor).map(String::as_str)
    }

    #[inline]
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }
}
