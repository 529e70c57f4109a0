//! OpenAPI document loading
//!
//! Parses a JSON or YAML document into [`ApiDocument`]: operations grouped by
//! path in document order, each with its request and response
//! [`SchemaNode`]s, plus the table every local `$ref` pointer resolves
//! against. Schemas are parsed structurally; nothing is validated beyond
//! what traversal needs.

use crate::error::{CompileError, Result};
use mcpoas_core::{source_digest_hex, HttpMethod};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};

/// What kind of fragment a [`SchemaNode`] describes
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    /// Local pointer such as `#/components/schemas/Document`
    Reference(String),
    /// `allOf` composition
    AllOf(Vec<SchemaNode>),
    /// `oneOf` / `anyOf`
    Union(Vec<SchemaNode>),
    /// No usable type information
    Unresolved,
}

/// How an object treats properties it does not declare.
///
/// Shared by raw and resolved schemas; `T` is the schema type of the
/// secondary schema in [`Additional::Typed`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Additional<T> {
    #[default]
    Unspecified,
    Forbidden,
    Any,
    Typed(Box<T>),
}

impl<T> Additional<T> {
    pub const fn is_specified(&self) -> bool {
        !matches!(self, Additional::Unspecified)
    }
}

/// One schema fragment as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub properties: BTreeMap<String, SchemaNode>,
    /// Kept as written; may contain duplicates
    pub required: Vec<String>,
    pub items: Option<Box<SchemaNode>>,
    pub additional: Additional<SchemaNode>,
    pub enum_values: Option<Vec<Value>>,
    pub nullable: bool,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl Default for SchemaNode {
    fn default() -> Self {
        Self {
            kind: SchemaKind::Unresolved,
            properties: BTreeMap::new(),
            required: Vec::new(),
            items: None,
            additional: Additional::Unspecified,
            enum_values: None,
            nullable: false,
            description: None,
            example: None,
        }
    }
}

impl SchemaNode {
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn reference(pointer: impl Into<String>) -> Self {
        Self::of_kind(SchemaKind::Reference(pointer.into()))
    }

    /// Parse a schema object.
    ///
    /// Anything that is not a JSON object (including boolean schemas) parses
    /// as [`SchemaKind::Unresolved`].
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let mut node = SchemaNode {
            description: map
                .get("description")
                .and_then(Value::as_str)
                .filter(|d| !d.trim().is_empty())
                .map(String::from),
            example: map.get("example").cloned().or_else(|| {
                map.get("examples")
                    .and_then(Value::as_array)
                    .and_then(|examples| examples.first())
                    .cloned()
            }),
            nullable: map.get("nullable").and_then(Value::as_bool).unwrap_or(false),
            ..Self::default()
        };

        if let Some(pointer) = map.get("$ref").and_then(Value::as_str) {
            node.kind = SchemaKind::Reference(pointer.to_string());
            return node;
        }
        if let Some(branches) = map.get("allOf").and_then(Value::as_array) {
            node.kind = SchemaKind::AllOf(branches.iter().map(Self::from_value).collect());
            return node;
        }
        if let Some(branches) = map
            .get("oneOf")
            .or_else(|| map.get("anyOf"))
            .and_then(Value::as_array)
        {
            node.kind = SchemaKind::Union(branches.iter().map(Self::from_value).collect());
            return node;
        }

        let (declared, null_in_type) = declared_type(map.get("type"));
        node.nullable |= null_in_type;

        if let Some(props) = map.get("properties").and_then(Value::as_object) {
            node.properties = props
                .iter()
                .map(|(name, schema)| (name.clone(), Self::from_value(schema)))
                .collect();
        }
        if let Some(required) = map.get("required").and_then(Value::as_array) {
            node.required = required
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect();
        }
        node.items = map.get("items").map(|items| Box::new(Self::from_value(items)));
        node.additional = match map.get("additionalProperties") {
            Some(Value::Bool(true)) => Additional::Any,
            Some(Value::Bool(false)) => Additional::Forbidden,
            Some(schema @ Value::Object(_)) => Additional::Typed(Box::new(Self::from_value(schema))),
            _ => Additional::Unspecified,
        };
        node.enum_values = map
            .get("enum")
            .and_then(Value::as_array)
            .filter(|values| !values.is_empty())
            .cloned();

        node.kind = match declared {
            Some("object") => SchemaKind::Object,
            Some("array") => SchemaKind::Array,
            Some("string") => SchemaKind::String,
            Some("number") => SchemaKind::Number,
            Some("integer") => SchemaKind::Integer,
            Some("boolean") => SchemaKind::Boolean,
            Some(_) => SchemaKind::Unresolved,
            None => node.inferred_kind(),
        };
        node
    }

    /// Kind implied by the keywords present when `type` is absent
    fn inferred_kind(&self) -> SchemaKind {
        if !self.properties.is_empty() || self.additional.is_specified() {
            SchemaKind::Object
        } else if self.items.is_some() {
            SchemaKind::Array
        } else if self
            .enum_values
            .as_ref()
            .is_some_and(|values| values.iter().all(Value::is_string))
        {
            SchemaKind::String
        } else {
            SchemaKind::Unresolved
        }
    }
}

/// First non-null entry of `type`, and whether `"null"` was listed
fn declared_type(ty: Option<&Value>) -> (Option<&str>, bool) {
    match ty {
        Some(Value::String(s)) => (Some(s.as_str()), s == "null"),
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let first = names.iter().copied().find(|t| *t != "null");
            (first, names.contains(&"null"))
        }
        _ => (None, false),
    }
}

/// Schemas addressable by local `$ref` pointers.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, SchemaNode>,
}

impl ReferenceTable {
    /// Collect every local pointer used anywhere in `root`.
    ///
    /// Pointers whose target does not exist are left out; the resolver
    /// reports them if compilation ever reaches one.
    pub fn from_document(root: &Value) -> Self {
        let mut pointers = Vec::new();
        collect_refs(root, &mut pointers);

        let mut entries = HashMap::new();
        for pointer in pointers {
            if entries.contains_key(&pointer) {
                continue;
            }
            if let Some(target) = lookup_pointer(root, &pointer) {
                entries.insert(pointer, SchemaNode::from_value(target));
            }
        }
        Self { entries }
    }

    pub fn insert(&mut self, pointer: impl Into<String>, node: SchemaNode) {
        self.entries.insert(pointer.into(), node);
    }

    pub fn get(&self, pointer: &str) -> Option<&SchemaNode> {
        self.entries.get(pointer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(pointer) = map.get("$ref").and_then(Value::as_str) {
                out.push(pointer.to_string());
            }
            for child in map.values() {
                collect_refs(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_refs(child, out);
            }
        }
        _ => {}
    }
}

/// Follow a `#/a/b` pointer within the document
fn lookup_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    pointer.strip_prefix('#').and_then(|path| root.pointer(path))
}

/// A single API operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub request: Option<SchemaNode>,
    /// Status code → response body schema
    pub responses: BTreeMap<String, SchemaNode>,
}

impl Operation {
    /// Operation id, falling back to the path without its leading slash
    pub fn identifier(&self) -> &str {
        match self.operation_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => self.path.strip_prefix('/').unwrap_or(&self.path),
        }
    }

    /// Schema of the 200 response, falling back to 201
    pub fn success_response(&self) -> Option<&SchemaNode> {
        self.responses.get("200").or_else(|| self.responses.get("201"))
    }

    /// Human-readable label, e.g. `POST /documents.info`
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Operations sharing one path, keyed in synthesis priority order
#[derive(Debug, Clone, PartialEq)]
pub struct PathItem {
    pub path: String,
    pub operations: BTreeMap<HttpMethod, Operation>,
}

/// A loaded API description.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    pub title: String,
    /// Paths in document order
    pub paths: Vec<PathItem>,
    pub references: ReferenceTable,
    /// Hex SHA256 of the source text, empty when built from a value
    pub source_digest: String,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    #[serde(rename = "operationId")]
    operation_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    #[serde(rename = "requestBody")]
    request_body: Option<Value>,
    #[serde(default)]
    responses: Map<String, Value>,
}

/// Media type preferred when a body offers several
const JSON_MEDIA_TYPE: &str = "application/json";

/// Maximum chain of `requestBody`/`response` level `$ref` hops
const MAX_BODY_REF_HOPS: usize = 8;

impl ApiDocument {
    /// Parse a JSON or YAML document.
    ///
    /// Text starting with `{` is read as JSON, anything else as YAML.
    pub fn load(source: &str) -> Result<Self> {
        let root = if source.trim_start().starts_with('{') {
            serde_json::from_str(source)?
        } else {
            let yaml: serde_yaml::Value = serde_yaml::from_str(source)?;
            yaml_to_json(yaml)
        };
        let mut document = Self::from_value(&root)?;
        document.source_digest = source_digest_hex(source.as_bytes());
        Ok(document)
    }

    /// Build from an already-parsed document
    pub fn from_value(root: &Value) -> Result<Self> {
        let title = root
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or("api")
            .to_string();

        let paths = match root.get("paths") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(paths)) => paths
                .iter()
                .map(|(path, item)| parse_path_item(root, path, item))
                .collect::<Result<_>>()?,
            Some(_) => return Err(CompileError::malformed("paths", "expected a mapping")),
        };

        Ok(Self {
            title,
            paths,
            references: ReferenceTable::from_document(root),
            source_digest: String::new(),
        })
    }

    /// Every operation, in synthesis order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.paths.iter().flat_map(|item| item.operations.values())
    }
}

fn parse_path_item(root: &Value, path: &str, item: &Value) -> Result<PathItem> {
    let Value::Object(item) = item else {
        return Err(CompileError::malformed(path, "path item is not a mapping"));
    };

    let mut operations = BTreeMap::new();
    for method in HttpMethod::ALL {
        let Some(raw) = item.get(method.path_item_key()) else {
            continue;
        };
        let location = format!("{} {}", method, path);
        let raw: RawOperation = serde_json::from_value(raw.clone())
            .map_err(|e| CompileError::malformed(&location, e.to_string()))?;

        let request = match raw.request_body {
            Some(ref body) => body_schema(root, body, &location)?,
            None => None,
        };

        let mut responses = BTreeMap::new();
        for (status, response) in &raw.responses {
            let location = format!("{} response {}", location, status);
            if let Some(schema) = body_schema(root, response, &location)? {
                responses.insert(status.clone(), schema);
            }
        }

        operations.insert(
            method,
            Operation {
                path: path.to_string(),
                method,
                operation_id: raw.operation_id,
                summary: raw.summary,
                description: raw.description,
                request,
                responses,
            },
        );
    }

    Ok(PathItem {
        path: path.to_string(),
        operations,
    })
}

/// Schema under `content.<media>.schema` of a request body or response,
/// following `$ref`s to shared bodies
fn body_schema(root: &Value, body: &Value, location: &str) -> Result<Option<SchemaNode>> {
    let mut body = body;
    for _ in 0..MAX_BODY_REF_HOPS {
        let Some(pointer) = body.get("$ref").and_then(Value::as_str) else {
            break;
        };
        body = lookup_pointer(root, pointer).ok_or_else(|| {
            CompileError::UnresolvedReference {
                pointer: pointer.to_string(),
            }
            .in_operation(location)
        })?;
    }

    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return Ok(None);
    };
    let media = content
        .get(JSON_MEDIA_TYPE)
        .or_else(|| content.values().next());
    Ok(media
        .and_then(|m| m.get("schema"))
        .map(SchemaNode::from_value))
}

/// Convert YAML into JSON, stringifying non-string mapping keys
/// (`200:` parses as an integer key in YAML)
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => yaml_to_json(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_YAML: &str = r##"
openapi: 3.0.0
info:
  title: Outline API
paths:
  /documents.info:
    post:
      operationId: documents.info
      summary: Retrieve a document
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                id:
                  type: string
              required: [id]
      responses:
        200:
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Document'
        401:
          $ref: '#/components/responses/Unauthenticated'
    get:
      operationId: documents.fetch
components:
  schemas:
    Document:
      type: object
      properties:
        title:
          type: string
  responses:
    Unauthenticated:
      description: The API key is missing or invalid
      content:
        application/json:
          schema:
            $ref: '#/components/schemas/Error'
    "##;

    #[test]
    fn test_load_yaml() {
        let doc = ApiDocument::load(SAMPLE_YAML).unwrap();

        assert_eq!(doc.title, "Outline API");
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.source_digest.len(), 64);

        let ops: Vec<&Operation> = doc.operations().collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].method, HttpMethod::Post);
        assert_eq!(ops[1].method, HttpMethod::Get);

        let info = ops[0];
        assert_eq!(info.identifier(), "documents.info");
        assert_eq!(info.request.as_ref().map(|r| &r.required), Some(&vec!["id".to_string()]));
        assert_eq!(
            info.success_response().map(|r| &r.kind),
            Some(&SchemaKind::Reference("#/components/schemas/Document".into()))
        );
        // integer status keys survive the YAML conversion
        assert!(info.responses.contains_key("401"));
    }

    #[test]
    fn test_reference_table_skips_dangling_pointers() {
        let doc = ApiDocument::load(SAMPLE_YAML).unwrap();
        assert!(doc.references.get("#/components/schemas/Document").is_some());
        assert!(doc.references.get("#/components/schemas/Error").is_none());
    }

    #[test]
    fn test_identifier_falls_back_to_path() {
        let op = Operation {
            path: "/auth.info".into(),
            method: HttpMethod::Post,
            operation_id: None,
            summary: None,
            description: None,
            request: None,
            responses: BTreeMap::new(),
        };
        assert_eq!(op.identifier(), "auth.info");
        assert_eq!(op.label(), "POST /auth.info");
    }

    #[test]
    fn test_schema_node_parsing() {
        let node = SchemaNode::from_value(&json!({
            "type": ["string", "null"],
            "enum": ["read", "read_write"],
            "description": "Permission",
            "example": "read"
        }));
        assert_eq!(node.kind, SchemaKind::String);
        assert!(node.nullable);
        assert_eq!(node.enum_values.as_ref().map(Vec::len), Some(2));
        assert_eq!(node.example, Some(json!("read")));

        let node = SchemaNode::from_value(&json!({"properties": {"a": {}}}));
        assert_eq!(node.kind, SchemaKind::Object);
        assert_eq!(node.properties["a"].kind, SchemaKind::Unresolved);

        let node = SchemaNode::from_value(&json!({"additionalProperties": {"type": "number"}}));
        assert_eq!(node.kind, SchemaKind::Object);
        assert!(matches!(node.additional, Additional::Typed(_)));

        let node = SchemaNode::from_value(&json!({"anyOf": [{"type": "string"}, {"type": "null"}]}));
        assert!(matches!(node.kind, SchemaKind::Union(ref b) if b.len() == 2));

        assert_eq!(SchemaNode::from_value(&json!(true)).kind, SchemaKind::Unresolved);
    }

    #[test]
    fn test_dangling_body_reference_is_fatal() {
        let err = ApiDocument::from_value(&json!({
            "paths": {
                "/shares.list": {
                    "post": {"requestBody": {"$ref": "#/components/requestBodies/Missing"}}
                }
            }
        }))
        .unwrap_err();
        assert_eq!(err.unresolved_pointer(), Some("#/components/requestBodies/Missing"));
    }

    #[test]
    fn test_malformed_paths() {
        let err = ApiDocument::from_value(&json!({"paths": []})).unwrap_err();
        assert!(matches!(err, CompileError::Malformed { .. }));
    }
}
