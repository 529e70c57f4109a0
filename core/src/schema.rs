//! Tool definition and validator types
//!
//! Everything in this module is plain data: the compiler builds it once,
//! the artifact persists it, and the dispatcher only ever reads it.
//!
//! # Architecture
//!
//! - **Validator graph**: [`ValidatorExpr`] is a tagged tree interpreted by
//!   [`crate::validate`] and rendered by [`crate::validator_to_json_schema`]
//! - **Tools**: [`ToolDefinition`] pairs validators with the HTTP target
//! - **Artifact**: [`ToolSet`] is the ordered, versioned sequence of tools

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A compiled validator.
///
/// The documentation string always sits on the innermost expression: a
/// nullable wrapper never carries its own doc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorExpr {
    pub kind: ValidatorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Shape checked by a [`ValidatorExpr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorKind {
    /// JSON object with per-property rules
    Object {
        properties: BTreeMap<String, PropertyRule>,
        unknown: UnknownFields,
    },
    /// JSON array, every element checked against `items`
    Array { items: Box<ValidatorExpr> },
    /// JSON string, optionally restricted to a closed set
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allowed: Option<Vec<String>>,
    },
    /// Exactly one of the listed JSON literals
    Literals { values: Vec<Value> },
    /// JSON number; `integer` additionally requires an integral value
    Number {
        #[serde(default)]
        integer: bool,
    },
    Boolean,
    /// `null` or whatever `inner` accepts
    Nullable { inner: Box<ValidatorExpr> },
    /// Accepts any value
    Any,
}

/// Policy for object properties that have no declared rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    Reject,
    AllowAny,
    /// Unknown properties are allowed but checked against this validator
    Typed(Box<ValidatorExpr>),
}

/// Rule for one declared object property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRule {
    pub validator: ValidatorExpr,
    pub required: bool,
}

impl PropertyRule {
    pub const fn required(validator: ValidatorExpr) -> Self {
        Self { validator, required: true }
    }

    pub const fn optional(validator: ValidatorExpr) -> Self {
        Self { validator, required: false }
    }
}

impl ValidatorExpr {
    pub const fn new(kind: ValidatorKind) -> Self {
        Self { kind, doc: None }
    }

    pub const fn any() -> Self {
        Self::new(ValidatorKind::Any)
    }

    pub const fn string() -> Self {
        Self::new(ValidatorKind::String { allowed: None })
    }

    pub const fn boolean() -> Self {
        Self::new(ValidatorKind::Boolean)
    }

    pub const fn number() -> Self {
        Self::new(ValidatorKind::Number { integer: false })
    }

    pub const fn integer() -> Self {
        Self::new(ValidatorKind::Number { integer: true })
    }

    pub fn enumeration(allowed: Vec<String>) -> Self {
        Self::new(ValidatorKind::String { allowed: Some(allowed) })
    }

    pub fn literals(values: Vec<Value>) -> Self {
        Self::new(ValidatorKind::Literals { values })
    }

    pub fn array(items: ValidatorExpr) -> Self {
        Self::new(ValidatorKind::Array { items: Box::new(items) })
    }

    pub fn object(properties: BTreeMap<String, PropertyRule>, unknown: UnknownFields) -> Self {
        Self::new(ValidatorKind::Object { properties, unknown })
    }

    /// Object with no properties that rejects everything but `{}`
    pub fn empty_object() -> Self {
        Self::object(BTreeMap::new(), UnknownFields::Reject)
    }

    /// Wrap this validator so it additionally accepts `null`.
    ///
    /// Already-nullable validators are returned unchanged.
    pub fn nullable(self) -> Self {
        if self.is_nullable() {
            return self;
        }
        Self::new(ValidatorKind::Nullable { inner: Box::new(self) })
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub const fn is_nullable(&self) -> bool {
        matches!(self.kind, ValidatorKind::Nullable { .. })
    }

    pub const fn is_object(&self) -> bool {
        matches!(self.kind, ValidatorKind::Object { .. })
    }

    /// Innermost expression below any nullable wrappers
    pub fn innermost(&self) -> &ValidatorExpr {
        match &self.kind {
            ValidatorKind::Nullable { inner } => inner.innermost(),
            _ => self,
        }
    }

    /// Declared properties, when this is an object validator
    pub const fn properties(&self) -> Option<&BTreeMap<String, PropertyRule>> {
        match &self.kind {
            ValidatorKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Documentation of the innermost expression
    pub fn documentation(&self) -> Option<&str> {
        self.innermost().doc.as_deref()
    }
}

/// HTTP methods an operation can be compiled from.
///
/// The declaration order is the order in which methods sharing one path are
/// turned into tools: POST, GET, PUT, PATCH, DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Get,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// All methods in synthesis priority order
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Post,
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Lowercase key used for this method in an OpenAPI path item
    pub const fn path_item_key(&self) -> &'static str {
        match self {
            HttpMethod::Post => "post",
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote method a tool dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Set when a non-object request body was wrapped; the payload sent is
    /// the value of this argument rather than the whole argument object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_field: Option<String>,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Safety hints describing a tool's side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub open_world: bool,
}

impl Default for ToolAnnotations {
    fn default() -> Self {
        Self {
            read_only: false,
            destructive: false,
            idempotent: false,
            open_world: true,
        }
    }
}

/// A compiled MCP tool.
///
/// The input validator is always present; the output validator exists only
/// when the success response is object-shaped, and never rejects unknown
/// fields. Use [`ToolBuilder`] to construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    pub target: Target,
    pub input: ValidatorExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ValidatorExpr>,
    pub annotations: ToolAnnotations,
}

/// The persisted artifact: every tool compiled from one source document.
///
/// # Example
///
/// ```
/// use mcpoas_core::{HttpMethod, ToolBuilder, ToolSetBuilder};
///
/// let set = ToolSetBuilder::new("Outline API")
///     .add_tool(ToolBuilder::new("outline_auth_info", HttpMethod::Post, "/auth.info").build())
///     .build();
/// assert_eq!(set.tools.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSet {
    pub protocol_version: String,
    pub artifact_version: u32,
    /// API title taken from the source document
    pub name: String,
    /// Hex SHA256 of the source document, empty when unknown
    #[serde(default)]
    pub source_digest: String,
    pub tools: Vec<ToolDefinition>,
}

impl ToolSet {
    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Keep only the tools for which `keep` returns true, preserving order
    pub fn retain(&mut self, keep: impl FnMut(&ToolDefinition) -> bool) {
        self.tools.retain(keep);
    }

    /// First name that appears more than once, if any
    pub fn duplicate_name(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.tools
            .iter()
            .map(|t| t.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

/// Builder for [`ToolSet`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ToolSetBuilder {
    name: String,
    source_digest: String,
    tools: Vec<ToolDefinition>,
}

impl ToolSetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_digest: String::new(),
            tools: Vec::new(),
        }
    }

    /// Record the hex digest of the source document, see
    /// [`crate::source_digest_hex`]
    pub fn source_digest(mut self, digest: impl Into<String>) -> Self {
        self.source_digest = digest.into();
        self
    }

    pub fn add_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn build(self) -> ToolSet {
        ToolSet {
            protocol_version: crate::PROTOCOL_VERSION.to_string(),
            artifact_version: crate::ARTIFACT_VERSION,
            name: self.name,
            source_digest: self.source_digest,
            tools: self.tools,
        }
    }
}

/// Builder for [`ToolDefinition`].
///
/// # Example
///
/// ```
/// use mcpoas_core::{HttpMethod, ToolBuilder, ValidatorExpr};
///
/// let tool = ToolBuilder::new("outline_documents_info", HttpMethod::Post, "/documents.info")
///     .title("Retrieve a document")
///     .description("Retrieve a document by its id")
///     .output(ValidatorExpr::empty_object())
///     .build();
/// assert!(tool.output.is_some());
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ToolBuilder {
    name: String,
    title: Option<String>,
    description: String,
    target: Target,
    input: ValidatorExpr,
    output: Option<ValidatorExpr>,
    annotations: ToolAnnotations,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: String::new(),
            target: Target {
                method,
                path: path.into(),
                operation_id: None,
                body_field: None,
            },
            input: ValidatorExpr::empty_object(),
            output: None,
            annotations: ToolAnnotations::default(),
        }
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.target.operation_id = Some(id.into());
        self
    }

    /// Mark the input as a wrapped request body held in `field`
    pub fn wrapped_body(mut self, field: impl Into<String>) -> Self {
        self.target.body_field = Some(field.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input(mut self, input: ValidatorExpr) -> Self {
        self.input = input;
        self
    }

    pub fn output(mut self, output: ValidatorExpr) -> Self {
        self.output = Some(output);
        self
    }

    pub fn annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Title falls back to the tool name
    pub fn build(self) -> ToolDefinition {
        ToolDefinition {
            title: self.title.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            description: self.description,
            target: self.target,
            input: self.input,
            output: self.output,
            annotations: self.annotations,
        }
    }
}
