//! MCP Tool Dispatcher
//!
//! Loads a compiled tool set and dispatches calls against the remote API.
//!
//! Every call is validated against the tool's input validator before any
//! transport is touched. Responses come back raw, plus a structured view
//! when the tool has an output validator and the response satisfies it.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcpoas_client::{Dispatcher, ToolRegistry};
//!
//! let registry = ToolRegistry::from_json(&std::fs::read_to_string("tools.json")?)?;
//! let dispatcher = Dispatcher::new(registry, my_http_transport);
//!
//! let outcome = dispatcher.call("outline_documents_info", &json!({"id": "abc"}))?;
//! if let Some(document) = outcome.structured {
//!     println!("{}", document["data"]["title"]);
//! }
//! ```

use mcpoas_core::{
    parse_artifact, validate, ListingPages, Target, ToolDefinition, ToolSet, ValidationError,
    ARTIFACT_VERSION, DEFAULT_PAGE_SIZE,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Error type transports report failures with
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when loading or calling tools.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to parse tool set: {0}")]
    ParseArtifact(#[from] serde_json::Error),

    #[error("Unsupported tool set version {found}, expected {expected}")]
    ArtifactVersion { found: u32, expected: u32 },

    #[error("Duplicate tool in tool set: {0}")]
    DuplicateTool(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: ValidationError,
    },

    #[error("Request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: TransportError,
    },

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Sends a validated payload to the remote API.
///
/// Implementations own everything about the wire: base URL, auth headers,
/// retries. The dispatcher only hands over the target and the payload.
pub trait Transport {
    fn send(&self, target: &Target, payload: &Value) -> std::result::Result<Value, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, target: &Target, payload: &Value) -> std::result::Result<Value, TransportError> {
        (**self).send(target, payload)
    }
}

/// Loaded, read-only tool set.
///
/// Cloning is cheap; clones share the same tools and listing pages, so a
/// registry can be handed to any number of request handlers.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    set: Arc<ToolSet>,
    pages: Arc<ListingPages>,
}

impl ToolRegistry {
    /// Wrap a tool set, checking its version and name uniqueness
    pub fn new(set: ToolSet) -> Result<Self> {
        Self::with_page_size(set, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(set: ToolSet, page_size: usize) -> Result<Self> {
        if set.artifact_version != ARTIFACT_VERSION {
            return Err(DispatchError::ArtifactVersion {
                found: set.artifact_version,
                expected: ARTIFACT_VERSION,
            });
        }
        if let Some(name) = set.duplicate_name() {
            return Err(DispatchError::DuplicateTool(name.to_string()));
        }

        let pages = ListingPages::from_tool_set(&set, page_size);
        debug!(api = %set.name, tools = set.tools.len(), pages = pages.num_pages(), "loaded tool set");
        Ok(Self {
            set: Arc::new(set),
            pages: Arc::new(pages),
        })
    }

    /// Load an artifact produced by the compiler
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(parse_artifact(json)?)
    }

    pub fn name(&self) -> &str {
        &self.set.name
    }

    /// Hex digest of the document the tools were compiled from
    pub fn source_digest(&self) -> &str {
        &self.set.source_digest
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.set.tools
    }

    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.set.tool(name)
    }

    /// Serialized `tools/list` page for an MCP cursor.
    ///
    /// `None` is the first page; later cursors are the `nextCursor` values
    /// handed out by previous pages.
    pub fn list_page(&self, cursor: Option<&str>) -> Result<&str> {
        let index = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| DispatchError::InvalidCursor(c.to_string()))?,
        };
        self.pages
            .get_page(index)
            .ok_or_else(|| DispatchError::InvalidCursor(index.to_string()))
    }

    pub fn num_pages(&self) -> usize {
        self.pages.num_pages()
    }
}

/// Result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// Response exactly as the transport returned it
    pub raw: Value,
    /// The response, when the tool has an output validator that accepts it
    pub structured: Option<Value>,
    /// Why the output validator rejected the response, if it did
    pub output_error: Option<ValidationError>,
}

/// Validates and forwards tool calls.
#[derive(Debug)]
pub struct Dispatcher<T> {
    registry: ToolRegistry,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub const fn new(registry: ToolRegistry, transport: T) -> Self {
        Self { registry, transport }
    }

    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Call a tool by name.
    ///
    /// Arguments failing the input validator are rejected before the
    /// transport is used. A response failing the output validator is not an
    /// error: the raw response is still returned, without a structured view.
    pub fn call(&self, name: &str, arguments: &Value) -> Result<CallOutcome> {
        let tool = self
            .registry
            .tool(name)
            .ok_or_else(|| DispatchError::ToolNotFound(name.to_string()))?;

        validate(&tool.input, arguments).map_err(|source| DispatchError::InvalidArguments {
            tool: name.to_string(),
            source,
        })?;

        let payload = match tool.target.body_field.as_deref() {
            Some(field) => arguments.get(field).cloned().unwrap_or(Value::Null),
            None => arguments.clone(),
        };

        debug!(tool = name, target = %tool.target, "dispatching tool call");
        let raw = self
            .transport
            .send(&tool.target, &payload)
            .map_err(|source| DispatchError::Transport {
                target: tool.target.to_string(),
                source,
            })?;

        let (structured, output_error) = match &tool.output {
            None => (None, None),
            Some(output) => match validate(output, &raw) {
                Ok(()) => (Some(raw.clone()), None),
                Err(e) => {
                    warn!(tool = name, error = %e, "response does not match output schema");
                    (None, Some(e))
                }
            },
        };

        Ok(CallOutcome {
            raw,
            structured,
            output_error,
        })
    }
}
