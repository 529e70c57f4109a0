//! Compiler settings

/// Namespace token prefixed to every tool name
pub const DEFAULT_NAMESPACE: &str = "outline";

/// Reference hops and `allOf` levels followed before a schema degrades to
/// permissive
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Field that carries a non-object request body inside the input object
pub const DEFAULT_BODY_FIELD: &str = "body";

/// Appended to the description of every tool whose request accepts
/// `limit` or `offset`
pub const PAGINATION_ADVISORY: &str =
    "This endpoint is paginated: use `limit` and `offset` to page through results.";

/// Settings for one compilation run.
///
/// # Example
///
/// ```
/// use oas2mcp::CompilerConfig;
///
/// let config = CompilerConfig::default().with_namespace("acme");
/// assert_eq!(config.namespace, "acme");
/// assert_eq!(config.max_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub namespace: String,
    pub max_depth: usize,
    pub body_field: String,
    pub pagination_advisory: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            body_field: DEFAULT_BODY_FIELD.to_string(),
            pagination_advisory: PAGINATION_ADVISORY.to_string(),
        }
    }
}

impl CompilerConfig {
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_body_field(mut self, field: impl Into<String>) -> Self {
        self.body_field = field.into();
        self
    }
}
