use thiserror::Error;

/// Errors that abort a compilation run.
///
/// Nothing here is recoverable per node: ambiguous or cyclic schemas degrade
/// silently instead of producing an error.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize tool set: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to parse YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Malformed document at {location}: {reason}")]
    Malformed { location: String, reason: String },

    #[error("Unresolvable reference: {pointer}")]
    UnresolvedReference { pointer: String },

    #[error("Duplicate tool name {name}: derived from both {first} and {second}")]
    DuplicateToolName {
        name: String,
        first: String,
        second: String,
    },

    #[error("{operation}: {source}")]
    InOperation {
        operation: String,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::Malformed {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Attach the operation being compiled when the error surfaced
    pub(crate) fn in_operation(self, operation: impl Into<String>) -> Self {
        CompileError::InOperation {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// The dangling pointer, if this error was caused by one
    pub fn unresolved_pointer(&self) -> Option<&str> {
        match self {
            CompileError::UnresolvedReference { pointer } => Some(pointer),
            CompileError::InOperation { source, .. } => source.unresolved_pointer(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn test_parse_and_serialize_messages_differ() {
        let parse = CompileError::from(json_error());
        assert!(parse.to_string().starts_with("Failed to parse JSON document"));

        let write = CompileError::Serialize(json_error());
        assert!(write.to_string().starts_with("Failed to serialize tool set"));
    }

    #[test]
    fn test_unresolved_pointer_through_operation() {
        let err = CompileError::UnresolvedReference {
            pointer: "#/components/schemas/Missing".to_string(),
        }
        .in_operation("POST /documents.info");
        assert_eq!(err.unresolved_pointer(), Some("#/components/schemas/Missing"));
        assert_eq!(
            err.to_string(),
            "POST /documents.info: Unresolvable reference: #/components/schemas/Missing"
        );
        assert_eq!(CompileError::Serialize(json_error()).unresolved_pointer(), None);
    }
}
