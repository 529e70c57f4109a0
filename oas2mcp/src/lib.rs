//! OpenAPI to MCP Tool Compiler
//!
//! Compiles an OpenAPI document into a [`ToolSet`]: one MCP tool per
//! operation, each with a strict input validator, a lenient output validator
//! when the response is object-shaped, and safety annotations.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`ApiDocument::load`] parses the document and its reference table
//! 2. [`Resolver`] expands `$ref`s and flattens `allOf`, bounded by depth and
//!    per-path cycle tracking
//! 3. [`compile()`] turns resolved schemas into validators
//! 4. [`synthesize`] names, annotates and assembles the tools
//!
//! # Example
//!
//! ```
//! use oas2mcp::{compile_source, CompilerConfig};
//!
//! let spec = r#"{"paths": {"/auth.info": {"post": {"operationId": "auth.info"}}}}"#;
//! let set = compile_source(spec, &CompilerConfig::default()).unwrap();
//! assert_eq!(set.tools[0].name, "outline_auth_info");
//! assert!(set.tools[0].annotations.read_only);
//! ```

pub mod annotations;
pub mod compile;
pub mod config;
pub mod document;
pub mod error;
pub mod naming;
pub mod resolve;
pub mod synth;

pub use compile::{compile, Mode};
pub use config::CompilerConfig;
pub use document::{ApiDocument, Operation, SchemaKind, SchemaNode};
pub use error::{CompileError, Result};
pub use resolve::{ResolvedSchema, Resolver};
pub use synth::synthesize;

use mcpoas_core::{generate_artifact, ToolSet, ToolSetBuilder};
use tracing::info;

/// Compile a loaded document into a tool set
pub fn compile_document(document: &ApiDocument, config: &CompilerConfig) -> Result<ToolSet> {
    let tools = synthesize(document, config)?;
    info!(
        api = %document.title,
        tools = tools.len(),
        references = document.references.len(),
        "compiled tool set"
    );

    let builder = tools.into_iter().fold(
        ToolSetBuilder::new(&document.title).source_digest(&document.source_digest),
        ToolSetBuilder::add_tool,
    );
    Ok(builder.build())
}

/// Load a JSON or YAML document and compile it
pub fn compile_source(source: &str, config: &CompilerConfig) -> Result<ToolSet> {
    let document = ApiDocument::load(source)?;
    compile_document(&document, config)
}

/// Compile a document with the default settings and return the compact
/// artifact JSON
pub fn convert_openapi_to_json(source: &str) -> Result<String> {
    let set = compile_source(source, &CompilerConfig::default())?;
    generate_artifact(&set).map_err(CompileError::Serialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpoas_core::parse_artifact;

    const SAMPLE_SPEC: &str = r##"{
        "openapi": "3.0.0",
        "info": {"title": "Outline API"},
        "paths": {
            "/collections.list": {
                "post": {
                    "operationId": "collections.list",
                    "summary": "List all collections",
                    "requestBody": {"content": {"application/json": {"schema": {
                        "$ref": "#/components/schemas/Pagination"
                    }}}},
                    "responses": {"200": {"content": {"application/json": {"schema": {
                        "type": "object",
                        "properties": {"data": {"type": "array", "items": {"$ref": "#/components/schemas/Collection"}}}
                    }}}}}
                }
            }
        },
        "components": {"schemas": {
            "Pagination": {"type": "object", "properties": {
                "limit": {"type": "integer"}, "offset": {"type": "integer"}
            }},
            "Collection": {"type": "object", "properties": {"id": {"type": "string"}}}
        }}
    }"##;

    #[test]
    fn test_compile_source() {
        let set = compile_source(SAMPLE_SPEC, &CompilerConfig::default()).unwrap();

        assert_eq!(set.name, "Outline API");
        assert_eq!(set.source_digest.len(), 64);
        assert_eq!(set.tools.len(), 1);

        let tool = &set.tools[0];
        assert_eq!(tool.name, "outline_collections_list");
        assert_eq!(tool.title, "List all collections");
        assert!(tool.annotations.read_only);
        assert!(tool.output.is_some());
    }

    #[test]
    fn test_convert_to_json() {
        let json = convert_openapi_to_json(SAMPLE_SPEC).unwrap();

        assert!(json.contains("\"name\":\"outline_collections_list\""));
        assert!(json.contains("\"artifactVersion\":1"));

        let reloaded = parse_artifact(&json).unwrap();
        assert_eq!(reloaded.tools.len(), 1);
    }
}
