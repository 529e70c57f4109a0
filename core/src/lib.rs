//! mcpoas-core: MCP tool definitions compiled from OpenAPI documents
//!
//! This crate provides the data types shared by the compiler and the
//! runtime dispatcher: the validator graph, tool definitions and the
//! tool-set artifact, plus the interpreter and JSON emitters for them.

mod digest;
mod json;
mod schema;
mod validate;

pub use digest::*;
pub use schema::*;
pub use validate::{validate, ValidationError};
pub use json::{
    // Artifact (reloadable without the compiler)
    generate_artifact,
    generate_artifact_pretty,
    parse_artifact,
    // MCP `tools/list` rendering
    validator_to_json_schema,
    tool_to_listing_entry,
    generate_listing,
    generate_paginated_listing,
    ListingPages,
};

/// MCP protocol version
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Version of the persisted [`ToolSet`] format.
///
/// Bumped whenever the serialized shape of [`ValidatorExpr`] or
/// [`ToolDefinition`] changes incompatibly.
pub const ARTIFACT_VERSION: u32 = 1;

/// Default number of tools per `tools/list` page
pub const DEFAULT_PAGE_SIZE: usize = 50;
