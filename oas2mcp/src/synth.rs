//! Tool synthesis
//!
//! One [`ToolDefinition`] per operation, in document path order and, within
//! a path, in [`HttpMethod`](mcpoas_core::HttpMethod) priority order.

use crate::annotations::derive_annotations;
use crate::compile::{compile, Mode};
use crate::config::CompilerConfig;
use crate::document::{ApiDocument, Operation};
use crate::error::{CompileError, Result};
use crate::naming::canonical_name;
use crate::resolve::{ResolvedSchema, Resolver};
use mcpoas_core::{
    PropertyRule, ToolBuilder, ToolDefinition, UnknownFields, ValidatorExpr, ValidatorKind,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Request properties that mark an operation as paginated
const PAGINATION_FIELDS: [&str; 2] = ["limit", "offset"];

/// Build the tool for every operation in `document`.
///
/// # Errors
///
/// Fails on the first unresolvable reference or on two operations deriving
/// the same tool name. No partial result is returned.
pub fn synthesize(document: &ApiDocument, config: &CompilerConfig) -> Result<Vec<ToolDefinition>> {
    let resolver = Resolver::new(&document.references, config.max_depth);
    let mut tools = Vec::new();
    let mut origins: HashMap<String, String> = HashMap::new();

    for operation in document.operations() {
        let tool = synthesize_operation(operation, &resolver, config)
            .map_err(|e| e.in_operation(operation.label()))?;

        if let Some(first) = origins.insert(tool.name.clone(), operation.label()) {
            return Err(CompileError::DuplicateToolName {
                name: tool.name,
                first,
                second: operation.label(),
            });
        }

        debug!(tool = %tool.name, target = %tool.target, "synthesized tool");
        tools.push(tool);
    }

    Ok(tools)
}

/// Build the tool for a single operation
pub fn synthesize_operation(
    operation: &Operation,
    resolver: &Resolver<'_>,
    config: &CompilerConfig,
) -> Result<ToolDefinition> {
    let identifier = operation.identifier();

    let request = operation
        .request
        .as_ref()
        .map(|node| resolver.resolve_root(node))
        .transpose()?;
    let wrapped = request.as_ref().is_some_and(|schema| !schema.is_object());
    let input = match &request {
        Some(schema) if wrapped => wrap_body(&config.body_field, compile(schema, Mode::Input)),
        Some(schema) => non_null(compile(schema, Mode::Input)),
        None => ValidatorExpr::empty_object(),
    };

    let output = match operation.success_response() {
        Some(node) => {
            let response = resolver.resolve_root(node)?;
            response
                .is_object()
                .then(|| compile(&response, Mode::Output))
        }
        None => None,
    };

    let mut description = operation
        .description
        .clone()
        .or_else(|| operation.summary.clone())
        .unwrap_or_default();
    if request.as_ref().is_some_and(is_paginated) {
        append_advisory(&mut description, &config.pagination_advisory);
    }

    let title = operation
        .summary
        .clone()
        .unwrap_or_else(|| identifier.to_string());

    let mut builder = ToolBuilder::new(
        canonical_name(&config.namespace, identifier),
        operation.method,
        operation.path.clone(),
    )
    .title(title)
    .description(description)
    .input(input)
    .annotations(derive_annotations(identifier));
    if let Some(ref id) = operation.operation_id {
        builder = builder.operation_id(id.clone());
    }
    if wrapped {
        builder = builder.wrapped_body(config.body_field.clone());
    }
    if let Some(output) = output {
        builder = builder.output(output);
    }
    Ok(builder.build())
}

/// Strict object with the non-object request body as its only field
fn wrap_body(field: &str, body: ValidatorExpr) -> ValidatorExpr {
    let mut properties = BTreeMap::new();
    properties.insert(field.to_string(), PropertyRule::required(body));
    ValidatorExpr::object(properties, UnknownFields::Reject)
}

/// Arguments always arrive as an object, so a nullable request object is
/// accepted as the object alone
fn non_null(input: ValidatorExpr) -> ValidatorExpr {
    match input.kind {
        ValidatorKind::Nullable { inner } => *inner,
        kind => ValidatorExpr { kind, doc: input.doc },
    }
}

fn is_paginated(request: &ResolvedSchema) -> bool {
    request.as_object().is_some_and(|object| {
        PAGINATION_FIELDS
            .iter()
            .any(|field| object.properties.contains_key(*field))
    })
}

fn append_advisory(description: &mut String, advisory: &str) {
    if description.ends_with(advisory) {
        return;
    }
    if !description.is_empty() {
        description.push_str("\n\n");
    }
    description.push_str(advisory);
}
