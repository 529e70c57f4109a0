//! Reference resolution and `allOf` flattening
//!
//! Turns a [`SchemaNode`] into a [`ResolvedSchema`]: a tree with no
//! references and no compositions left anywhere in it.
//!
//! Termination is guaranteed two ways. Every recursive step carries the set
//! of pointers already followed on its own path (cloned on extension, never
//! shared between siblings), and revisiting one yields an unresolved node.
//! Independently, a chain of reference hops and `allOf` levels longer than
//! the configured maximum also yields an unresolved node. Inline nesting is
//! finite and does not count.

use crate::document::{Additional, ReferenceTable, SchemaKind, SchemaNode};
use crate::error::{CompileError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Concrete shape of a resolved schema
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedShape {
    Object(ResolvedObject),
    Array(Option<Box<ResolvedSchema>>),
    String,
    Number,
    Integer,
    Boolean,
    /// `oneOf` / `anyOf`, left unmodelled
    Union,
    /// Cycle, depth limit or missing type information
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedObject {
    pub properties: BTreeMap<String, ResolvedSchema>,
    pub required: Vec<String>,
    pub additional: Additional<ResolvedSchema>,
}

/// A schema free of references and compositions at every depth.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub shape: ResolvedShape,
    pub enum_values: Option<Vec<Value>>,
    pub nullable: bool,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl Default for ResolvedSchema {
    fn default() -> Self {
        Self::unresolved()
    }
}

impl ResolvedSchema {
    /// Empty, permissive schema
    pub const fn unresolved() -> Self {
        Self {
            shape: ResolvedShape::Unresolved,
            enum_values: None,
            nullable: false,
            description: None,
            example: None,
        }
    }

    /// Leaf with the annotations of `node` and the given shape
    fn leaf(node: &SchemaNode, shape: ResolvedShape) -> Self {
        Self {
            shape,
            enum_values: node.enum_values.clone(),
            nullable: node.nullable,
            description: node.description.clone(),
            example: node.example.clone(),
        }
    }

    pub const fn is_object(&self) -> bool {
        matches!(self.shape, ResolvedShape::Object(_))
    }

    pub const fn as_object(&self) -> Option<&ResolvedObject> {
        match &self.shape {
            ResolvedShape::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Pointers followed on the current resolution path
pub type VisitedRefs = BTreeSet<String>;

/// Resolves schema nodes against a document's reference table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    references: &'a ReferenceTable,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub const fn new(references: &'a ReferenceTable, max_depth: usize) -> Self {
        Self {
            references,
            max_depth,
        }
    }

    /// Resolve a top-level schema with a fresh visited set
    pub fn resolve_root(&self, node: &SchemaNode) -> Result<ResolvedSchema> {
        self.resolve(node, &VisitedRefs::new(), 0)
    }

    /// Resolve `node` found at `depth` along a path that has already
    /// followed the pointers in `visited`.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnresolvedReference`] when a pointer reached during
    /// resolution has no target in the document.
    pub fn resolve(
        &self,
        node: &SchemaNode,
        visited: &VisitedRefs,
        depth: usize,
    ) -> Result<ResolvedSchema> {
        if depth > self.max_depth {
            trace!(depth, "reference chain past depth limit, left unresolved");
            return Ok(ResolvedSchema::unresolved());
        }

        match &node.kind {
            SchemaKind::Reference(pointer) => self.resolve_reference(node, pointer, visited, depth),
            SchemaKind::AllOf(branches) => self.merge_all_of(node, branches, visited, depth),
            SchemaKind::Union(_) => Ok(ResolvedSchema::leaf(node, ResolvedShape::Union)),
            SchemaKind::Object => {
                let mut object = ResolvedObject {
                    required: node.required.clone(),
                    ..ResolvedObject::default()
                };
                for (name, child) in &node.properties {
                    object
                        .properties
                        .insert(name.clone(), self.resolve(child, visited, depth)?);
                }
                object.additional = match &node.additional {
                    Additional::Unspecified => Additional::Unspecified,
                    Additional::Forbidden => Additional::Forbidden,
                    Additional::Any => Additional::Any,
                    Additional::Typed(extra) => {
                        Additional::Typed(Box::new(self.resolve(extra, visited, depth)?))
                    }
                };
                Ok(ResolvedSchema::leaf(node, ResolvedShape::Object(object)))
            }
            SchemaKind::Array => {
                let items = match &node.items {
                    Some(items) => Some(Box::new(self.resolve(items, visited, depth)?)),
                    None => None,
                };
                Ok(ResolvedSchema::leaf(node, ResolvedShape::Array(items)))
            }
            SchemaKind::String => Ok(ResolvedSchema::leaf(node, ResolvedShape::String)),
            SchemaKind::Number => Ok(ResolvedSchema::leaf(node, ResolvedShape::Number)),
            SchemaKind::Integer => Ok(ResolvedSchema::leaf(node, ResolvedShape::Integer)),
            SchemaKind::Boolean => Ok(ResolvedSchema::leaf(node, ResolvedShape::Boolean)),
            SchemaKind::Unresolved => Ok(ResolvedSchema::leaf(node, ResolvedShape::Unresolved)),
        }
    }

    fn resolve_reference(
        &self,
        node: &SchemaNode,
        pointer: &str,
        visited: &VisitedRefs,
        depth: usize,
    ) -> Result<ResolvedSchema> {
        if visited.contains(pointer) {
            trace!(pointer, "reference cycle, left unresolved");
            return Ok(ResolvedSchema::unresolved());
        }
        let target = self
            .references
            .get(pointer)
            .ok_or_else(|| CompileError::UnresolvedReference {
                pointer: pointer.to_string(),
            })?;

        let mut path = visited.clone();
        path.insert(pointer.to_string());
        let mut resolved = self.resolve(target, &path, depth + 1)?;

        // annotations written next to the $ref win over the target's
        if node.description.is_some() {
            resolved.description = node.description.clone();
        }
        if node.example.is_some() {
            resolved.example = node.example.clone();
        }
        resolved.nullable |= node.nullable;
        Ok(resolved)
    }

    /// Flatten `allOf` into one object.
    ///
    /// Properties are unioned with the last branch winning on a name clash;
    /// required lists are concatenated as-is, duplicates included. The
    /// result is an object even when no branch was.
    fn merge_all_of(
        &self,
        node: &SchemaNode,
        branches: &[SchemaNode],
        visited: &VisitedRefs,
        depth: usize,
    ) -> Result<ResolvedSchema> {
        let mut merged = ResolvedObject::default();
        let mut description = None;
        let mut example = None;

        for branch in branches {
            let resolved = self.resolve(branch, visited, depth + 1)?;
            if resolved.description.is_some() {
                description = resolved.description;
            }
            if resolved.example.is_some() {
                example = resolved.example;
            }
            if let ResolvedShape::Object(object) = resolved.shape {
                merged.properties.extend(object.properties);
                merged.required.extend(object.required);
                if object.additional.is_specified() {
                    merged.additional = object.additional;
                }
            }
        }

        Ok(ResolvedSchema {
            shape: ResolvedShape::Object(merged),
            enum_values: None,
            nullable: node.nullable,
            description: node.description.clone().or(description),
            example: node.example.clone().or(example),
        })
    }
}
