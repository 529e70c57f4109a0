//! Safety annotations derived from operation identifiers
//!
//! The heuristics are a plain rule table so they can be tested and extended
//! without touching synthesis. Every rule whose tokens match is applied; no
//! rule takes precedence over another, so an identifier matching both sets
//! comes out both read-only and destructive.

use crate::naming::identifier_tokens;
use mcpoas_core::ToolAnnotations;

/// What a matching rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `readOnly` and `idempotent`
    ReadOnly,
    /// `destructive`
    Destructive,
}

impl Effect {
    fn apply(self, annotations: &mut ToolAnnotations) {
        match self {
            Effect::ReadOnly => {
                annotations.read_only = true;
                annotations.idempotent = true;
            }
            Effect::Destructive => annotations.destructive = true,
        }
    }
}

/// A rule matches when any of its tokens is a word of the identifier
#[derive(Debug, Clone, Copy)]
pub struct AnnotationRule {
    pub tokens: &'static [&'static str],
    pub effect: Effect,
}

impl AnnotationRule {
    pub fn matches(&self, words: &[String]) -> bool {
        words.iter().any(|w| self.tokens.contains(&w.as_str()))
    }
}

/// Rules applied to every operation, in order
pub const ANNOTATION_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        tokens: &[
            "list", "info", "search", "export", "view", "viewed", "count", "stats", "ping",
            "get", "memberships",
        ],
        effect: Effect::ReadOnly,
    },
    AnnotationRule {
        tokens: &["delete", "remove", "destroy"],
        effect: Effect::Destructive,
    },
];

/// Annotations for an operation identifier using [`ANNOTATION_RULES`]
pub fn derive_annotations(identifier: &str) -> ToolAnnotations {
    derive_with_rules(identifier, ANNOTATION_RULES)
}

/// Annotations for an operation identifier using a custom rule table.
///
/// Matching is case-insensitive and per word; `openWorld` is always set.
pub fn derive_with_rules(identifier: &str, rules: &[AnnotationRule]) -> ToolAnnotations {
    let words = identifier_tokens(identifier);
    let mut annotations = ToolAnnotations {
        read_only: false,
        destructive: false,
        idempotent: false,
        open_world: true,
    };
    for rule in rules.iter().filter(|rule| rule.matches(&words)) {
        rule.effect.apply(&mut annotations);
    }
    annotations
}
