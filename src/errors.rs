//! Error types for parsing and CST→AST transformation.
//!
//! Grammar failures carry the offending source so they can be rendered with
//! miette; transformer failures name the rule that was missing or out of place.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::syntax::Rule;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Source name and content used when rendering a diagnostic.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.clone())
    }
}

/// Converts a byte range into a miette span, clamping inverted ranges.
pub fn to_source_span(start: usize, end: usize) -> SourceSpan {
    (start, end.saturating_sub(start)).into()
}

// ============================================================================
// ERRORS
// ============================================================================

/// Why the parser produced no tree.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("syntax error: {message}")]
    #[diagnostic(code(hive_ast::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),
}

impl ParseError {
    pub(crate) fn syntax(
        message: impl Into<String>,
        source: &SourceContext,
        start: usize,
        end: usize,
    ) -> Self {
        ParseError::Syntax {
            message: message.into(),
            src: source.to_named_source(),
            span: to_source_span(start, end),
        }
    }
}

/// The CST did not have the shape the transformer expects.
///
/// This points at a mismatch between the grammar and the transformer rather
/// than at bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TransformError {
    #[error("{parent:?} at byte {offset} has no {expected:?} child")]
    #[diagnostic(code(hive_ast::transform::missing_child))]
    MissingChild {
        parent: Rule,
        expected: Rule,
        offset: usize,
    },

    #[error("unexpected {found:?} under {parent:?} at byte {offset}")]
    #[diagnostic(code(hive_ast::transform::unexpected_rule))]
    UnexpectedRule {
        parent: Rule,
        found: Rule,
        offset: usize,
    },
}
