//! Markers: issues raised against AST nodes by downstream checks.
//!
//! A marker records which node it was raised on, the rule that raised it and
//! the source range to highlight. Markers render through miette like any
//! other diagnostic.

use std::fmt;

use miette::{Diagnostic, LabeledSpan, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{NodeId, NodeRef};

/// How serious a marker is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Ignore = 1,
    Warning = 2,
    Error = 4,
}

impl Level {
    pub fn severity(self) -> Severity {
        match self {
            Level::Ignore => Severity::Advice,
            Level::Warning => Severity::Warning,
            Level::Error => Severity::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Ignore => "ignore",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(name)
    }
}

/// The check that produced a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerRule {
    pub id: String,
    pub message: String,
}

impl MarkerRule {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// An issue attached to a node.
///
/// The message defaults to the rule's message and the highlighted range to
/// the node's span.
///
/// # Examples
///
/// ```rust
/// use hive_ast::diagnostics::{Level, Marker, MarkerRule};
/// let mut ast = hive_ast::parse("select * from t1").unwrap();
/// let root = ast.root();
/// let rule = MarkerRule::new("no-star", "avoid select *");
/// let marker = Marker::new(ast.node(root), rule, Level::Warning);
/// assert_eq!(marker.message(), "avoid select *");
/// assert_eq!(marker.length(), 16);
/// ast.add_issue(marker);
/// assert_eq!(ast.issues(root).len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Marker {
    node: NodeId,
    rule: MarkerRule,
    level: Level,
    message: String,
    offset: isize,
    length: isize,
}

impl Marker {
    pub fn new(node: NodeRef<'_>, rule: MarkerRule, level: Level) -> Self {
        let span = node.span();
        Self {
            node: node.id(),
            message: rule.message.clone(),
            rule,
            level,
            offset: span.offset,
            length: span.length,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_range(mut self, offset: isize, length: isize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn rule(&self) -> &MarkerRule {
        &self.rule
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn length(&self) -> isize {
        self.length
    }
}

impl Diagnostic for Marker {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.rule.id))
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.level.severity())
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        // Synthetic ranges have nothing to point at.
        if self.offset < 0 || self.length < 0 {
            return None;
        }
        let label = LabeledSpan::new(
            Some(self.rule.message.clone()),
            self.offset as usize,
            self.length as usize,
        );
        Some(Box::new(std::iter::once(label)))
    }
}
