//! Source spans and the text providers that resolve them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Text returned for nodes that cannot reach a text provider.
pub const UNKNOWN_TEXT: &str = "unknown";

/// An `(offset, length)` pair locating a node's text in the source.
///
/// `(-1, -1)` marks a synthetic node with no source text of its own, such as
/// a structural list wrapper. Offsets are byte offsets into the UTF-8 source.
///
/// # Examples
///
/// ```rust
/// use hive_ast::ast::Span;
/// let span = Span::new(4, 2);
/// assert_eq!(span.end(), 6);
/// assert!(span.contains(6));
/// assert!(Span::SYNTHETIC.is_synthetic());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub offset: isize,
    pub length: isize,
}

impl Span {
    pub const SYNTHETIC: Span = Span {
        offset: -1,
        length: -1,
    };

    pub fn new(offset: isize, length: isize) -> Self {
        Self { offset, length }
    }

    /// Builds a span from a half-open byte range.
    pub fn from_range(start: usize, end: usize) -> Self {
        let offset = start as isize;
        Self {
            offset,
            length: end.max(start) as isize - offset,
        }
    }

    pub fn end(&self) -> isize {
        self.offset + self.length
    }

    pub fn is_synthetic(&self) -> bool {
        self.offset == -1 && self.length == -1
    }

    /// Inclusive on both ends: a caret right after the last character is
    /// still inside the span.
    pub fn contains(&self, offset: isize) -> bool {
        self.offset <= offset && offset <= self.end()
    }

    pub fn covers(&self, other: &Span) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }

    /// Extends this span so it also covers `child`.
    ///
    /// Synthetic children leave the span untouched; a synthetic span takes
    /// the child's span as is.
    pub fn grow_to_cover(&mut self, child: Span) {
        if child.is_synthetic() {
            return;
        }
        if self.offset == -1 || self.length == -1 {
            *self = child;
            return;
        }
        let end = self.end().max(child.end());
        self.offset = self.offset.min(child.offset);
        self.length = end - self.offset;
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.end())
    }
}

/// Maps a span to the underlying source text.
///
/// Only the root of a tree holds a provider; every other node reaches it by
/// walking its ancestors.
pub trait TextProvider: fmt::Debug + Send + Sync {
    fn slice(&self, offset: isize, length: isize) -> &str;
}

/// Text provider backed by the parsed source string.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: Arc<str>,
}

impl SourceText {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl TextProvider for SourceText {
    /// Out-of-range spans are clamped to the end of the source and negative
    /// spans resolve to an empty string.
    fn slice(&self, offset: isize, length: isize) -> &str {
        if offset < 0 || length < 0 {
            return "";
        }
        let len = self.text.len();
        let start = (offset as usize).min(len);
        let end = start.saturating_add(length as usize).min(len);
        self.text.get(start..end).unwrap_or("")
    }
}
