//! HiveSQL parser entry point.
//!
//! Guards against empty input, runs the grammar (reusing the previous CST when
//! the text has not changed), transforms the CST and installs the source text
//! on the root so every node can resolve its own text.

use std::sync::Arc;

use tracing::debug;

use super::cst::CstNode;
use super::transform::Transformer;
use crate::ast::{Ast, SourceText};
use crate::config::ParserConfig;
use crate::errors::{ParseError, SourceContext};

// ============================================================================
// PARSER
// ============================================================================

#[derive(Debug)]
struct CachedCst {
    source: String,
    cst: Arc<CstNode>,
}

/// Reusable parser holding a one-entry CST cache.
///
/// # Examples
///
/// ```rust
/// use hive_ast::Parser;
/// let mut parser = Parser::new();
/// let ast = parser.parse("use db").unwrap();
/// let stmt = ast.program().unwrap().statements()[0];
/// assert_eq!(stmt.text(), "use db");
/// assert!(parser.parse("   ").is_none());
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    config: ParserConfig,
    cache: Option<CachedCst>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `text` into a fresh tree.
    ///
    /// Returns `None` for blank input and for input that cannot be parsed;
    /// the reason is logged at debug level. Use [`Parser::try_parse`] to get it.
    pub fn parse(&mut self, text: &str) -> Option<Ast> {
        match self.try_parse(text) {
            Ok(ast) => ast,
            Err(err) => {
                debug!(error = %err, "no syntax tree produced");
                None
            }
        }
    }

    /// Like [`Parser::parse`], but surfaces why no tree was produced.
    /// Blank input is `Ok(None)`.
    pub fn try_parse(&mut self, text: &str) -> Result<Option<Ast>, ParseError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let cst = self.cst(text)?;
        let mut ast = Transformer::new(text)
            .max_statements(self.config.max_statements)
            .transform(&cst)?;

        let root = ast.root();
        ast.set_text_provider(root, Arc::new(SourceText::new(text)));
        Ok(Some(ast))
    }

    fn cst(&mut self, text: &str) -> Result<Arc<CstNode>, ParseError> {
        if self.config.reuse_cst {
            if let Some(cached) = self.cache.as_ref().filter(|c| c.source == text) {
                debug!(len = text.len(), "reusing cached CST");
                return Ok(Arc::clone(&cached.cst));
            }
        }

        debug!(len = text.len(), "parsing CST");
        let context = SourceContext::new(self.config.source_name.clone(), text);
        let cst = Arc::new(CstNode::parse(text, &context)?);
        if self.config.reuse_cst {
            self.cache = Some(CachedCst {
                source: text.to_string(),
                cst: Arc::clone(&cst),
            });
        }
        Ok(cst)
    }

    /// True when the next parse of `text` would skip the grammar.
    pub fn is_cached(&self, text: &str) -> bool {
        self.config.reuse_cst && self.cache.as_ref().is_some_and(|c| c.source == text)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses `text` with a one-off parser and default configuration.
pub fn parse(text: &str) -> Option<Ast> {
    Parser::new().parse(text)
}
