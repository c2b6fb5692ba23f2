//! Owned concrete syntax tree built from the pest parse.
//!
//! The pest `Pairs` borrow the input, so the parser copies them into
//! [`CstNode`] values that can be cached across parses of the same text.
//! The transformer only ever reads this tree.

use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser as _;
use pest_derive::Parser;

use crate::ast::Span;
use crate::errors::{ParseError, SourceContext, TransformError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub struct SqlGrammar;

// ============================================================================
// CST NODE
// ============================================================================

/// One rule match: rule tag, half-open byte range and ordered children.
///
/// Terminal tokens (`T_*`, `L_ID`, literals) are nodes without children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstNode {
    rule: Rule,
    start: usize,
    end: usize,
    children: Vec<CstNode>,
}

impl CstNode {
    /// Runs the grammar over `source` and returns the `program` node.
    pub fn parse(source: &str, context: &SourceContext) -> Result<CstNode, ParseError> {
        let mut pairs = SqlGrammar::parse(Rule::program, source)
            .map_err(|e| convert_parse_error(e, context))?;
        match pairs.next() {
            Some(program) => Ok(CstNode::from_pair(program)),
            None => Err(ParseError::syntax("empty parse", context, 0, 0)),
        }
    }

    /// Non-atomic rules that end in an optional or repeated part swallow the
    /// whitespace pest skips before trying it, so each end is pulled back to
    /// the last significant character.
    fn from_pair(pair: Pair<'_, Rule>) -> CstNode {
        let start = pair.as_span().start();
        let end = start + significant_len(pair.as_str());
        let rule = pair.as_rule();
        let children = pair
            .into_inner()
            .filter(|p| p.as_rule() != Rule::EOI)
            .map(CstNode::from_pair)
            .collect();
        CstNode {
            rule,
            start,
            end,
            children,
        }
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Inclusive byte offset of the last character.
    pub fn stop(&self) -> usize {
        self.end.saturating_sub(1).max(self.start)
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn span(&self) -> Span {
        Span::from_range(self.start, self.end)
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }

    pub fn children(&self) -> &[CstNode] {
        &self.children
    }

    pub fn first(&self) -> Option<&CstNode> {
        self.children.first()
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    /// First direct child matching `rule`.
    pub fn child(&self, rule: Rule) -> Option<&CstNode> {
        self.children.iter().find(|c| c.rule == rule)
    }

    pub fn children_of(&self, rule: Rule) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter(move |c| c.rule == rule)
    }

    pub fn has_child(&self, rule: Rule) -> bool {
        self.child(rule).is_some()
    }

    /// Like [`CstNode::child`], but a missing child is a transformer error.
    pub fn require(&self, rule: Rule) -> Result<&CstNode, TransformError> {
        self.child(rule).ok_or(TransformError::MissingChild {
            parent: self.rule,
            expected: rule,
            offset: self.start,
        })
    }

    pub(crate) fn unexpected(&self, found: &CstNode) -> TransformError {
        TransformError::UnexpectedRule {
            parent: self.rule,
            found: found.rule,
            offset: found.start,
        }
    }
}

// ============================================================================
// TRAILING TRIVIA
// ============================================================================

/// Length of `text` without its trailing whitespace and comments.
///
/// Quoted literals and backtick names are skipped whole, so comment markers
/// inside them do not count.
fn significant_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = text[i..].find('\n').map_or(bytes.len(), |n| i + n);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map_or(bytes.len(), |n| i + n + 4);
            }
            quote @ (b'\'' | b'"' | b'`') => {
                i = quoted_end(bytes, i, quote);
                last = i;
            }
            _ => {
                i += 1;
                last = i;
            }
        }
    }
    last
}

/// Index just past the literal opened at `open`, or the text end if it never closes.
fn quoted_end(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && quote != b'`' {
            i += 2;
        } else if b == quote {
            if quote != b'`' && bytes.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: pest::error::Error<Rule>, source: &SourceContext) -> ParseError {
    let (start, end) = match error.location {
        InputLocation::Pos(pos) => (pos, pos),
        InputLocation::Span((start, end)) => (start, end),
    };

    let message = match &error.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected: Vec<String> = positives.iter().map(|r| format!("{r:?}")).collect();
            format!("expected {}", expected.join(", "))
        }
        pest::error::ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
    };

    ParseError::syntax(message, source, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cst(source: &str) -> CstNode {
        CstNode::parse(source, &SourceContext::new("test", source)).expect("grammar accepts input")
    }

    fn stmt_rule(node: &CstNode) -> Option<Rule> {
        let block = node.child(Rule::block)?;
        Some(block.first()?.first()?.rule())
    }

    #[test]
    fn statements_are_classified() {
        assert_eq!(stmt_rule(&cst("use db")), Some(Rule::use_stmt));
        assert_eq!(stmt_rule(&cst("use")), Some(Rule::expr_stmt));
        assert_eq!(stmt_rule(&cst("select * from t1")), Some(Rule::select_stmt));
        assert_eq!(stmt_rule(&cst("drop table t1")), Some(Rule::drop_stmt));
        assert_eq!(stmt_rule(&cst("create table t1 (a int)")), Some(Rule::other_stmt));
        assert_eq!(stmt_rule(&cst(";")), Some(Rule::semicolon_stmt));
        assert_eq!(stmt_rule(&cst("what is this")), Some(Rule::unknown_stmt));
    }

    #[test]
    fn offsets_are_exact() {
        let source = "  use db";
        let program = cst(source);
        let stmt = program
            .child(Rule::block)
            .and_then(CstNode::first)
            .and_then(CstNode::first)
            .expect("use statement");
        assert_eq!(stmt.start(), 2);
        assert_eq!(stmt.stop(), 7);
        assert_eq!(stmt.text(source), "use db");
        assert_eq!(stmt.span(), Span::new(2, 6));
    }

    #[test]
    fn qualified_names_are_one_token() {
        let source = "drop table db.table1";
        let program = cst(source);
        let drop = program
            .child(Rule::block)
            .and_then(CstNode::first)
            .and_then(CstNode::first)
            .expect("drop statement");
        let name = drop.require(Rule::table_name).expect("table name");
        assert_eq!(name.text(source), "db.table1");
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        let source = "select selection from t";
        let program = cst(source);
        assert_eq!(stmt_rule(&program), Some(Rule::select_stmt));
    }

    #[test]
    fn trailing_whitespace_is_not_part_of_a_rule() {
        let source = "use db ;";
        let program = cst(source);
        let stmt = program
            .child(Rule::block)
            .and_then(CstNode::first)
            .and_then(CstNode::first)
            .expect("use statement");
        assert_eq!(stmt.text(source), "use db");
        let expr = stmt.require(Rule::expr).expect("expr");
        assert_eq!(expr.text(source), "db");
    }

    #[test]
    fn trailing_comments_are_trimmed() {
        let source = "select a -- note\n /* more */ ";
        let program = cst(source);
        let stmt = program
            .child(Rule::block)
            .and_then(CstNode::first)
            .and_then(CstNode::first)
            .expect("select statement");
        assert_eq!(stmt.text(source), "select a");
    }

    #[test]
    fn significant_len_skips_quoted_text() {
        assert_eq!(significant_len("a  "), 1);
        assert_eq!(significant_len("'x -- y'  "), 8);
        assert_eq!(significant_len("'it''s'\t"), 7);
        assert_eq!(significant_len("`a /* b`  -- c"), 8);
        assert_eq!(significant_len("b /* c */ /* d */\n"), 1);
        assert_eq!(significant_len("  "), 0);
        assert_eq!(significant_len("x /* open"), 1);
    }

    #[test]
    fn unterminated_comment_is_a_syntax_error() {
        let source = "/* open";
        let err = CstNode::parse(source, &SourceContext::new("test", source));
        assert!(matches!(err, Err(ParseError::Syntax { .. })));
    }
}
