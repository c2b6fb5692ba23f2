//! Shared helpers for the integration tests.
//!
//! Inputs may contain a single `|` marking the caret. It is removed before
//! parsing and its byte position becomes the query offset.

#![allow(dead_code)]

use hive_ast::ast::{Drop, Select, Use};
use hive_ast::{Ast, NodeRef};

/// Strips the caret marker and returns the text with the caret offset.
pub fn caret(input: &str) -> (String, isize) {
    let offset = input.find('|').expect("input has a caret");
    (input.replacen('|', "", 1), offset as isize)
}

pub fn parse(text: &str) -> Ast {
    hive_ast::parse(text).expect("input produces a tree")
}

/// Parses `input` and hands the node under the caret to `check`.
pub fn at_caret<R>(input: &str, check: impl FnOnce(NodeRef<'_>) -> R) -> R {
    let (text, offset) = caret(input);
    let ast = parse(&text);
    let node = ast.node_at_offset(offset).expect("a node under the caret");
    check(node)
}

pub fn statements(ast: &Ast) -> Vec<NodeRef<'_>> {
    ast.program().expect("program root").statements()
}

pub fn statement(ast: &Ast, index: usize) -> NodeRef<'_> {
    statements(ast)[index]
}

pub fn select(ast: &Ast, index: usize) -> Select<'_> {
    Select::cast(statement(ast, index)).expect("select statement")
}

pub fn drop_stmt(ast: &Ast, index: usize) -> Drop<'_> {
    Drop::cast(statement(ast, index)).expect("drop statement")
}

pub fn use_stmt(ast: &Ast, index: usize) -> Use<'_> {
    Use::cast(statement(ast, index)).expect("use statement")
}
