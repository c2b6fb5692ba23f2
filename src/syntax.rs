//! Syntax module for HiveSQL
//!
//! Grammar, owned CST, CST→AST transformer and the parser entry point that
//! ties them together.

pub mod cst;
pub mod parser;
pub mod transform;

pub use cst::{CstNode, Rule, SqlGrammar};
pub use parser::{parse, Parser};
pub use transform::Transformer;
