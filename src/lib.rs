//! Position-exact AST layer for a HiveSQL front end.
//!
//! Text is parsed by a PEG grammar into a concrete syntax tree, which is then
//! transformed into an arena-backed [`Ast`]. Every node knows its exact source
//! span, so editor tooling can ask which node sits under a caret and what
//! tables or columns the surrounding statement refers to.
//!
//! ```rust
//! use hive_ast::{ast::Select, NodeKind};
//!
//! let ast = hive_ast::parse("select * from t1, table2 as t2").unwrap();
//! let stmt = ast.program().unwrap().statements()[0];
//! let select = Select::cast(stmt).unwrap();
//! let tables: Vec<_> = select
//!     .from_tables()
//!     .iter()
//!     .map(|t| (t.name().unwrap().to_string(), t.alias_name.clone()))
//!     .collect();
//! assert_eq!(tables[1], ("table2".to_string(), "t2".to_string()));
//! assert_eq!(ast.node_at_offset(2).unwrap().kind(), NodeKind::Keyword);
//! ```

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod syntax;

pub use ast::{Ast, NodeId, NodeKind, NodeRef, Span};
pub use config::ParserConfig;
pub use diagnostics::{Level, Marker, MarkerRule};
pub use errors::{ParseError, TransformError};
pub use syntax::{parse, Parser};
