//! AST module for Hive SQL
//!
//! The tree is stored in an arena ([`Ast`]) and addressed through [`NodeId`]
//! handles. Every node carries an exact source [`Span`]; parents own their
//! children and keep a non-owning handle back to their own parent.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod nodes;
pub mod query;
pub mod span;
pub mod tree;

pub use nodes::{
    Block, Col, CteSelect, CteSelectItem, CteTable, Drop, FromAliasClause, FromClause,
    FromJoinClause, FromSubSelectClause, FromTableClause, FromTableNameClause, FullSelect,
    FullSelectItem, Identifier, Program, RawTable, Select, SelectList, SelectListAlias,
    SelectListAsterisk, SelectListItem, SubSelect, Table, TableName, Use,
};
pub use query::{node_at_offset, path, walk, Visitor};
pub use span::{SourceText, Span, TextProvider, UNKNOWN_TEXT};
pub use tree::{Ast, NodeRef, NodeSnapshot};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Handle to a node inside an [`Ast`] arena.
///
/// Handles are only meaningful for the arena that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Discriminant identifying the concrete variant of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // Structural containers
    Program,
    Block,
    NodeList,

    // Statements
    Use,
    Drop,
    Select,
    Unsupported,
    OtherStmt,

    // Select structure
    CteSelect,
    CteSelectItem,
    CteSelectCols,
    FullSelect,
    FullSelectItem,
    SubSelect,

    // Select list
    SelectList,
    SelectListLimit,
    SelectListItem,
    SelectListAlias,
    SelectListAsterisk,

    // From structure
    FromClause,
    FromTableClause,
    FromTableNameClause,
    TableName,
    FromSubSelectClause,
    FromTableValuesClause,
    FromJoinClause,
    FromJoinTypeClause,
    FromAliasClause,

    // Opaque clauses
    IntoClause,
    WhereClause,
    GroupClause,
    HavingClause,
    QualifyClause,
    OrderByClause,
    SelectOptions,

    // Names and leaves
    Identifier,
    Id,
    Dot,
    Comma,
    Semicolon,
    Keyword,
    Expr,
    BoolExpr,
    Other,
}

impl NodeKind {
    /// Kinds the transformer keeps as a single span without decomposing
    /// the syntax underneath.
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            NodeKind::Unsupported
                | NodeKind::OtherStmt
                | NodeKind::CteSelectCols
                | NodeKind::SelectListLimit
                | NodeKind::FromTableValuesClause
                | NodeKind::FromJoinTypeClause
                | NodeKind::IntoClause
                | NodeKind::WhereClause
                | NodeKind::GroupClause
                | NodeKind::HavingClause
                | NodeKind::QualifyClause
                | NodeKind::OrderByClause
                | NodeKind::SelectOptions
                | NodeKind::Expr
                | NodeKind::BoolExpr
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a `DROP` statement removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropKind {
    Table,
    Database,
    Schema,
}

impl DropKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DropKind::Table => "table",
            DropKind::Database => "database",
            DropKind::Schema => "schema",
        }
    }
}

impl fmt::Display for DropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named field of a typed node, filled through [`Ast::set_node`].
///
/// `Item` is the only repeatable slot; it records the members of list-shaped
/// nodes (CTE items, union branches, select items, joins) in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Block,
    Identifier,
    LeftValue,
    Dot,
    RightValue,
    CteSelect,
    FullSelect,
    SubSelect,
    SelectList,
    FromClause,
    Expr,
    Alias,
    Asterisk,
    FromTableClause,
    FromTableName,
    FromSubSelect,
    TableName,
    Select,
    Item,
}
