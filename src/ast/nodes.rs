//! Typed views over arena nodes and the semantic views derived from them.
//!
//! A view is a thin `Copy` wrapper around a [`NodeRef`] whose kind has been
//! checked. Views dereference to `NodeRef`, so every generic node operation
//! is available on them too. Derived values such as [`Table`] or [`Col`] are
//! recomputed from the tree shape on every call.

// ============================================================================
// IMPORTS
// ============================================================================

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::tree::NodeRef;
use super::{DropKind, NodeKind, Slot};

// ============================================================================
// VIEW DEFINITIONS
// ============================================================================

macro_rules! typed_node {
    ($($(#[$meta:meta])* $name:ident => $kind:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name<'a>(NodeRef<'a>);

            impl<'a> $name<'a> {
                pub const KIND: NodeKind = NodeKind::$kind;

                pub fn cast(node: NodeRef<'a>) -> Option<Self> {
                    (node.kind() == NodeKind::$kind).then_some(Self(node))
                }

                pub fn node(self) -> NodeRef<'a> {
                    self.0
                }
            }

            impl<'a> Deref for $name<'a> {
                type Target = NodeRef<'a>;

                fn deref(&self) -> &NodeRef<'a> {
                    &self.0
                }
            }

            impl<'a> From<$name<'a>> for NodeRef<'a> {
                fn from(view: $name<'a>) -> Self {
                    view.0
                }
            }
        )+
    };
}

typed_node! {
    /// Root of every parsed tree.
    Program => Program;
    /// Ordered top-level statements.
    Block => Block;
    /// `USE <expr>`.
    Use => Use;
    /// `DROP TABLE|DATABASE|SCHEMA ...`.
    Drop => Drop;
    /// A complete select statement: optional `WITH` part plus the full select.
    Select => Select;
    CteSelect => CteSelect;
    CteSelectItem => CteSelectItem;
    /// One or more select branches joined by set operators.
    FullSelect => FullSelect;
    FullSelectItem => FullSelectItem;
    SubSelect => SubSelect;
    SelectList => SelectList;
    SelectListItem => SelectListItem;
    SelectListAlias => SelectListAlias;
    SelectListAsterisk => SelectListAsterisk;
    FromClause => FromClause;
    FromTableClause => FromTableClause;
    FromTableNameClause => FromTableNameClause;
    TableName => TableName;
    FromSubSelectClause => FromSubSelectClause;
    FromJoinClause => FromJoinClause;
    FromAliasClause => FromAliasClause;
    /// A possibly qualified name such as `db.table1`.
    Identifier => Identifier;
}

fn typed<'a, T>(node: NodeRef<'a>, slot: Slot, cast: fn(NodeRef<'a>) -> Option<T>) -> Option<T> {
    node.slot(slot).and_then(cast)
}

// ============================================================================
// DERIVED VIEWS
// ============================================================================

/// What a from-clause entry reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTable<'a> {
    Name(String),
    Select(Select<'a>),
}

/// A table referenced by a from clause, with its alias or `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<'a> {
    pub raw_table: RawTable<'a>,
    pub alias_name: String,
}

impl<'a> Table<'a> {
    pub fn named(name: impl Into<String>, alias_name: impl Into<String>) -> Self {
        Self {
            raw_table: RawTable::Name(name.into()),
            alias_name: alias_name.into(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.raw_table {
            RawTable::Name(name) => Some(name),
            RawTable::Select(_) => None,
        }
    }
}

/// A projected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Col {
    pub name: String,
    pub alias_name: String,
    pub is_all: bool,
}

impl Col {
    pub fn new(name: impl Into<String>, alias_name: impl Into<String>, is_all: bool) -> Self {
        Self {
            name: name.into(),
            alias_name: alias_name.into(),
            is_all,
        }
    }
}

/// A name bound by a `WITH` clause and the select it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteTable<'a> {
    pub name: String,
    pub origin: FullSelect<'a>,
}

// ============================================================================
// STATEMENTS
// ============================================================================

impl<'a> Program<'a> {
    pub fn block(self) -> Option<Block<'a>> {
        typed(self.0, Slot::Block, Block::cast)
    }

    pub fn statements(self) -> Vec<NodeRef<'a>> {
        self.block()
            .map(|block| block.statements().collect())
            .unwrap_or_default()
    }
}

impl<'a> Block<'a> {
    pub fn statements(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.0.children()
    }
}

impl<'a> Use<'a> {
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    /// The database being switched to, or `""` when the statement is incomplete.
    pub fn use_db_name(self) -> &'a str {
        self.identifier().map_or("", |ident| ident.text())
    }
}

impl<'a> Drop<'a> {
    pub fn drop_kind(self) -> Option<DropKind> {
        self.0.ast().drop_kind(self.0.id())
    }

    pub fn table(self) -> Option<TableName<'a>> {
        typed(self.0, Slot::TableName, TableName::cast)
    }

    pub fn expr(self) -> Option<NodeRef<'a>> {
        self.0.slot(Slot::Expr)
    }

    pub fn table_name(self) -> Option<&'a str> {
        self.table().and_then(TableName::table_name)
    }

    pub fn database_name(self) -> Option<&'a str> {
        self.named_target(DropKind::Database)
    }

    pub fn schema_name(self) -> Option<&'a str> {
        self.named_target(DropKind::Schema)
    }

    fn named_target(self, kind: DropKind) -> Option<&'a str> {
        if self.drop_kind() != Some(kind) {
            return None;
        }
        self.expr().map(NodeRef::text)
    }
}

impl<'a> Select<'a> {
    pub fn cte_select(self) -> Option<CteSelect<'a>> {
        typed(self.0, Slot::CteSelect, CteSelect::cast)
    }

    pub fn full_select(self) -> Option<FullSelect<'a>> {
        typed(self.0, Slot::FullSelect, FullSelect::cast)
    }

    pub fn cte_tables(self) -> Vec<CteTable<'a>> {
        self.cte_select()
            .map(CteSelect::cte_tables)
            .unwrap_or_default()
    }

    pub fn from_tables(self) -> Vec<Table<'a>> {
        self.full_select()
            .map(FullSelect::from_tables)
            .unwrap_or_default()
    }

    pub fn select_cols(self) -> Vec<Col> {
        self.full_select()
            .map(FullSelect::select_cols)
            .unwrap_or_default()
    }
}

// ============================================================================
// SELECT STRUCTURE
// ============================================================================

impl<'a> CteSelect<'a> {
    pub fn items(self) -> impl Iterator<Item = CteSelectItem<'a>> + 'a {
        self.0.slot_items().filter_map(CteSelectItem::cast)
    }

    pub fn cte_tables(self) -> Vec<CteTable<'a>> {
        self.items().filter_map(CteSelectItem::cte_table).collect()
    }
}

impl<'a> CteSelectItem<'a> {
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    pub fn full_select(self) -> Option<FullSelect<'a>> {
        typed(self.0, Slot::FullSelect, FullSelect::cast)
    }

    pub fn cte_table(self) -> Option<CteTable<'a>> {
        Some(CteTable {
            name: self.identifier()?.text().to_string(),
            origin: self.full_select()?,
        })
    }
}

impl<'a> FullSelect<'a> {
    pub fn items(self) -> impl Iterator<Item = FullSelectItem<'a>> + 'a {
        self.0.slot_items().filter_map(FullSelectItem::cast)
    }

    pub fn has_union(self) -> bool {
        self.items().nth(1).is_some()
    }

    /// Select lists of every branch, nested full selects flattened.
    pub fn select_lists(self) -> Vec<SelectList<'a>> {
        self.items().flat_map(FullSelectItem::select_lists).collect()
    }

    pub fn from_clauses(self) -> Vec<FromClause<'a>> {
        self.items().flat_map(FullSelectItem::from_clauses).collect()
    }

    pub fn select_cols(self) -> Vec<Col> {
        self.select_lists()
            .into_iter()
            .flat_map(SelectList::select_cols)
            .collect()
    }

    pub fn from_tables(self) -> Vec<Table<'a>> {
        self.from_clauses()
            .into_iter()
            .flat_map(FromClause::from_tables)
            .collect()
    }
}

impl<'a> FullSelectItem<'a> {
    pub fn sub_select(self) -> Option<SubSelect<'a>> {
        typed(self.0, Slot::SubSelect, SubSelect::cast)
    }

    /// Parenthesised branch, `(select ... union select ...)`.
    pub fn full_select(self) -> Option<FullSelect<'a>> {
        typed(self.0, Slot::FullSelect, FullSelect::cast)
    }

    pub fn select_lists(self) -> Vec<SelectList<'a>> {
        if let Some(sub) = self.sub_select() {
            return sub.select_list().into_iter().collect();
        }
        self.full_select()
            .map(FullSelect::select_lists)
            .unwrap_or_default()
    }

    pub fn from_clauses(self) -> Vec<FromClause<'a>> {
        if let Some(sub) = self.sub_select() {
            return sub.from_clause().into_iter().collect();
        }
        self.full_select()
            .map(FullSelect::from_clauses)
            .unwrap_or_default()
    }
}

impl<'a> SubSelect<'a> {
    pub fn select_list(self) -> Option<SelectList<'a>> {
        typed(self.0, Slot::SelectList, SelectList::cast)
    }

    pub fn from_clause(self) -> Option<FromClause<'a>> {
        typed(self.0, Slot::FromClause, FromClause::cast)
    }

    pub fn select_cols(self) -> Vec<Col> {
        self.select_list()
            .map(SelectList::select_cols)
            .unwrap_or_default()
    }

    pub fn from_tables(self) -> Vec<Table<'a>> {
        self.from_clause()
            .map(FromClause::from_tables)
            .unwrap_or_default()
    }
}

// ============================================================================
// SELECT LIST
// ============================================================================

impl<'a> SelectList<'a> {
    pub fn items(self) -> impl Iterator<Item = SelectListItem<'a>> + 'a {
        self.0.slot_items().filter_map(SelectListItem::cast)
    }

    pub fn select_cols(self) -> Vec<Col> {
        self.items().map(SelectListItem::select_col).collect()
    }
}

impl<'a> SelectListItem<'a> {
    /// Target of an `ident = expr` item.
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    pub fn expr(self) -> Option<NodeRef<'a>> {
        self.0.slot(Slot::Expr)
    }

    pub fn alias(self) -> Option<SelectListAlias<'a>> {
        typed(self.0, Slot::Alias, SelectListAlias::cast)
    }

    pub fn asterisk(self) -> Option<SelectListAsterisk<'a>> {
        typed(self.0, Slot::Asterisk, SelectListAsterisk::cast)
    }

    pub fn col_name(self) -> String {
        if let Some(asterisk) = self.asterisk() {
            return asterisk.col_name();
        }
        self.identifier()
            .map(|ident| ident.node())
            .or_else(|| self.expr())
            .map_or_else(String::new, |node| node.text().to_string())
    }

    pub fn alias_name(self) -> &'a str {
        self.alias().map_or("", SelectListAlias::alias)
    }

    pub fn select_col(self) -> Col {
        Col::new(
            self.col_name(),
            self.alias_name(),
            self.asterisk().is_some(),
        )
    }
}

impl<'a> SelectListAlias<'a> {
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    pub fn alias(self) -> &'a str {
        self.identifier().map_or("", |ident| ident.text())
    }
}

impl<'a> SelectListAsterisk<'a> {
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    pub fn col_name(self) -> String {
        match self.identifier() {
            Some(ident) => format!("{}.*", ident.text()),
            None => "*".to_string(),
        }
    }
}

// ============================================================================
// FROM STRUCTURE
// ============================================================================

impl<'a> FromClause<'a> {
    pub fn table_clause(self) -> Option<FromTableClause<'a>> {
        typed(self.0, Slot::FromTableClause, FromTableClause::cast)
    }

    pub fn joins(self) -> impl Iterator<Item = FromJoinClause<'a>> + 'a {
        self.0.slot_items().filter_map(FromJoinClause::cast)
    }

    /// The first table followed by every joined table, in source order.
    /// Entries that do not name a table (`VALUES` lists) are skipped.
    pub fn from_tables(self) -> Vec<Table<'a>> {
        self.table_clause()
            .and_then(FromTableClause::table)
            .into_iter()
            .chain(self.joins().filter_map(FromJoinClause::table))
            .collect()
    }
}

impl<'a> FromTableClause<'a> {
    pub fn name_clause(self) -> Option<FromTableNameClause<'a>> {
        typed(self.0, Slot::FromTableName, FromTableNameClause::cast)
    }

    pub fn sub_select_clause(self) -> Option<FromSubSelectClause<'a>> {
        typed(self.0, Slot::FromSubSelect, FromSubSelectClause::cast)
    }

    pub fn table(self) -> Option<Table<'a>> {
        if let Some(name) = self.name_clause() {
            return name.table();
        }
        self.sub_select_clause().and_then(FromSubSelectClause::table)
    }
}

impl<'a> FromTableNameClause<'a> {
    pub fn table_name(self) -> Option<TableName<'a>> {
        typed(self.0, Slot::TableName, TableName::cast)
    }

    pub fn alias(self) -> Option<FromAliasClause<'a>> {
        typed(self.0, Slot::Alias, FromAliasClause::cast)
    }

    pub fn table(self) -> Option<Table<'a>> {
        let name = self.table_name()?.table_name()?;
        Some(Table::named(name, self.alias().map_or("", FromAliasClause::alias)))
    }
}

impl<'a> TableName<'a> {
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    pub fn table_name(self) -> Option<&'a str> {
        self.identifier().map(|ident| ident.text())
    }
}

impl<'a> FromSubSelectClause<'a> {
    pub fn select(self) -> Option<Select<'a>> {
        typed(self.0, Slot::Select, Select::cast)
    }

    pub fn alias(self) -> Option<FromAliasClause<'a>> {
        typed(self.0, Slot::Alias, FromAliasClause::cast)
    }

    pub fn table(self) -> Option<Table<'a>> {
        Some(Table {
            raw_table: RawTable::Select(self.select()?),
            alias_name: self.alias().map_or("", FromAliasClause::alias).to_string(),
        })
    }
}

impl<'a> FromJoinClause<'a> {
    pub fn table_clause(self) -> Option<FromTableClause<'a>> {
        typed(self.0, Slot::FromTableClause, FromTableClause::cast)
    }

    /// `true` for the `, table` shape, `false` for an explicit `JOIN`.
    pub fn is_comma_join(self) -> bool {
        self.0.child(0).map(|c| c.kind()) == Some(NodeKind::Comma)
    }

    pub fn table(self) -> Option<Table<'a>> {
        self.table_clause().and_then(FromTableClause::table)
    }
}

impl<'a> FromAliasClause<'a> {
    pub fn identifier(self) -> Option<Identifier<'a>> {
        typed(self.0, Slot::Identifier, Identifier::cast)
    }

    pub fn alias(self) -> &'a str {
        self.identifier().map_or("", |ident| ident.text())
    }
}

// ============================================================================
// NAMES
// ============================================================================

impl<'a> Identifier<'a> {
    /// Leading part; the whole name when it is not qualified.
    pub fn left(self) -> Option<NodeRef<'a>> {
        self.0.slot(Slot::LeftValue)
    }

    pub fn dot(self) -> Option<NodeRef<'a>> {
        self.0.slot(Slot::Dot)
    }

    pub fn right(self) -> Option<NodeRef<'a>> {
        self.0.slot(Slot::RightValue)
    }

    pub fn is_qualified(self) -> bool {
        self.dot().is_some()
    }

    /// Set on identifiers synthesised from an expression rather than a name token.
    pub fn is_custom_property(self) -> bool {
        self.0.ast().is_custom_property(self.0.id())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ast::{Ast, SourceText, Span};

    fn identifier(ast: &mut Ast, offset: isize, length: isize) -> crate::ast::NodeId {
        let ident = ast.create(NodeKind::Identifier, Span::new(offset, length));
        let id = ast.create(NodeKind::Id, Span::new(offset, length));
        ast.set_node(ident, Slot::LeftValue, Some(id), None);
        ident
    }

    #[test]
    fn cast_checks_kind() {
        let mut ast = Ast::new();
        let root = ast.create(NodeKind::Program, Span::new(0, 1));
        assert!(Program::cast(ast.node(root)).is_some());
        assert!(Use::cast(ast.node(root)).is_none());
    }

    #[test]
    fn asterisk_column_names() {
        let text = "t.*";
        let mut ast = Ast::new();
        let root = ast.create(NodeKind::Program, Span::new(0, 3));
        ast.set_text_provider(root, Arc::new(SourceText::new(text)));

        let bare = ast.create(NodeKind::SelectListAsterisk, Span::new(2, 1));
        ast.add_child(root, bare);
        let qualified = ast.create(NodeKind::SelectListAsterisk, Span::new(2, 1));
        let ident = identifier(&mut ast, 0, 1);
        ast.set_node(qualified, Slot::Identifier, Some(ident), Some(0));
        ast.add_child(root, qualified);

        let bare = SelectListAsterisk::cast(ast.node(bare)).map(SelectListAsterisk::col_name);
        let qualified =
            SelectListAsterisk::cast(ast.node(qualified)).map(SelectListAsterisk::col_name);
        assert_eq!(bare.as_deref(), Some("*"));
        assert_eq!(qualified.as_deref(), Some("t.*"));
    }

    #[test]
    fn missing_parts_degrade_to_empty() {
        let mut ast = Ast::new();
        let stmt = ast.create(NodeKind::Use, Span::new(0, 3));
        let clause = ast.create(NodeKind::FromClause, Span::new(0, 4));
        let use_stmt = Use::cast(ast.node(stmt)).expect("use view");
        assert_eq!(use_stmt.use_db_name(), "");
        let from = FromClause::cast(ast.node(clause)).expect("from view");
        assert!(from.from_tables().is_empty());
    }

    #[test]
    fn drop_names_are_kind_checked() {
        let text = "drop database db1";
        let mut ast = Ast::new();
        let stmt = ast.create(NodeKind::Drop, Span::new(0, text.len() as isize));
        ast.set_text_provider(stmt, Arc::new(SourceText::new(text)));
        ast.set_drop_kind(stmt, DropKind::Database);
        let expr = ast.create(NodeKind::Expr, Span::new(14, 3));
        ast.set_node(stmt, Slot::Expr, Some(expr), None);

        let drop = Drop::cast(ast.node(stmt)).expect("drop view");
        assert_eq!(drop.database_name(), Some("db1"));
        assert_eq!(drop.schema_name(), None);
        assert_eq!(drop.table_name(), None);
    }
}
