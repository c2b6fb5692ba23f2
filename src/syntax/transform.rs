//! CST→AST transformation.
//!
//! One method per grammar construct. Each walks the children of its CST node
//! in source order: terminal tokens become `Keyword` (or `Comma`) leaves,
//! modelled sub-rules recurse and land in a typed slot, and constructs the
//! tree keeps opaque become a single node spanning the whole sub-rule.

use tracing::{debug, trace};

use super::cst::{CstNode, Rule};
use crate::ast::{Ast, DropKind, NodeId, NodeKind, Slot, Span};
use crate::errors::TransformError;

type Result<T> = std::result::Result<T, TransformError>;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Builds an [`Ast`] from the `program` node of a CST.
pub struct Transformer<'s> {
    source: &'s str,
    ast: Ast,
    max_statements: Option<usize>,
}

impl<'s> Transformer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            ast: Ast::new(),
            max_statements: None,
        }
    }

    /// Stops after `limit` top-level statements; the rest are skipped.
    pub fn max_statements(mut self, limit: Option<usize>) -> Self {
        self.max_statements = limit;
        self
    }

    pub fn transform(mut self, program: &CstNode) -> Result<Ast> {
        if program.rule() != Rule::program {
            return Err(TransformError::UnexpectedRule {
                parent: Rule::program,
                found: program.rule(),
                offset: program.start(),
            });
        }
        self.program(program)?;
        Ok(self.ast)
    }

    // ========================================================================
    // NODE HELPERS
    // ========================================================================

    fn node(&mut self, kind: NodeKind, cst: &CstNode) -> NodeId {
        self.ast.create(kind, cst.span())
    }

    fn add_leaf(&mut self, parent: NodeId, kind: NodeKind, cst: &CstNode) {
        let leaf = self.node(kind, cst);
        self.ast.add_child(parent, leaf);
    }

    fn add_keyword(&mut self, parent: NodeId, cst: &CstNode) {
        self.add_leaf(parent, NodeKind::Keyword, cst);
    }

    fn next_index(&self, parent: NodeId) -> Option<usize> {
        Some(self.ast.children(parent).len())
    }

    /// A possibly qualified name, split once on the first `.`.
    fn identifier(&mut self, cst: &CstNode) -> NodeId {
        let node = self.node(NodeKind::Identifier, cst);
        let start = cst.start() as isize;
        match cst.text(self.source).split_once('.') {
            Some((left, right)) => {
                let left_len = left.len() as isize;
                let left = self.ast.create(NodeKind::Id, Span::new(start, left_len));
                let dot = self.ast.create(NodeKind::Dot, Span::new(start + left_len, 1));
                let right = self.ast.create(
                    NodeKind::Id,
                    Span::new(start + left_len + 1, right.len() as isize),
                );
                self.ast.set_node(node, Slot::LeftValue, Some(left), None);
                self.ast.set_node(node, Slot::Dot, Some(dot), None);
                self.ast.set_node(node, Slot::RightValue, Some(right), None);
            }
            None => {
                let id = self.node(NodeKind::Id, cst);
                self.ast.set_node(node, Slot::LeftValue, Some(id), None);
            }
        }
        node
    }

    /// Identifier standing for a whole expression, e.g. the target of `USE`.
    fn expr_identifier(&mut self, cst: &CstNode) -> NodeId {
        let node = self.node(NodeKind::Identifier, cst);
        self.ast.set_custom_property(node, true);
        node
    }

    // ========================================================================
    // PROGRAM AND STATEMENTS
    // ========================================================================

    fn program(&mut self, cst: &CstNode) -> Result<NodeId> {
        let program = self.node(NodeKind::Program, cst);
        if let Some(block) = cst.child(Rule::block) {
            let block = self.block(block)?;
            self.ast.set_node(program, Slot::Block, Some(block), Some(0));
        }
        Ok(program)
    }

    fn block(&mut self, cst: &CstNode) -> Result<NodeId> {
        // The block's span is the union of the statements it keeps.
        let block = self.ast.create(NodeKind::Block, Span::SYNTHETIC);
        for (index, stmt) in cst.children_of(Rule::stmt).enumerate() {
            if self.max_statements.is_some_and(|limit| index >= limit) {
                debug!(
                    kept = index,
                    total = cst.children().len(),
                    "statement limit reached, skipping the rest"
                );
                break;
            }
            let node = self.stmt(stmt)?;
            self.ast.add_optional(block, node);
        }
        Ok(block)
    }

    fn stmt(&mut self, cst: &CstNode) -> Result<Option<NodeId>> {
        let Some(inner) = cst.first() else {
            return Ok(None);
        };
        trace!(rule = ?inner.rule(), offset = inner.start(), "statement");

        let node = match inner.rule() {
            Rule::use_stmt => self.use_stmt(inner)?,
            Rule::select_stmt => self.select_stmt(inner)?,
            Rule::drop_stmt => self.drop_stmt(inner)?,
            Rule::expr_stmt => self.node(NodeKind::Expr, inner),
            Rule::semicolon_stmt => self.node(NodeKind::Semicolon, inner),
            Rule::other_stmt => {
                let node = self.node(NodeKind::Unsupported, inner);
                if let Some(keyword) = inner.first() {
                    let statement = keyword.text(self.source).to_ascii_lowercase();
                    self.ast.set_data(node, "statement", statement);
                }
                node
            }
            _ => self.node(NodeKind::OtherStmt, inner),
        };
        Ok(Some(node))
    }

    fn use_stmt(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::Use, cst);
        self.add_keyword(node, cst.require(Rule::T_USE)?);
        let target = self.expr_identifier(cst.require(Rule::expr)?);
        self.ast.set_node(node, Slot::Identifier, Some(target), Some(1));
        Ok(node)
    }

    fn drop_stmt(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::Drop, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::T_TABLE => self.ast.set_drop_kind(node, DropKind::Table),
                Rule::T_DATABASE => self.ast.set_drop_kind(node, DropKind::Database),
                Rule::T_SCHEMA => self.ast.set_drop_kind(node, DropKind::Schema),
                _ => {}
            }
            match child.rule() {
                Rule::table_name => {
                    let table = self.table_name(child)?;
                    let index = self.next_index(node);
                    self.ast.set_node(node, Slot::TableName, Some(table), index);
                }
                Rule::expr => {
                    let expr = self.node(NodeKind::Expr, child);
                    let index = self.next_index(node);
                    self.ast.set_node(node, Slot::Expr, Some(expr), index);
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    // ========================================================================
    // SELECT STRUCTURE
    // ========================================================================

    fn select_stmt(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::Select, cst);
        if let Some(cte) = cst.child(Rule::cte_select_stmt) {
            let cte = self.cte_select(cte)?;
            self.ast.set_node(node, Slot::CteSelect, Some(cte), Some(0));
        }
        let full = self.full_select(cst.require(Rule::fullselect_stmt)?)?;
        self.ast.set_node(node, Slot::FullSelect, Some(full), Some(1));
        Ok(node)
    }

    fn cte_select(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::CteSelect, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::cte_select_stmt_item => {
                    let item = self.cte_select_item(child)?;
                    self.ast.push_item(node, item);
                }
                Rule::T_COMMA => self.add_leaf(node, NodeKind::Comma, child),
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn cte_select_item(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::CteSelectItem, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::ident => {
                    let name = self.identifier(child);
                    self.ast.set_node(node, Slot::Identifier, Some(name), Some(0));
                }
                Rule::cte_select_cols => self.add_leaf(node, NodeKind::CteSelectCols, child),
                Rule::fullselect_stmt => {
                    let full = self.full_select(child)?;
                    let index = self.next_index(node);
                    self.ast.set_node(node, Slot::FullSelect, Some(full), index);
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn full_select(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FullSelect, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::fullselect_stmt_item => {
                    let item = self.full_select_item(child)?;
                    self.ast.push_item(node, item);
                }
                Rule::fullselect_set_clause => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn full_select_item(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FullSelectItem, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::subselect_stmt => {
                    let sub = self.sub_select(child)?;
                    self.ast.set_node(node, Slot::SubSelect, Some(sub), Some(0));
                }
                Rule::fullselect_stmt => {
                    let full = self.full_select(child)?;
                    self.ast.set_node(node, Slot::FullSelect, Some(full), Some(1));
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn sub_select(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::SubSelect, cst);
        for child in cst.children() {
            let opaque = match child.rule() {
                Rule::select_list => {
                    let list = self.select_list(child)?;
                    self.ast.set_node(node, Slot::SelectList, Some(list), Some(1));
                    continue;
                }
                Rule::from_clause => {
                    let from = self.from_clause(child)?;
                    let index = self.next_index(node);
                    self.ast.set_node(node, Slot::FromClause, Some(from), index);
                    continue;
                }
                Rule::into_clause => NodeKind::IntoClause,
                Rule::where_clause => NodeKind::WhereClause,
                Rule::group_by_clause => NodeKind::GroupClause,
                Rule::having_clause => NodeKind::HavingClause,
                Rule::qualify_clause => NodeKind::QualifyClause,
                Rule::order_by_clause => NodeKind::OrderByClause,
                Rule::select_options => NodeKind::SelectOptions,
                _ if child.is_terminal() => NodeKind::Keyword,
                _ => return Err(cst.unexpected(child)),
            };
            self.add_leaf(node, opaque, child);
        }
        Ok(node)
    }

    // ========================================================================
    // SELECT LIST
    // ========================================================================

    fn select_list(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::SelectList, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::select_list_item => {
                    let item = self.select_list_item(child)?;
                    self.ast.push_item(node, item);
                }
                Rule::select_list_set => self.add_keyword(node, child),
                Rule::select_list_limit => self.add_leaf(node, NodeKind::SelectListLimit, child),
                Rule::T_COMMA => self.add_leaf(node, NodeKind::Comma, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn select_list_item(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::SelectListItem, cst);
        let named = cst.has_child(Rule::ident);
        for child in cst.children() {
            match child.rule() {
                Rule::select_list_asterisk => {
                    let asterisk = self.select_list_asterisk(child)?;
                    self.ast.set_node(node, Slot::Asterisk, Some(asterisk), Some(0));
                }
                Rule::ident => {
                    let target = self.identifier(child);
                    self.ast.set_node(node, Slot::Identifier, Some(target), Some(0));
                }
                Rule::expr => {
                    let expr = self.node(NodeKind::Expr, child);
                    let index = if named { 2 } else { 0 };
                    self.ast.set_node(node, Slot::Expr, Some(expr), Some(index));
                }
                Rule::select_list_alias => {
                    let alias = self.alias(NodeKind::SelectListAlias, child)?;
                    let index = if named { 3 } else { 1 };
                    self.ast.set_node(node, Slot::Alias, Some(alias), Some(index));
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn select_list_asterisk(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::SelectListAsterisk, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::L_ID => {
                    let qualifier = self.identifier(child);
                    self.ast.set_node(node, Slot::Identifier, Some(qualifier), Some(0));
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    /// `[AS] name`, shared by select-list and from-clause aliases.
    fn alias(&mut self, kind: NodeKind, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(kind, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::ident => {
                    let name = self.identifier(child);
                    let index = self.next_index(node);
                    self.ast.set_node(node, Slot::Identifier, Some(name), index);
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    // ========================================================================
    // FROM STRUCTURE
    // ========================================================================

    fn from_clause(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FromClause, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::from_table_clause => {
                    let table = self.from_table_clause(child)?;
                    self.ast.set_node(node, Slot::FromTableClause, Some(table), Some(1));
                }
                Rule::from_join_clause => {
                    let join = self.from_join_clause(child)?;
                    self.ast.push_item(node, join);
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn from_table_clause(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FromTableClause, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::from_table_name_clause => {
                    let name = self.from_table_name_clause(child)?;
                    self.ast.set_node(node, Slot::FromTableName, Some(name), Some(0));
                }
                Rule::from_subselect_clause => {
                    let sub = self.from_subselect_clause(child)?;
                    self.ast.set_node(node, Slot::FromSubSelect, Some(sub), Some(0));
                }
                Rule::from_table_values_clause => {
                    self.add_leaf(node, NodeKind::FromTableValuesClause, child)
                }
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn from_table_name_clause(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FromTableNameClause, cst);
        let table = self.table_name(cst.require(Rule::table_name)?)?;
        self.ast.set_node(node, Slot::TableName, Some(table), Some(0));
        if let Some(alias) = cst.child(Rule::from_alias_clause) {
            let alias = self.alias(NodeKind::FromAliasClause, alias)?;
            self.ast.set_node(node, Slot::Alias, Some(alias), Some(1));
        }
        Ok(node)
    }

    fn table_name(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::TableName, cst);
        let name = self.identifier(cst.require(Rule::ident)?);
        self.ast.set_node(node, Slot::Identifier, Some(name), Some(0));
        Ok(node)
    }

    fn from_subselect_clause(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FromSubSelectClause, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::select_stmt => {
                    let select = self.select_stmt(child)?;
                    self.ast.set_node(node, Slot::Select, Some(select), Some(1));
                }
                Rule::from_alias_clause => {
                    let alias = self.alias(NodeKind::FromAliasClause, child)?;
                    self.ast.set_node(node, Slot::Alias, Some(alias), Some(3));
                }
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }

    fn from_join_clause(&mut self, cst: &CstNode) -> Result<NodeId> {
        let node = self.node(NodeKind::FromJoinClause, cst);
        for child in cst.children() {
            match child.rule() {
                Rule::from_table_clause => {
                    let table = self.from_table_clause(child)?;
                    self.ast.set_node(node, Slot::FromTableClause, Some(table), Some(1));
                }
                Rule::T_COMMA => self.add_leaf(node, NodeKind::Comma, child),
                Rule::from_join_type_clause => {
                    self.add_leaf(node, NodeKind::FromJoinTypeClause, child)
                }
                Rule::bool_expr => self.add_leaf(node, NodeKind::BoolExpr, child),
                _ if child.is_terminal() => self.add_keyword(node, child),
                _ => return Err(cst.unexpected(child)),
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceContext;

    fn transform(source: &str) -> Ast {
        let cst = CstNode::parse(source, &SourceContext::new("test", source))
            .expect("grammar accepts input");
        Transformer::new(source)
            .transform(&cst)
            .expect("transform succeeds")
    }

    fn statement_kinds(ast: &Ast) -> Vec<NodeKind> {
        ast.program()
            .map(|p| p.statements().iter().map(|s| s.kind()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn statement_dispatch() {
        let ast = transform("use db; select 1; drop table t; create table x (a int); foo bar");
        assert_eq!(
            statement_kinds(&ast),
            vec![
                NodeKind::Use,
                NodeKind::Semicolon,
                NodeKind::Select,
                NodeKind::Semicolon,
                NodeKind::Drop,
                NodeKind::Semicolon,
                NodeKind::Unsupported,
                NodeKind::Semicolon,
                NodeKind::OtherStmt,
            ]
        );
    }

    #[test]
    fn unsupported_statement_records_its_keyword() {
        let ast = transform("INSERT INTO t VALUES (1)");
        let stmt = ast.program().map(|p| p.statements()[0]).expect("statement");
        assert_eq!(stmt.kind(), NodeKind::Unsupported);
        assert_eq!(stmt.data("statement"), Some("insert"));
    }

    #[test]
    fn qualified_identifier_sub_spans() {
        let ast = transform("drop table db.table1");
        let ident = ast
            .ids()
            .find(|id| ast.kind(*id) == NodeKind::Identifier)
            .expect("identifier");
        let ident = crate::ast::Identifier::cast(ast.node(ident)).expect("view");
        assert_eq!(ident.left().map(|n| n.span()), Some(Span::new(11, 2)));
        assert_eq!(ident.dot().map(|n| n.span()), Some(Span::new(13, 1)));
        assert_eq!(ident.right().map(|n| n.span()), Some(Span::new(14, 6)));
        assert_eq!(ident.span(), Span::new(11, 9));
    }

    #[test]
    fn statement_limit_skips_the_rest() {
        let source = "use a; use b; use c";
        let cst = CstNode::parse(source, &SourceContext::new("test", source)).expect("cst");
        let ast = Transformer::new(source)
            .max_statements(Some(2))
            .transform(&cst)
            .expect("ast");
        assert_eq!(statement_kinds(&ast), vec![NodeKind::Use, NodeKind::Semicolon]);
        let block = ast.program().and_then(|p| p.block()).expect("block");
        assert_eq!(block.span(), Span::new(0, 6));
    }

    #[test]
    fn rejects_non_program_roots() {
        let source = "use db";
        let cst = CstNode::parse(source, &SourceContext::new("test", source)).expect("cst");
        let block = cst.child(Rule::block).expect("block");
        let err = Transformer::new(source).transform(block);
        assert!(matches!(err, Err(TransformError::UnexpectedRule { .. })));
    }
}
