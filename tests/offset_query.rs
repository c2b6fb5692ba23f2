mod common;

use common::{caret, parse};
use hive_ast::ast::{node_at_offset, path, Use};
use hive_ast::{NodeKind, Parser};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn caret_after_use_keyword() {
    let (text, offset) = caret("use| db");
    let ast = parse(&text);
    let node = ast.node_at_offset(offset).expect("node");
    assert_eq!(node.kind(), NodeKind::Keyword);
    let stmt = node.parent().and_then(Use::cast).expect("use statement");
    assert_eq!(stmt.use_db_name(), "db");
}

#[test]
fn path_runs_from_program_to_target() {
    let (text, offset) = caret("select * from db.t|1");
    let ast = parse(&text);
    let chain = ast.path(offset);
    let kinds: Vec<_> = chain.iter().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Program,
            NodeKind::Block,
            NodeKind::Select,
            NodeKind::FullSelect,
            NodeKind::FullSelectItem,
            NodeKind::SubSelect,
            NodeKind::FromClause,
            NodeKind::FromTableClause,
            NodeKind::FromTableNameClause,
            NodeKind::TableName,
            NodeKind::Identifier,
            NodeKind::Id,
        ]
    );
    assert_eq!(chain.last().map(|n| n.text()), Some("t1"));
    for pair in chain.windows(2) {
        assert_eq!(pair[1].parent(), Some(pair[0]));
    }
}

#[test]
fn free_functions_match_methods() {
    let ast = parse("use db; use other");
    let root = ast.root();
    for offset in 0..=17 {
        assert_eq!(
            node_at_offset(&ast, root, offset).map(|id| ast.node(id)),
            ast.node_at_offset(offset)
        );
        assert_eq!(path(&ast, root, offset), ast.path(offset));
    }
}

#[test]
fn boundaries_prefer_the_later_shorter_node() {
    // `db` ends where `;` starts.
    let ast = parse("use db;");
    assert_eq!(ast.node_at_offset(6).map(|n| n.kind()), Some(NodeKind::Semicolon));
    assert_eq!(ast.node_at_offset(5).map(|n| n.kind()), Some(NodeKind::Identifier));
}

#[test]
fn offsets_outside_the_text() {
    let ast = parse("use db");
    assert!(ast.node_at_offset(7).is_none());
    assert!(ast.node_at_offset(-1).is_none());
    assert!(ast.path(100).is_empty());
    // Inclusive end: the caret right after the last character still hits.
    assert!(ast.node_at_offset(6).is_some());
}

#[test]
fn whitespace_between_statements_hits_the_block() {
    let ast = parse("use a;    use b");
    let node = ast.node_at_offset(8).expect("node");
    assert_eq!(node.kind(), NodeKind::Block);
}

#[test]
fn empty_input_has_no_tree() {
    assert!(hive_ast::parse("").is_none());
    assert!(hive_ast::parse("   \n").is_none());
}

#[test]
fn snapshot_serialises_the_tree() {
    let ast = parse("use db");
    let snapshot = serde_json::to_value(ast.snapshot(ast.root())).expect("json");
    let expected = json!({
        "kind": "Program",
        "span": { "offset": 0, "length": 6 },
        "text": "use db",
        "children": [{
            "kind": "Block",
            "span": { "offset": 0, "length": 6 },
            "text": "use db",
            "children": [{
                "kind": "Use",
                "span": { "offset": 0, "length": 6 },
                "text": "use db",
                "children": [
                    { "kind": "Keyword", "span": { "offset": 0, "length": 3 }, "text": "use" },
                    { "kind": "Identifier", "span": { "offset": 4, "length": 2 }, "text": "db" }
                ]
            }]
        }]
    });
    assert_eq!(snapshot, expected);
}

#[test]
fn reparsing_gives_equal_but_distinct_trees() {
    let text = "with x as (select a from t) select * from x join y on x.a = y.a";
    let mut parser = Parser::new();
    let first = parser.parse(text).expect("first");
    let second = parser.parse(text).expect("second");
    assert_eq!(first.snapshot(first.root()), second.snapshot(second.root()));
    assert_ne!(first.node(first.root()), second.node(second.root()));
}

#[test]
fn visitor_sees_every_node_in_pre_order() {
    let ast = parse("use db; drop table t");
    let mut kinds = Vec::new();
    ast.accept(ast.root(), |node| {
        kinds.push(node.kind());
        true
    });
    assert_eq!(kinds.len(), ast.len());
    assert_eq!(kinds[0], NodeKind::Program);
    assert_eq!(kinds[1], NodeKind::Block);
}
