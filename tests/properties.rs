mod common;

use hive_ast::ast::{Ast, Drop, Identifier, Span};
use hive_ast::{NodeKind, Parser};
use proptest::prelude::*;

const STATEMENTS: &[&str] = &[
    "use db",
    "use",
    "select * from t1",
    "select a, b as c from t1 join t2 on a = b",
    "select t.*, x = 1 from t1 as t, t2",
    "with x as (select 1) select * from x",
    "select a from t1 union all (select b from t2)",
    "select * from (select a from t1) s where a > 1",
    "drop table if exists db.t",
    "drop database d cascade",
    "drop",
    "create table t (a int)",
    "foo bar",
];

const SEPARATORS: &[&str] = &[";", "; ", ";\n", " ;  "];

fn script() -> impl Strategy<Value = String> {
    let stmt = prop::sample::select(STATEMENTS);
    let sep = prop::sample::select(SEPARATORS);
    prop::collection::vec((stmt, sep), 1..6).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(stmt, sep)| format!("{stmt}{sep}"))
            .collect()
    })
}

fn name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

fn non_synthetic_children_are_covered(ast: &Ast) -> bool {
    ast.ids().all(|id| {
        let span = ast.span(id);
        span.is_synthetic()
            || ast.children(id).iter().all(|child| {
                let child = ast.span(*child);
                child.is_synthetic() || span.covers(&child)
            })
    })
}

proptest! {
    #[test]
    fn parent_spans_cover_children(text in script()) {
        let ast = common::parse(&text);
        prop_assert!(non_synthetic_children_are_covered(&ast));
    }

    #[test]
    fn spans_stop_at_significant_text(text in script()) {
        let ast = common::parse(&text);
        for id in ast.ids() {
            let node = ast.node(id);
            if node.is_synthetic() {
                continue;
            }
            let covered = node.text();
            prop_assert_eq!(covered, covered.trim(), "{:?} at {}", node.kind(), node.span());
            if !node.has_children() {
                prop_assert!(!covered.is_empty(), "empty leaf {:?}", node.kind());
            }
        }
    }

    #[test]
    fn block_span_is_the_union_of_statements(text in script()) {
        let ast = common::parse(&text);
        let block = ast.program().and_then(|p| p.block()).expect("block");
        let mut union = Span::SYNTHETIC;
        for stmt in block.statements() {
            union.grow_to_cover(stmt.span());
        }
        prop_assert_eq!(block.span(), union);
    }

    #[test]
    fn path_follows_parent_links(text in script(), pick in any::<prop::sample::Index>()) {
        let ast = common::parse(&text);
        let offset = pick.index(text.len() + 1) as isize;
        let path = ast.path(offset);
        prop_assert!(!path.is_empty());
        prop_assert_eq!(path[0].id(), ast.root());
        for pair in path.windows(2) {
            prop_assert_eq!(pair[1].parent(), Some(pair[0]));
        }
        let target = path[path.len() - 1];
        prop_assert!(target.span().contains(offset));
        prop_assert!(!target.is_synthetic());
    }

    #[test]
    fn lookups_are_deterministic(text in script(), pick in any::<prop::sample::Index>()) {
        let offset = pick.index(text.len() + 1) as isize;
        let mut parser = Parser::new();
        let first = parser.parse(&text).expect("first");
        let second = parser.parse(&text).expect("second");
        prop_assert_eq!(first.snapshot(first.root()), second.snapshot(second.root()));

        let a = first.node_at_offset(offset).map(|n| (n.id(), n.kind(), n.span()));
        let b = second.node_at_offset(offset).map(|n| (n.id(), n.kind(), n.span()));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn qualified_identifier_round_trip(left in name(), right in name()) {
        let text = format!("drop table {left}.{right}");
        let ast = common::parse(&text);
        let drop = Drop::cast(common::statement(&ast, 0)).expect("drop");
        let ident: Identifier<'_> = drop.table().and_then(|t| t.identifier()).expect("identifier");

        prop_assert_eq!(ident.text(), format!("{left}.{right}"));
        prop_assert_eq!(ident.left().map(|n| n.text()), Some(left.as_str()));
        prop_assert_eq!(ident.dot().map(|n| n.text()), Some("."));
        prop_assert_eq!(ident.right().map(|n| n.text()), Some(right.as_str()));
    }

    #[test]
    fn append_grows_but_slots_do_not(
        parent in (0isize..50, 0isize..20),
        child in (0isize..80, 0isize..20),
    ) {
        let parent_span = Span::new(parent.0, parent.1);
        let child_span = Span::new(child.0, child.1);

        let mut ast = Ast::new();
        let slotted = ast.create(NodeKind::Use, parent_span);
        let slot_child = ast.create(NodeKind::Identifier, child_span);
        ast.set_node(slotted, hive_ast::ast::Slot::Identifier, Some(slot_child), None);
        prop_assert_eq!(ast.span(slotted), parent_span);

        let appended = ast.create(NodeKind::Use, parent_span);
        let add_child = ast.create(NodeKind::Keyword, child_span);
        ast.add_child(appended, add_child);
        let grown = ast.span(appended);
        prop_assert!(grown.covers(&parent_span));
        prop_assert!(grown.covers(&child_span));
        prop_assert_eq!(grown.offset, parent_span.offset.min(child_span.offset));
        prop_assert_eq!(grown.end(), parent_span.end().max(child_span.end()));
    }
}
