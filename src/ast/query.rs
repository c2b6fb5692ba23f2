//! Offset-indexed queries: the node under a caret and the chain leading to it.

use super::tree::{Ast, NodeRef};
use super::NodeId;

/// Pre-order visitor. Returning `false` skips the children of `node`.
pub trait Visitor<'a> {
    fn visit_node(&mut self, node: NodeRef<'a>) -> bool;
}

impl<'a, F> Visitor<'a> for F
where
    F: FnMut(NodeRef<'a>) -> bool,
{
    fn visit_node(&mut self, node: NodeRef<'a>) -> bool {
        self(node)
    }
}

/// Drives `visitor` over the subtree rooted at `start`.
pub fn walk<'a, V: Visitor<'a>>(ast: &'a Ast, start: NodeId, visitor: &mut V) {
    ast.accept(start, |node| visitor.visit_node(node));
}

/// Smallest node under `root` whose span contains `offset`.
///
/// Spans are inclusive at the end, so a caret right after a token still
/// resolves to it. Synthetic nodes are walked through but never returned.
/// When two containing nodes have the same length, the one visited later
/// in pre-order wins.
pub fn node_at_offset(ast: &Ast, root: NodeId, offset: isize) -> Option<NodeId> {
    let root_span = ast.span(root);
    if !root_span.is_synthetic() && !root_span.contains(offset) {
        return None;
    }

    let mut best: Option<NodeId> = None;
    ast.accept(root, |node| {
        if node.is_synthetic() {
            return true;
        }
        if !node.span().contains(offset) {
            return false;
        }
        match best {
            Some(current) if ast.span(current).length < node.length() => {}
            _ => best = Some(node.id()),
        }
        true
    });
    best
}

/// Chain from the tree root down to the node at `offset`; empty if none.
pub fn path(ast: &Ast, root: NodeId, offset: isize) -> Vec<NodeRef<'_>> {
    let Some(target) = node_at_offset(ast, root, offset) else {
        return Vec::new();
    };
    let mut chain = vec![ast.node(target)];
    let mut current = ast.parent(target);
    while let Some(id) = current {
        chain.push(ast.node(id));
        current = ast.parent(id);
    }
    chain.reverse();
    chain
}
