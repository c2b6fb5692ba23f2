//! Arena storage for AST nodes and the generic node operations.
//!
//! Two attachment paths exist and they differ on purpose:
//! - generic append ([`Ast::add_child`]) grows the parent's span to cover the child;
//! - typed-slot attachment ([`Ast::set_node`]) leaves the parent's span alone.

use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use super::nodes::Program;
use super::span::{Span, TextProvider, UNKNOWN_TEXT};
use super::{query, DropKind, NodeId, NodeKind, Slot};
use crate::diagnostics::Marker;

// ============================================================================
// NODE STORAGE
// ============================================================================

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    slots: SmallVec<[(Slot, NodeId); 2]>,
    drop_kind: Option<DropKind>,
    custom_property: bool,
    data: Option<HashMap<String, String>>,
    text_provider: Option<Arc<dyn TextProvider>>,
    issues: Vec<Marker>,
}

impl NodeData {
    fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            parent: None,
            children: Vec::new(),
            slots: SmallVec::new(),
            drop_kind: None,
            custom_property: false,
            data: None,
            text_provider: None,
            issues: Vec::new(),
        }
    }
}

/// Owning arena for one syntax tree.
///
/// The first node created is the root. Dropping the arena releases every
/// node at once.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<NodeData>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { ast: self, id }
    }

    /// The root as a typed `Program`, if the tree was built by the parser.
    pub fn program(&self) -> Option<Program<'_>> {
        if self.is_empty() {
            return None;
        }
        Program::cast(self.node(self.root()))
    }

    /// All node handles in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    // ------------------------------------------------------------------------
    // Construction and attachment
    // ------------------------------------------------------------------------

    pub fn create(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData::new(kind, span));
        id
    }

    /// Creates a synthetic list wrapper attached to `parent`.
    pub fn create_node_list(&mut self, parent: NodeId, index: Option<usize>) -> NodeId {
        let list = self.create(NodeKind::NodeList, Span::SYNTHETIC);
        self.adopt_child(parent, list, index)
    }

    /// Re-parenting primitive: detaches `child` from its current parent and
    /// inserts it under `parent` at `index` (clamped), or appends it.
    pub fn adopt_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> NodeId {
        debug_assert_ne!(parent, child, "a node cannot own itself");
        self.detach(child);
        self.data_mut(child).parent = Some(parent);
        let children = &mut self.data_mut(parent).children;
        match index {
            Some(index) => children.insert(index.min(children.len()), child),
            None => children.push(child),
        }
        child
    }

    pub fn attach_to(&mut self, child: NodeId, parent: NodeId, index: Option<usize>) -> NodeId {
        self.adopt_child(parent, child, index)
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old) = self.data_mut(child).parent.take() {
            let old = self.data_mut(old);
            old.children.retain(|c| *c != child);
            old.slots.retain(|(_, c)| *c != child);
        }
    }

    /// Generic append: attaches `child` last and grows the parent's span.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.adopt_child(parent, child, None);
        let child_span = self.data(child).span;
        self.data_mut(parent).span.grow_to_cover(child_span);
    }

    /// Appends an optional child; an absent child is a no-op.
    pub fn add_optional(&mut self, parent: NodeId, child: Option<NodeId>) -> bool {
        match child {
            Some(child) => {
                self.add_child(parent, child);
                true
            }
            None => false,
        }
    }

    pub fn add_children(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.add_child(parent, child);
        }
    }

    /// Appends a member of a list-shaped node and records it under [`Slot::Item`].
    pub fn push_item(&mut self, parent: NodeId, child: NodeId) {
        self.add_child(parent, child);
        self.data_mut(parent).slots.push((Slot::Item, child));
    }

    /// Typed-slot attachment. Does not touch the parent's span.
    ///
    /// Returns `false` and leaves the tree unchanged when `child` is absent.
    pub fn set_node(
        &mut self,
        parent: NodeId,
        slot: Slot,
        child: Option<NodeId>,
        index: Option<usize>,
    ) -> bool {
        let Some(child) = child else {
            return false;
        };
        self.adopt_child(parent, child, index);
        let slots = &mut self.data_mut(parent).slots;
        if slot != Slot::Item {
            slots.retain(|(s, _)| *s != slot);
        }
        slots.push((slot, child));
        true
    }

    pub fn set_drop_kind(&mut self, id: NodeId, kind: DropKind) {
        self.data_mut(id).drop_kind = Some(kind);
    }

    pub fn set_custom_property(&mut self, id: NodeId, custom: bool) {
        self.data_mut(id).custom_property = custom;
    }

    pub fn set_text_provider(&mut self, id: NodeId, provider: Arc<dyn TextProvider>) {
        self.data_mut(id).text_provider = Some(provider);
    }

    // ------------------------------------------------------------------------
    // Side table and markers
    // ------------------------------------------------------------------------

    pub fn set_data(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        self.data_mut(id)
            .data
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    pub fn get_data(&self, id: NodeId, key: &str) -> Option<&str> {
        self.data(id).data.as_ref()?.get(key).map(String::as_str)
    }

    /// Attaches a marker to the node it was raised on.
    pub fn add_issue(&mut self, marker: Marker) {
        let node = marker.node();
        self.data_mut(node).issues.push(marker);
    }

    pub fn issues(&self, id: NodeId) -> &[Marker] {
        &self.data(id).issues
    }

    // ------------------------------------------------------------------------
    // Shape accessors
    // ------------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.data(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.data(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Parent with synthetic list wrappers skipped.
    pub fn logical_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if self.kind(parent) != NodeKind::NodeList {
                break;
            }
            current = self.parent(parent);
        }
        current
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    pub fn slot(&self, id: NodeId, slot: Slot) -> Option<NodeId> {
        self.data(id)
            .slots
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, child)| *child)
    }

    pub fn slot_items(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.data(id)
            .slots
            .iter()
            .filter(|(s, _)| *s == Slot::Item)
            .map(|(_, child)| *child)
    }

    pub fn drop_kind(&self, id: NodeId) -> Option<DropKind> {
        self.data(id).drop_kind
    }

    pub fn is_custom_property(&self, id: NodeId) -> bool {
        self.data(id).custom_property
    }

    /// Walks from `id` (inclusive) towards the root until a node of `kind`.
    pub fn find_parent(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.kind(node) == kind {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Rightmost child starting at or before `offset`.
    pub fn find_first_child_before_offset(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        self.children(id)
            .iter()
            .rev()
            .copied()
            .find(|child| self.span(*child).offset <= offset)
    }

    pub fn find_child_at_offset(&self, id: NodeId, offset: isize, go_deep: bool) -> Option<NodeId> {
        let current = self.find_first_child_before_offset(id, offset)?;
        if self.span(current).end() < offset {
            return None;
        }
        if go_deep {
            return self
                .find_child_at_offset(current, offset, true)
                .or(Some(current));
        }
        Some(current)
    }

    /// True when `candidate`'s span lies within `id`'s span. Tree position is
    /// not consulted.
    pub fn encloses(&self, id: NodeId, candidate: NodeId) -> bool {
        self.span(id).covers(&self.span(candidate))
    }

    // ------------------------------------------------------------------------
    // Text resolution
    // ------------------------------------------------------------------------

    /// Nearest text provider on the ancestor chain, O(depth).
    pub fn text_provider(&self, id: NodeId) -> Option<&dyn TextProvider> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(provider) = &self.data(node).text_provider {
                return Some(provider.as_ref());
            }
            current = self.parent(node);
        }
        None
    }

    fn slice(&self, id: NodeId, offset: isize, length: isize) -> &str {
        match self.text_provider(id) {
            Some(provider) => provider.slice(offset, length),
            None => UNKNOWN_TEXT,
        }
    }

    /// Source text of the node, or [`UNKNOWN_TEXT`] when detached.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.slice(id, span.offset, span.length)
    }

    pub fn matches(&self, id: NodeId, s: &str) -> bool {
        let span = self.span(id);
        span.length == s.len() as isize && self.slice(id, span.offset, span.length) == s
    }

    pub fn starts_with(&self, id: NodeId, s: &str) -> bool {
        let span = self.span(id);
        let len = s.len() as isize;
        span.length >= len && self.slice(id, span.offset, len) == s
    }

    pub fn ends_with(&self, id: NodeId, s: &str) -> bool {
        let span = self.span(id);
        let len = s.len() as isize;
        span.length >= len && self.slice(id, span.end() - len, len) == s
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Pre-order walk from `start`. Returning `false` from the visitor prunes
    /// the subtree of the node just visited.
    pub fn accept<'a, F>(&'a self, start: NodeId, mut visitor: F)
    where
        F: FnMut(NodeRef<'a>) -> bool,
    {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if visitor(self.node(id)) {
                stack.extend(self.children(id).iter().rev().copied());
            }
        }
    }

    /// Smallest node under the root containing `offset`.
    pub fn node_at_offset(&self, offset: isize) -> Option<NodeRef<'_>> {
        if self.is_empty() {
            return None;
        }
        query::node_at_offset(self, self.root(), offset).map(|id| self.node(id))
    }

    /// Root-to-leaf chain ending at the node under `offset`.
    pub fn path(&self, offset: isize) -> Vec<NodeRef<'_>> {
        if self.is_empty() {
            return Vec::new();
        }
        query::path(self, self.root(), offset)
    }

    pub fn snapshot(&self, id: NodeId) -> NodeSnapshot {
        NodeSnapshot {
            kind: self.kind(id),
            span: self.span(id),
            text: self.text(id).to_string(),
            children: self
                .children(id)
                .iter()
                .map(|child| self.snapshot(*child))
                .collect(),
        }
    }
}

// ============================================================================
// BORROWED NODE HANDLE
// ============================================================================

/// A node handle bundled with the arena it lives in.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn ast(self) -> &'a Ast {
        self.ast
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn kind(self) -> NodeKind {
        self.ast.kind(self.id)
    }

    pub fn span(self) -> Span {
        self.ast.span(self.id)
    }

    pub fn offset(self) -> isize {
        self.span().offset
    }

    pub fn length(self) -> isize {
        self.span().length
    }

    pub fn end(self) -> isize {
        self.span().end()
    }

    pub fn is_synthetic(self) -> bool {
        self.span().is_synthetic()
    }

    pub fn text(self) -> &'a str {
        self.ast.text(self.id)
    }

    pub fn matches(self, s: &str) -> bool {
        self.ast.matches(self.id, s)
    }

    pub fn starts_with(self, s: &str) -> bool {
        self.ast.starts_with(self.id, s)
    }

    pub fn ends_with(self, s: &str) -> bool {
        self.ast.ends_with(self.id, s)
    }

    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.ast.parent(self.id).map(|id| self.ast.node(id))
    }

    pub fn logical_parent(self) -> Option<NodeRef<'a>> {
        self.ast.logical_parent(self.id).map(|id| self.ast.node(id))
    }

    pub fn find_parent(self, kind: NodeKind) -> Option<NodeRef<'a>> {
        self.ast.find_parent(self.id, kind).map(|id| self.ast.node(id))
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let ast = self.ast;
        ast.children(self.id).iter().map(move |id| ast.node(*id))
    }

    pub fn child(self, index: usize) -> Option<NodeRef<'a>> {
        self.ast.child(self.id, index).map(|id| self.ast.node(id))
    }

    pub fn has_children(self) -> bool {
        self.ast.has_children(self.id)
    }

    pub fn slot(self, slot: Slot) -> Option<NodeRef<'a>> {
        self.ast.slot(self.id, slot).map(|id| self.ast.node(id))
    }

    pub fn slot_items(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let ast = self.ast;
        ast.slot_items(self.id).map(move |id| ast.node(id))
    }

    pub fn data(self, key: &str) -> Option<&'a str> {
        self.ast.get_data(self.id, key)
    }

    pub fn find_child_at_offset(self, offset: isize, go_deep: bool) -> Option<NodeRef<'a>> {
        self.ast
            .find_child_at_offset(self.id, offset, go_deep)
            .map(|id| self.ast.node(id))
    }

    /// Span containment, as [`Ast::encloses`]; `candidate` may come from another tree.
    pub fn encloses(self, candidate: NodeRef<'_>) -> bool {
        self.span().covers(&candidate.span())
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.ast, other.ast) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("span", &self.span())
            .finish()
    }
}

/// Owned, serialisable copy of a subtree: kind, span and text per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub kind: NodeKind,
    pub span: Span,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}
