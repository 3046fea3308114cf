//! The parsed document tree.
//!
//! Nodes and entities live in arenas owned by [`Tree`] and refer to each
//! other by index ([`NodeId`], [`EntityId`]). Node 0 is always the
//! Document root.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use xi_rope::Rope;

use super::{
    microformat::{Entity, EntityId},
    rope::{Span, one_line_preview, slice_to_string},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Document,
    Block,
    Paragraph,
}

/// Where a Block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockOrigin {
    /// A heading or block-header line and its body.
    Section,
    /// An indentation level.
    Indent,
    /// Wrapper around top-level paragraphs.
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    /// `None` for documents and paragraphs.
    pub origin: Option<BlockOrigin>,
    pub name: Option<String>,
    pub block_type: Option<String>,
    /// Unique keys, last write wins.
    pub attributes: BTreeMap<String, String>,
    pub span: Span,
    pub parent: Option<NodeId>,
    /// Source order; sibling spans are disjoint.
    pub children: Vec<NodeId>,
    /// Source order.
    pub entities: Vec<EntityId>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            origin: None,
            name: None,
            block_type: None,
            attributes: BTreeMap::new(),
            span,
            parent: None,
            children: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn block(origin: BlockOrigin, span: Span) -> Self {
        Self {
            origin: Some(origin),
            ..Self::new(NodeKind::Block, span)
        }
    }

    pub fn is_block(&self) -> bool {
        self.kind == NodeKind::Block
    }

    pub fn is_section(&self) -> bool {
        self.origin == Some(BlockOrigin::Section)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
    entities: Vec<Entity>,
    /// Node each entity is attached to, indexed by entity id.
    owners: Vec<NodeId>,
}

impl Tree {
    pub(crate) fn from_parts(nodes: Vec<Node>, entities: Vec<Entity>, owners: Vec<NodeId>) -> Self {
        debug_assert_eq!(entities.len(), owners.len());
        Self {
            nodes,
            entities,
            owners,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All entities with their ids, in source order.
    pub fn entities_with_ids(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().enumerate().map(|(i, e)| (EntityId(i), e))
    }

    pub fn owner(&self, id: EntityId) -> NodeId {
        self.owners[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestors of `id`, nearest first, `id` itself excluded.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |&p| self.node(p).parent)
    }

    /// `id` itself if it is a Block, else its nearest Block ancestor.
    pub fn innermost_block(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.node(n).is_block())
    }

    /// All nodes in source (pre-)order, root first.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    pub fn top_level_blocks(&self) -> Vec<NodeId> {
        self.node(self.root())
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).is_block())
            .collect()
    }

    /// Text of `id` not covered by its own entities or children, split at
    /// those gaps, trimmed, with empty pieces dropped. For the paragraph
    /// `_CORS_ error` this is `["error"]`.
    pub fn fragments(&self, rope: &Rope, id: NodeId) -> Vec<(Span, String)> {
        let node = self.node(id);
        let mut covered: Vec<Span> = node
            .entities
            .iter()
            .map(|&e| self.entity(e).span)
            .chain(node.children.iter().map(|&c| self.node(c).span))
            .collect();
        covered.sort();

        let mut gaps = Vec::new();
        let mut at = node.span.start;
        for sp in covered {
            if sp.start > at {
                gaps.push(Span::new(at, sp.start));
            }
            at = at.max(sp.end);
        }
        if at < node.span.end {
            gaps.push(Span::new(at, node.span.end));
        }

        gaps.into_iter()
            .filter_map(|gap| {
                let text = slice_to_string(rope, gap);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let lead = text.len() - text.trim_start().len();
                let start = gap.start + lead;
                Some((Span::new(start, start + trimmed.len()), trimmed.to_owned()))
            })
            .collect()
    }

    /// Indented, human-readable rendering of the whole tree.
    ///
    /// ```text
    /// document 0..16
    ///   block "A" :heading {level=1} 0..8
    ///     paragraph 4..8 "one"
    /// ```
    pub fn outline(&self, rope: &Rope) -> String {
        let mut out = String::new();
        self.outline_node(rope, self.root(), 0, &mut out);
        out
    }

    fn outline_node(&self, rope: &Rope, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let pad = "  ".repeat(depth);
        let sp = node.span;
        match node.kind {
            NodeKind::Document => {
                let _ = writeln!(out, "{pad}document {}..{}", sp.start, sp.end);
            }
            NodeKind::Paragraph => {
                let text = one_line_preview(rope, sp, 60);
                let _ = writeln!(out, "{pad}paragraph {}..{} {text:?}", sp.start, sp.end);
            }
            NodeKind::Block => {
                let mut line = format!("{pad}block");
                match node.origin {
                    Some(BlockOrigin::Implicit) => line.push_str(" implicit"),
                    Some(BlockOrigin::Indent) => line.push_str(" indent"),
                    Some(BlockOrigin::Section) | None => {}
                }
                if let Some(name) = &node.name {
                    let _ = write!(line, " {name:?}");
                }
                if let Some(ty) = &node.block_type {
                    let _ = write!(line, " :{ty}");
                }
                if !node.attributes.is_empty() {
                    let attrs: Vec<String> = node
                        .attributes
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect();
                    let _ = write!(line, " {{{}}}", attrs.join(" "));
                }
                let _ = writeln!(out, "{line} {}..{}", sp.start, sp.end);
            }
        }

        enum Item {
            Child(NodeId),
            Entity(EntityId),
        }
        let mut items: Vec<(usize, u8, Item)> = node
            .children
            .iter()
            .map(|&c| (self.node(c).span.start, 0, Item::Child(c)))
            .chain(
                node.entities
                    .iter()
                    .map(|&e| (self.entity(e).span.start, 1, Item::Entity(e))),
            )
            .collect();
        items.sort_by_key(|(start, order, _)| (*start, *order));

        for (_, _, item) in items {
            match item {
                Item::Child(c) => self.outline_node(rope, c, depth + 1, out),
                Item::Entity(e) => {
                    let entity = self.entity(e);
                    let _ = writeln!(
                        out,
                        "{pad}  {} {} {}..{}",
                        entity.kind(),
                        entity.value,
                        entity.span.start,
                        entity.span.end
                    );
                }
            }
        }
    }
}
