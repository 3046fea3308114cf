//! # Tree folding
//!
//! Turns resolved regions into the node tree:
//!
//! 1. Section and indentation regions become Block candidates; paragraphs
//!    are computed from the scanner's line facts.
//! 2. Candidates are sorted by start ascending, end descending, precedence
//!    (section, indentation, paragraph) and folded with an explicit stack:
//!    each candidate becomes a child of the innermost open node containing
//!    it.
//! 3. Top-level paragraph runs are wrapped in implicit Blocks; a document
//!    with no Block at all gets a single implicit Block over the whole text.
//! 4. Each entity attaches to the innermost node containing it. Field
//!    entities also set an attribute on the innermost enclosing section.

use std::collections::BTreeSet;

use xi_rope::Rope;

use super::{
    microformat::{Entity, EntityId, EntityValue},
    resolve::{Region, RegionKind},
    rope::{Span, slice_to_string},
    scan::{LineFacts, SectionHead},
    tree::{BlockOrigin, Node, NodeId, NodeKind, Tree},
};

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Section(SectionHead),
    Indent,
    Paragraph,
}

impl Candidate {
    fn precedence(self) -> u8 {
        match self {
            Candidate::Section(_) => 0,
            Candidate::Indent => 1,
            Candidate::Paragraph => 2,
        }
    }
}

pub fn fold(rope: &Rope, lines: &[LineFacts], entities: Vec<Entity>, regions: &[Region]) -> Tree {
    let len = rope.len();
    let mut candidates: Vec<(Span, Candidate)> = regions
        .iter()
        .filter_map(|r| match r.kind {
            RegionKind::Section { head, .. } => Some((r.span, Candidate::Section(head))),
            RegionKind::Indent { .. } => Some((r.span, Candidate::Indent)),
            RegionKind::Delimiter(_) => None,
        })
        .collect();

    let boundaries: BTreeSet<usize> = candidates
        .iter()
        .flat_map(|(sp, _)| [sp.start, sp.end])
        .collect();
    candidates.extend(
        paragraphs(lines, &boundaries)
            .into_iter()
            .map(|sp| (sp, Candidate::Paragraph)),
    );
    candidates.sort_by_key(|(sp, c)| (sp.nesting_key(), c.precedence()));

    let mut nodes = vec![Node::new(NodeKind::Document, Span::new(0, len))];
    let mut stack = vec![NodeId(0)];
    for (span, candidate) in candidates {
        while let Some(&top) = stack.last() {
            if nodes[top.0].span.contains(span) || stack.len() == 1 {
                break;
            }
            stack.pop();
        }
        let parent = stack.last().copied().unwrap_or(NodeId(0));
        let mut node = match candidate {
            Candidate::Section(head) => section_node(rope, &entities, span, head),
            Candidate::Indent => Node::block(BlockOrigin::Indent, span),
            Candidate::Paragraph => Node::new(NodeKind::Paragraph, span),
        };
        node.parent = Some(parent);
        let id = NodeId(nodes.len());
        nodes.push(node);
        nodes[parent.0].children.push(id);
        stack.push(id);
    }

    wrap_top_level(&mut nodes, len);
    let owners = attach(&mut nodes, &entities);
    Tree::from_parts(nodes, entities, owners)
}

/// Maximal runs of non-blank text lines. Blank lines break a run unless a
/// quote is open; structural lines and block boundaries always break it.
fn paragraphs(lines: &[LineFacts], boundaries: &BTreeSet<usize>) -> Vec<Span> {
    let mut out = Vec::new();
    let mut run: Option<Span> = None;
    for line in lines {
        if boundaries.contains(&line.span.start) {
            out.extend(run.take());
        }
        if !line.blank && !line.kind.is_structural() {
            run = Some(match run {
                Some(r) => Span::new(r.start, line.span.end),
                None => line.span,
            });
        } else if !(line.blank && line.in_quote) {
            out.extend(run.take());
        }
    }
    out.extend(run);
    out
}

fn section_node(rope: &Rope, entities: &[Entity], span: Span, head: SectionHead) -> Node {
    let mut node = Node::block(BlockOrigin::Section, span);
    match head {
        SectionHead::Heading { level, title } => {
            let title = slice_to_string(rope, title);
            let title = title.trim();
            node.name = (!title.is_empty()).then(|| title.to_owned());
            node.block_type = Some("heading".to_owned());
            node.attributes.insert("level".to_owned(), level.to_string());
        }
        SectionHead::Header { entity } => {
            if let Some(EntityValue::BlockHeader {
                name,
                block_type,
                fields,
            }) = entities.get(entity.0).map(|e| &e.value)
            {
                node.name = Some(name.clone());
                node.block_type = Some(block_type.clone());
                node.attributes = fields.clone();
            }
        }
    }
    node
}

fn wrap_top_level(nodes: &mut Vec<Node>, len: usize) {
    let root = NodeId(0);
    let children = std::mem::take(&mut nodes[root.0].children);

    if !children.iter().any(|c| nodes[c.0].is_block()) {
        let id = NodeId(nodes.len());
        let mut block = Node::block(BlockOrigin::Implicit, Span::new(0, len));
        block.parent = Some(root);
        block.children = children;
        for c in &block.children {
            nodes[c.0].parent = Some(id);
        }
        nodes.push(block);
        nodes[root.0].children = vec![id];
        return;
    }

    let mut wrapped = Vec::with_capacity(children.len());
    let mut run: Vec<NodeId> = Vec::new();
    for child in children.into_iter().chain(std::iter::once(root)) {
        let is_paragraph = child != root && nodes[child.0].kind == NodeKind::Paragraph;
        if is_paragraph {
            run.push(child);
            continue;
        }
        if let (Some(first), Some(last)) = (run.first(), run.last()) {
            let id = NodeId(nodes.len());
            let span = Span::new(nodes[first.0].span.start, nodes[last.0].span.end);
            let mut block = Node::block(BlockOrigin::Implicit, span);
            block.parent = Some(root);
            for c in &run {
                nodes[c.0].parent = Some(id);
            }
            block.children = std::mem::take(&mut run);
            nodes.push(block);
            wrapped.push(id);
        }
        if child != root {
            wrapped.push(child);
        }
    }
    nodes[root.0].children = wrapped;
}

/// Attaches every entity to its innermost node and applies field
/// attributes. Returns the owner of each entity.
fn attach(nodes: &mut [Node], entities: &[Entity]) -> Vec<NodeId> {
    let mut owners = Vec::with_capacity(entities.len());
    for (i, entity) in entities.iter().enumerate() {
        let mut at = NodeId(0);
        // Descend as far as possible: for identical ranges the child, being
        // opened later, wins over its parent.
        while let Some(&next) = nodes[at.0]
            .children
            .iter()
            .rev()
            .find(|&&c| nodes[c.0].span.contains(entity.span))
        {
            at = next;
        }
        nodes[at.0].entities.push(EntityId(i));
        owners.push(at);

        if let EntityValue::Field { key, value } = &entity.value {
            let target = attribute_target(nodes, at);
            nodes[target.0].attributes.insert(key.clone(), value.clone());
        }
    }
    owners
}

/// Innermost enclosing section block, else innermost block, else the node.
fn attribute_target(nodes: &[Node], from: NodeId) -> NodeId {
    let chain: Vec<NodeId> = std::iter::successors(Some(from), |&n| nodes[n.0].parent).collect();
    chain
        .iter()
        .find(|&&n| nodes[n.0].is_section())
        .or_else(|| chain.iter().find(|&&n| nodes[n.0].is_block()))
        .copied()
        .unwrap_or(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::scan::LineKind;
    use pretty_assertions::assert_eq;

    fn text_line(start: usize, end: usize) -> LineFacts {
        LineFacts {
            span: Span::new(start, end),
            content: Span::new(start, end - 1),
            indent: 0,
            blank: false,
            kind: LineKind::Text,
            in_quote: false,
        }
    }

    fn blank_line(start: usize, in_quote: bool) -> LineFacts {
        LineFacts {
            span: Span::new(start, start + 1),
            content: Span::new(start, start),
            indent: 0,
            blank: true,
            kind: LineKind::Text,
            in_quote,
        }
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        let lines = [text_line(0, 2), blank_line(2, false), text_line(3, 5)];
        assert_eq!(
            paragraphs(&lines, &BTreeSet::new()),
            vec![Span::new(0, 2), Span::new(3, 5)]
        );
    }

    #[test]
    fn quoted_blank_lines_do_not_split() {
        let lines = [text_line(0, 2), blank_line(2, true), text_line(3, 5)];
        assert_eq!(paragraphs(&lines, &BTreeSet::new()), vec![Span::new(0, 5)]);
    }

    #[test]
    fn boundaries_split_paragraphs() {
        let lines = [text_line(0, 2), text_line(2, 4)];
        assert_eq!(
            paragraphs(&lines, &BTreeSet::from([2])),
            vec![Span::new(0, 2), Span::new(2, 4)]
        );
    }

    #[test]
    fn empty_document_still_has_a_block() {
        let rope = Rope::from("");
        let tree = fold(&rope, &[], vec![], &[]);
        let blocks = tree.top_level_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(tree.node(blocks[0]).origin, Some(BlockOrigin::Implicit));
    }
}
