use std::collections::HashSet;

use crate::parsing::{NodeKind, ParsedNote, RegionKind, Span};

/// Validates the structural invariants of a parse result.
///
/// Asserts that:
/// - every node, entity and region span lies within the source
/// - every region has `end > start`, and regions of the same kind are
///   disjoint or properly nested
/// - child spans are contained in their parent; siblings are disjoint and in
///   source order
/// - every entity is attached to exactly one node, and that node contains it
/// - at least one Block exists
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(note: &ParsedNote) {
    let n = note.source.len();
    let tree = &note.tree;
    let in_bounds = |sp: Span| sp.start <= sp.end && sp.end <= n;

    for r in &note.regions {
        assert!(in_bounds(r.span), "region out of bounds: {r:?} (len {n})");
        assert!(r.span.end > r.span.start, "empty region: {r:?}");
    }
    for (i, a) in note.regions.iter().enumerate() {
        for b in &note.regions[i + 1..] {
            if same_kind(a.kind, b.kind) && a.span.overlaps(b.span) {
                assert!(
                    a.span.contains(b.span) || b.span.contains(a.span),
                    "partially overlapping regions: {a:?} and {b:?}"
                );
            }
        }
    }

    let mut attached = HashSet::new();
    for id in tree.preorder() {
        let node = tree.node(id);
        assert!(in_bounds(node.span), "node out of bounds: {node:?}");
        let mut prev_end = node.span.start;
        for &c in &node.children {
            let child = tree.node(c);
            assert_eq!(child.parent, Some(id), "bad parent link for {c:?}");
            assert!(
                node.span.contains(child.span),
                "child {:?} outside parent {:?}",
                child.span,
                node.span
            );
            assert!(
                child.span.start >= prev_end,
                "siblings overlap or are out of order at {:?}",
                child.span
            );
            prev_end = child.span.end;
        }
        for &e in &node.entities {
            let entity = tree.entity(e);
            assert!(in_bounds(entity.span), "entity out of bounds: {entity:?}");
            assert!(
                node.span.contains(entity.span),
                "entity {:?} outside its node {:?}",
                entity.span,
                node.span
            );
            assert!(attached.insert(e), "entity {e:?} attached twice");
            assert_eq!(tree.owner(e), id);
        }
    }
    assert_eq!(
        attached.len(),
        tree.entities().len(),
        "some entities are not attached"
    );
    assert!(
        tree.preorder()
            .into_iter()
            .any(|id| tree.node(id).kind == NodeKind::Block),
        "no block in tree"
    );
}

fn same_kind(a: RegionKind, b: RegionKind) -> bool {
    match (a, b) {
        (RegionKind::Delimiter(x), RegionKind::Delimiter(y)) => x == y,
        (RegionKind::Indent { .. }, RegionKind::Indent { .. }) => true,
        (RegionKind::Section { .. }, RegionKind::Section { .. }) => true,
        _ => false,
    }
}
