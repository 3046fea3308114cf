//! End-to-end tests for the parsing pipeline.

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::parsing::{
    BlockOrigin, DelimiterKind, DiagnosticKind, EntityKind, EntityValue, NodeId, NodeKind,
    ParsedNote, RegionKind, Span, parse_str,
    scan::{Role, scan},
    snapshot,
};

fn parse(text: &str) -> ParsedNote {
    let note = parse_str(text, Some("test"));
    snapshot::invariants(&note);
    note
}

fn entity_values(note: &ParsedNote, under: NodeId, kind: EntityKind) -> Vec<String> {
    let tree = &note.tree;
    let mut ids = Vec::new();
    let mut stack = vec![under];
    while let Some(id) = stack.pop() {
        ids.extend(tree.node(id).entities.iter().copied());
        stack.extend(tree.node(id).children.iter().copied());
    }
    ids.sort();
    ids.into_iter()
        .map(|e| tree.entity(e))
        .filter(|e| e.kind() == kind)
        .map(|e| e.value.to_string())
        .collect()
}

fn paragraphs_under(note: &ParsedNote, id: NodeId) -> Vec<NodeId> {
    note.tree
        .node(id)
        .children
        .iter()
        .copied()
        .filter(|&c| note.tree.node(c).kind == NodeKind::Paragraph)
        .collect()
}

#[rstest]
#[case("")]
#[case("plain\n")]
#[case("{ \"a\" { \"b\" } }")]
#[case("# A\n  {x \"y\n  z\" #t}\nb } 10:00\n\t\"open\n")]
#[case("\"never closed\n\n  indented\n")]
#[case("-- a:b k=v\n-- x=1\n## h\n  -- c\n    deep\n}\n")]
#[case("[unterminated _term 13PM <http://x\n")]
fn markers_are_position_ordered(#[case] text: &str) {
    let out = scan(&xi_rope::Rope::from(text));
    assert!(out.markers.windows(2).all(|w| w[0].pos <= w[1].pos));
    snapshot::invariants(&parse(text));
}

#[rstest]
fn invariants_hold_for_mixed_input(
    #[values("", "-- a:b k=v\n", "# H\n", "  ")] lead: &str,
    #[values(
        "{x \"y\n",
        "\"q\n\n  z\" #t\n",
        "a } b // c {\n",
        "_t_ 2021-09-09T10:00 <http://x> [ref]\n"
    )]
    body: &str,
    #[values("", "\t-- c\n  deep #x\n", "## h\n}\n-- d=1\n")] tail: &str,
) {
    let text = format!("{lead}{body}{tail}");
    let first = parse_str(&text, None);
    snapshot::invariants::check(&first);
    assert!(!first.tree.top_level_blocks().is_empty(), "{text:?}");

    let second = parse_str(&text, None);
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn parsing_is_deterministic() {
    let text = "# A\n\"q\n\n  x #t\n-- n:t a=1 a=2\n_t_ 2021-13-01\n";
    let a = parse(text);
    let b = parse(text);
    assert_eq!(a.tree, b.tree);
    assert_eq!(a.regions, b.regions);
    assert_eq!(a.diagnostics, b.diagnostics);
}

#[test]
fn brace_depth_around_inner_quote() {
    let note = parse(r#"{ "a" { "b" } }"#);
    let b = note
        .regions
        .iter()
        .find(|r| r.kind == RegionKind::Delimiter(DelimiterKind::Quote) && r.span.start == 8)
        .expect("quote around b");
    assert_eq!(note.text(b.span), "\"b\"");
    assert_eq!(note.delimiter_depth(DelimiterKind::Brace, b.span), 2);
}

#[test]
fn sibling_headings_are_sibling_blocks() {
    let note = parse("# A\none\n# B\ntwo\n");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(blocks.len(), 2);
    for (block, (name, text)) in blocks.iter().zip([("A", "one"), ("B", "two")]) {
        let node = note.tree.node(*block);
        assert_eq!(node.name.as_deref(), Some(name));
        assert_eq!(node.block_type.as_deref(), Some("heading"));
        let paras = paragraphs_under(&note, *block);
        assert_eq!(paras.len(), 1);
        assert_eq!(note.fragments(paras[0]), vec![text.to_string()]);
    }
    assert!(note.tree.node(blocks[0]).span.end <= note.tree.node(blocks[1]).span.start);
}

fn child_block_names(note: &ParsedNote, id: NodeId) -> Vec<String> {
    note.tree
        .node(id)
        .children
        .iter()
        .map(|&c| note.tree.node(c))
        .filter(|n| n.kind == NodeKind::Block)
        .map(|n| n.name.clone().unwrap_or_default())
        .collect()
}

#[test]
fn heading_after_block_header_nests_inside_it() {
    let note = parse("-- a\n# H\nx\n-- b\n");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(
        blocks
            .iter()
            .map(|&b| note.tree.node(b).span)
            .collect::<Vec<_>>(),
        vec![Span::new(0, 11), Span::new(11, 16)]
    );
    assert_eq!(child_block_names(&note, note.tree.root()), vec!["a", "b"]);
    assert_eq!(child_block_names(&note, blocks[0]), vec!["H"]);
    assert!(child_block_names(&note, blocks[1]).is_empty());
}

#[test]
fn block_header_scope_runs_to_next_header_at_same_depth() {
    let note = parse("-- a\nbody\n-- b\n  -- c\n  inner\n");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(child_block_names(&note, note.tree.root()), vec!["a", "b"]);

    let a = note.tree.node(blocks[0]);
    assert_eq!(a.span, Span::new(0, 10));
    let paras = paragraphs_under(&note, blocks[0]);
    assert_eq!(note.fragments(paras[0]), vec!["body".to_string()]);

    assert_eq!(note.tree.node(blocks[1]).span, Span::new(10, 30));
    assert_eq!(child_block_names(&note, blocks[1]), vec!["c"]);
}

#[test]
fn bookmark_header_contains_following_heading() {
    let note = parse("-- tools/git:bookmark\n# Usage\ntext\n");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(note.tree.node(blocks[0]).span, Span::new(0, 35));
    assert_eq!(child_block_names(&note, blocks[0]), vec!["Usage"]);
}

#[test]
fn bookmark_note_in_one_block() {
    let note = parse("http://x/y\nA repo\n#cli #notes #tool\n2021-09-09\n");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(blocks.len(), 1);
    let block = blocks[0];

    assert_eq!(
        entity_values(&note, block, EntityKind::Url),
        vec!["http://x/y"]
    );
    assert_eq!(
        entity_values(&note, block, EntityKind::Hashtag),
        vec!["#cli", "#notes", "#tool"]
    );
    let dates: Vec<_> = note
        .tree
        .entities()
        .iter()
        .filter_map(|e| match e.value {
            EntityValue::Date(d) => Some((d.year, d.month, d.day)),
            _ => None,
        })
        .collect();
    assert_eq!(dates, vec![(2021, 9, 9)]);

    let paras = paragraphs_under(&note, block);
    assert_eq!(paras.len(), 1);
    assert_eq!(note.fragments(paras[0]), vec!["A repo".to_string()]);
    assert!(note.diagnostics.is_empty());
}

#[test]
fn block_header_names_the_block() {
    let note = parse("-- tools/git:bookmark tag=cheatsheet");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(blocks.len(), 1);
    let node = note.tree.node(blocks[0]);
    assert_eq!(node.name.as_deref(), Some("tools/git"));
    assert_eq!(node.block_type.as_deref(), Some("bookmark"));
    assert_eq!(node.attributes.get("tag").map(String::as_str), Some("cheatsheet"));

    let fields: Vec<_> = note
        .tree
        .entities()
        .iter()
        .filter(|e| e.kind() == EntityKind::Field)
        .collect();
    assert_eq!(fields.len(), 1);
    assert_eq!(
        fields[0].value,
        EntityValue::Field {
            key: "tag".into(),
            value: "cheatsheet".into()
        }
    );
}

#[test]
fn unterminated_quote_is_closed_at_end() {
    let note = parse("\"abc");
    let unterminated: Vec<_> = note
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnterminatedSpan)
        .collect();
    assert_eq!(unterminated.len(), 1);
    assert_eq!(unterminated[0].document.as_deref(), Some("test"));
    assert_eq!(
        note.regions
            .iter()
            .map(|r| (r.kind, r.span))
            .collect::<Vec<_>>(),
        vec![(RegionKind::Delimiter(DelimiterKind::Quote), Span::new(0, 4))]
    );
}

#[rstest]
#[case("_CORS_", vec![])]
#[case("_CORS_ error", vec!["error"])]
fn single_term_with_fragments(#[case] text: &str, #[case] fragments: Vec<&str>) {
    let note = parse(text);
    let terms: Vec<_> = note
        .tree
        .entities()
        .iter()
        .filter(|e| e.kind() == EntityKind::Term)
        .map(|e| e.value.clone())
        .collect();
    assert_eq!(terms, vec![EntityValue::Term { name: "CORS".into() }]);

    let block = note.tree.top_level_blocks()[0];
    let paras = paragraphs_under(&note, block);
    assert_eq!(paras.len(), 1);
    assert_eq!(note.fragments(paras[0]), fragments);
}

#[test]
fn no_blocks_means_one_implicit_block() {
    for text in ["", "\n\n", "just words\n\nmore words\n"] {
        let note = parse(text);
        let blocks = note.tree.top_level_blocks();
        assert_eq!(blocks.len(), 1, "{text:?}");
        let node = note.tree.node(blocks[0]);
        assert_eq!(node.origin, Some(BlockOrigin::Implicit));
        assert_eq!(node.span, Span::new(0, text.len()));
    }
}

#[test]
fn top_level_paragraph_runs_are_wrapped() {
    let note = parse("intro\n# A\nbody\n");
    let origins: Vec<_> = note
        .tree
        .top_level_blocks()
        .into_iter()
        .map(|b| note.tree.node(b).origin)
        .collect();
    assert_eq!(
        origins,
        vec![Some(BlockOrigin::Implicit), Some(BlockOrigin::Section)]
    );
    assert_eq!(
        note.tree.top_level_blocks().len(),
        note.tree.node(note.tree.root()).children.len()
    );
}

#[test]
fn field_line_sets_attribute_on_enclosing_section() {
    let note = parse("# Task\n-- status=open\nbody\n-- status=done\n");
    let block = note.tree.top_level_blocks()[0];
    let node = note.tree.node(block);
    assert_eq!(node.attributes.get("status").map(String::as_str), Some("done"));
    assert_eq!(node.attributes.get("level").map(String::as_str), Some("1"));
}

#[test]
fn indented_lines_form_nested_block() {
    let note = parse("project\n  task one #todo\n  task two\ndone\n");
    let blocks = note.tree.top_level_blocks();
    let origins: Vec<_> = blocks.iter().map(|&b| note.tree.node(b).origin).collect();
    assert_eq!(
        origins,
        vec![
            Some(BlockOrigin::Implicit),
            Some(BlockOrigin::Indent),
            Some(BlockOrigin::Implicit)
        ]
    );
    assert_eq!(
        entity_values(&note, blocks[1], EntityKind::Hashtag),
        vec!["#todo"]
    );
}

#[test]
fn entity_attaches_to_innermost_node() {
    let note = parse("# Title #head\nbody #para\n");
    let tree = &note.tree;
    let owner_kinds: Vec<_> = tree
        .entities_with_ids()
        .map(|(id, e)| (e.value.to_string(), tree.node(tree.owner(id)).kind))
        .collect();
    assert_eq!(
        owner_kinds,
        vec![
            ("#head".to_string(), NodeKind::Block),
            ("#para".to_string(), NodeKind::Paragraph),
        ]
    );
}

#[test]
fn stray_closer_reports_mismatch() {
    let note = parse("a } b\n");
    assert_eq!(note.diagnostics.len(), 1);
    assert_eq!(note.diagnostics[0].kind, DiagnosticKind::MismatchedSpan);
    assert!(note.regions.is_empty());
}

#[test]
fn blank_lines_inside_quote_keep_paragraph() {
    let note = parse("\"first\n\nsecond\"\n");
    let block = note.tree.top_level_blocks()[0];
    assert_eq!(paragraphs_under(&note, block).len(), 1);
}

#[test]
fn heading_hash_versus_hashtag() {
    let note = parse("# heading\n#tag\n");
    let blocks = note.tree.top_level_blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(note.tree.node(blocks[0]).name.as_deref(), Some("heading"));
    assert_eq!(
        entity_values(&note, blocks[0], EntityKind::Hashtag),
        vec!["#tag"]
    );
}

#[test]
fn diagnostics_are_sorted_by_position() {
    let note = parse("} [x\n\"open");
    let positions: Vec<_> = note.diagnostics.iter().map(|d| d.position()).collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
    assert_eq!(positions.len(), 3);
}

#[test]
fn line_comment_regions_end_at_line_end() {
    let note = parse("code // note\nnext\n");
    let comments: Vec<_> = note
        .regions
        .iter()
        .filter(|r| r.kind == RegionKind::Delimiter(DelimiterKind::LineComment))
        .map(|r| note.text(r.span))
        .collect();
    assert_eq!(comments, vec!["// note"]);
    let out = scan(&xi_rope::Rope::from("code // note\nnext\n"));
    assert!(out.markers.iter().any(|m| m.role == Role::Close && m.pos == 12));
}
