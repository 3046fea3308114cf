use nota_engine::parsing::{EntityKind, parse_document, snapshot};
use nota_engine::query::NoteIndex;

#[test]
fn fixture_bookmark() {
    assert_fixture("bookmark");
}

#[test]
fn fixture_headings() {
    assert_fixture("headings");
}

#[test]
fn fixture_header() {
    assert_fixture("header");
}

#[test]
fn fixture_indented() {
    assert_fixture("indented");
}

fn assert_fixture(name: &str) {
    let text = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.nd",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let rope = xi_rope::Rope::from(text.as_str());

    let note = parse_document(&rope, Some(name));
    snapshot::invariants(&note);

    insta::assert_snapshot!(name, note.outline());
}

/// Slicing any node or entity span from the rope reproduces the source text
#[test]
fn lossless_span_invariant() {
    let text = "# Title #tag\n  body with _term_ and {braces}\n";
    let rope = xi_rope::Rope::from(text);

    let note = parse_document(&rope, None);

    for id in note.tree.preorder() {
        let span = note.tree.node(id).span;
        assert_eq!(note.text(span), &text[span.start..span.end]);
    }
    for entity in note.tree.entities() {
        assert_eq!(note.text(entity.span), &text[entity.span.start..entity.span.end]);
    }
}

#[test]
fn microformats_inside_quotes_are_still_extracted() {
    let note = parse_document(&xi_rope::Rope::from("\"see #later\"\n"), None);
    let kinds: Vec<_> = note.tree.entities().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EntityKind::Hashtag]);
}

#[test]
fn query_over_fixtures() {
    let notes = nota_engine::parse_many(
        ["bookmark", "headings", "header", "indented"]
            .into_iter()
            .map(|name| {
                let text = std::fs::read_to_string(format!(
                    "{}/tests/fixtures/{name}.nd",
                    env!("CARGO_MANIFEST_DIR")
                ))
                .unwrap();
                (name.to_string(), text)
            })
            .collect(),
    );
    let index = NoteIndex::from_map(&notes);

    let tagged: Vec<&str> = index
        .blocks_with_hashtag("todo", None)
        .into_iter()
        .map(|b| b.document)
        .collect();
    assert_eq!(tagged, vec!["indented"]);

    let headings: Vec<String> = index
        .top_level_blocks("headings")
        .unwrap()
        .into_iter()
        .map(|b| b.path)
        .collect();
    assert_eq!(headings, vec!["A".to_string(), "B".to_string()]);
}
