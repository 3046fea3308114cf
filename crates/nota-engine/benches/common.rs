// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_note_content(size: usize) -> String {
    let base = "-- tools/git:bookmark tag=cheatsheet\nhttp://example.com/git\nA repo for _rebase_ tips #cli #git\n2021-09-09 10:30\n\n# Usage\n  { \"quoted\" { nested } } // comment\n  more text [reference] 3PM\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_nested_note(sections: usize, depth: usize) -> String {
    let mut content = String::new();

    for section in 0..sections {
        content.push_str(&format!("# Section {section}\n"));
        for level in 0..depth {
            let indent = "  ".repeat(level);
            content.push_str(&format!(
                "{indent}item {level} #tag{level} _term{level}_ {{ \"q\" }}\n"
            ));
        }
        content.push('\n');
    }

    content
}
