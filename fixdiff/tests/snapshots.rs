//! Snapshot tests for edit-script rendering, mirroring how diff output
//! formatting is snapshotted upstream: ANSI stripped, structure preserved.

use fixdiff::{generate_edit_script, GeneratorOptions, Mapping, NodeData, NodeId, Tree};
use insta::assert_snapshot;

/// Strip ANSI escape codes from a string.
fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[test]
fn rename_and_reorder_script_renders_stably() {
    let mut source = Tree::new(NodeData::list(NodeId(0), "Body", "body"));
    let s_root = source.root_id();
    source.push_list_child(s_root, NodeData::new(NodeId(1), "Name", "a"));
    source.push_list_child(s_root, NodeData::new(NodeId(2), "Name", "b"));

    let mut dest = Tree::new(NodeData::list(NodeId(0), "Body", "body"));
    let d_root = dest.root_id();
    dest.push_list_child(d_root, NodeData::new(NodeId(2), "Name", "b_renamed"));
    dest.push_list_child(d_root, NodeData::new(NodeId(1), "Name", "a"));

    let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0)), (NodeId(1), NodeId(1)), (NodeId(2), NodeId(2))]);
    let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();

    let rendered = strip_ansi(&result.script.to_string());
    assert_snapshot!(rendered);
}
