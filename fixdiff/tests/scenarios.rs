//! End-to-end scenarios for the edit-script generator and runtime
//! comparator, exercising the stage order and the universal properties.

use fixdiff::{
    compare_comparisons, generate_edit_script, Action, Effect, GeneratorOptions, Mapping, NodeData, NodeId, RuntimeComparison,
};
use fixdiff::runtime::{ExecutionTrace, RunOutcome, TraceOp};
use fixdiff::Tree;

fn leaf(id: u64, kind: &str, name: &str) -> NodeData {
    NodeData::new(NodeId(id), kind, name)
}

/// S2 - list reorder: source body [A; B; C], dest body [C; A; B].
#[test]
fn list_reorder_moves_only_the_displaced_element() {
    let mut source = Tree::new(NodeData::list(NodeId(0), "Body", "body"));
    let s_root = source.root_id();
    source.push_list_child(s_root, leaf(1, "Stmt", "A"));
    source.push_list_child(s_root, leaf(2, "Stmt", "B"));
    source.push_list_child(s_root, leaf(3, "Stmt", "C"));

    let mut dest = Tree::new(NodeData::list(NodeId(0), "Body", "body"));
    let d_root = dest.root_id();
    dest.push_list_child(d_root, leaf(3, "Stmt", "C"));
    dest.push_list_child(d_root, leaf(1, "Stmt", "A"));
    dest.push_list_child(d_root, leaf(2, "Stmt", "B"));

    let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0)), (NodeId(1), NodeId(1)), (NodeId(2), NodeId(2)), (NodeId(3), NodeId(3))]);
    let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();

    let moves: Vec<_> = result.script.iter().filter(|e| e.action == Action::Move).collect();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].node_id, NodeId(3));
    assert!(result.script.iter().all(|e| e.action != Action::Delete && e.action != Action::Insert));
}

/// S3 - key swap: source `a / b`, dest `b / a`.
#[test]
fn key_swap_resolves_via_displacement() {
    let mut source = Tree::new(NodeData::new(NodeId(0), "BinOp", "/").with_fields(["left", "right"]));
    let s_root = source.root_id();
    source.add_child_at_key(s_root, leaf(1, "Name", "a"), "left");
    source.add_child_at_key(s_root, leaf(2, "Name", "b"), "right");

    let mut dest = Tree::new(NodeData::new(NodeId(0), "BinOp", "/").with_fields(["left", "right"]));
    let d_root = dest.root_id();
    dest.add_child_at_key(d_root, leaf(2, "Name", "b"), "left");
    dest.add_child_at_key(d_root, leaf(1, "Name", "a"), "right");

    let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0)), (NodeId(1), NodeId(1)), (NodeId(2), NodeId(2))]);
    let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();

    // Fidelity: reapplying structural mutation already happened inside the
    // generator's own working copy; the public contract we can assert on is
    // that it produced a script and didn't fail verification.
    assert!(result.script.iter().any(|e| e.action == Action::Move));
    assert!(result.script.iter().all(|e| e.action != Action::Insert && e.action != Action::Delete));
}

/// S4 - pure insertion: source `pass`, dest `x = 0`.
#[test]
fn pure_insertion_creates_leaves_breadth_first() {
    let source = Tree::new(NodeData::new(NodeId(0), "Module", "m").with_fields(["body"]));
    let mut dest = Tree::new(NodeData::new(NodeId(0), "Module", "m").with_fields(["body"]));
    let d_root = dest.root_id();
    let assign = dest.add_child_at_key(d_root, NodeData::new(NodeId(1), "Assign", "=").with_fields(["target", "value"]), "body");
    dest.add_child_at_key(assign, leaf(2, "Name", "x"), "target");
    dest.add_child_at_key(assign, leaf(3, "Num", "0"), "value");

    let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0))]);
    let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();

    assert!(result.script.iter().all(|e| e.action != Action::Delete));
    assert_eq!(result.script.iter().filter(|e| e.action == Action::Insert).count(), 3);
    assert!(result.donors.contains_key(&NodeId(1)));
    assert!(result.donors.contains_key(&NodeId(2)));
    assert!(result.donors.contains_key(&NodeId(3)));
}

/// S5 - parent-kind change: a node's kind changes and a child slot that was
/// valid under the old kind is no longer valid under the new one.
#[test]
fn parent_kind_change_flags_cleanup() {
    let mut source = Tree::new(NodeData::new(NodeId(0), "While", "while").with_fields(["test", "body", "orelse"]));
    let s_root = source.root_id();
    source.add_child_at_key(s_root, leaf(1, "Name", "c"), "test");
    source.add_child_at_key(s_root, leaf(2, "Stmt", "body"), "body");
    source.add_child_at_key(s_root, leaf(3, "Stmt", "else-body"), "orelse");

    let mut dest = Tree::new(NodeData::new(NodeId(0), "If", "if").with_fields(["test", "body"]));
    let d_root = dest.root_id();
    dest.add_child_at_key(d_root, leaf(1, "Name", "c"), "test");
    dest.add_child_at_key(d_root, leaf(2, "Stmt", "body"), "body");

    let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0)), (NodeId(1), NodeId(1)), (NodeId(2), NodeId(2))]);
    let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();

    assert!(result.script.iter().any(|e| e.action == Action::Update && e.node_id == NodeId(0)));
    // node 3 ("orelse") is unmapped and must be deleted as a leaf.
    assert!(result.script.iter().any(|e| e.action == Action::Delete && e.node_id == NodeId(3)));
}

/// Every produced script is non-decreasing in stage order, regardless of
/// which scenario produced it (testable property #4).
#[test]
fn every_script_is_stage_monotonic() {
    let mut source = Tree::new(NodeData::new(NodeId(0), "FunctionDef", "f").with_fields(["args", "body"]));
    let s_root = source.root_id();
    source.add_child_at_key(s_root, leaf(1, "arg", "x"), "args");
    source.add_child_at_key(s_root, leaf(2, "Name", "x"), "body");

    let mut dest = Tree::new(NodeData::new(NodeId(0), "FunctionDef", "f").with_fields(["args", "body"]));
    let d_root = dest.root_id();
    dest.add_child_at_key(d_root, leaf(1, "arg", "y"), "args");
    dest.add_child_at_key(d_root, leaf(10, "Name", "y"), "body");

    let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0)), (NodeId(1), NodeId(1))]);
    let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();
    assert!(result.script.is_stage_monotonic());
}

/// S6 - runtime deviation: a candidate that computes the wrong value but
/// otherwise runs to completion reports a deviation point before the end
/// of the trace, and comparing it to itself reports no change.
#[test]
fn runtime_comparison_reports_deviation_point() {
    let mapping = Mapping::from_pairs([(NodeId(1), NodeId(1))]);
    let source_trace = ExecutionTrace {
        ops: vec![
            TraceOp::new("call", Some(NodeId(1)), vec!["3".to_string()]),
            TraceOp::new("return", None, vec!["4".to_string()]),
        ],
        outcome: RunOutcome::Completed,
        passed: false,
    };
    let dest_trace = ExecutionTrace {
        ops: vec![
            TraceOp::new("call", Some(NodeId(1)), vec!["3".to_string()]),
            TraceOp::new("return", None, vec!["6".to_string()]),
        ],
        outcome: RunOutcome::Completed,
        passed: true,
    };
    let comparison = RuntimeComparison::from_traces("f(3)==6", source_trace, dest_trace, &mapping);

    assert!(comparison.completed());
    assert!(!comparison.passed());
    assert_eq!(comparison.deviation_point(), Some((0, 0)));

    let effect = compare_comparisons(std::slice::from_ref(&comparison), std::slice::from_ref(&comparison));
    assert_eq!(effect, Effect::Same);
}
