//! The mapping-driven edit-script generator: UPDATE, ALIGN_KEYS, ALIGN,
//! INSERT, MOVE, DELETE, in that order, followed by a fidelity check.

use std::collections::HashMap;

use fixdiff_core::edit::{Action, Edit, EditScript, KeyedPlacement, ListPlacement, Placement, RenameInfo, Stage, TempKeyFix};
use fixdiff_core::{DonorSet, EditError, Mapping, NodeData, NodeId, Slot, Tree};

use crate::{debug, trace};

/// Tunables for the generator. Kinds are opaque strings by design (the
/// tree model is deliberately not tied to one source grammar), so the
/// variable-rename heuristic is parameterised by which kinds act as
/// binding occurrences (unconditional overwrite of the rename map, e.g. a
/// formal parameter) versus referencing occurrences (first-occurrence-wins,
/// e.g. a name expression).
#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub binder_kinds: Vec<String>,
    pub reference_kinds: Vec<String>,
    /// Include a full before/after tree dump in a post-condition failure.
    /// Turning this off keeps error messages short in batch repair-search
    /// loops that expect many candidates to fail.
    pub collect_diagnostic_on_failure: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            binder_kinds: vec!["arg".to_string()],
            reference_kinds: vec!["Name".to_string()],
            collect_diagnostic_on_failure: true,
        }
    }
}

/// The result of a successful generation.
pub struct GeneratedScript {
    pub script: EditScript,
    pub donors: DonorSet,
    pub renames_source_to_dest: HashMap<String, String>,
}

/// Generate the ordered edit script transforming `source` into `dest`,
/// given a node correspondence `mapping`. Operates on private deep clones
/// of both trees and the mapping; the caller's inputs are never mutated.
pub fn generate_edit_script(
    source: &Tree,
    dest: &Tree,
    mapping: &Mapping,
    options: &GeneratorOptions,
) -> Result<GeneratedScript, EditError> {
    let mut src = source.deep_clone();
    let dest = dest.deep_clone();
    let mut mapping = mapping.clone();

    let mut donors: DonorSet = DonorSet::new();
    let mut script = EditScript::default();
    let mut rename_s_to_d: HashMap<String, String> = HashMap::new();
    let mut rename_d_to_s: HashMap<String, String> = HashMap::new();

    update_phase(
        &mut src,
        &dest,
        &mapping,
        options,
        &mut donors,
        &mut script,
        &mut rename_s_to_d,
        &mut rename_d_to_s,
    );

    align_keys_phase(&mut src, &dest, &mapping, &mut script);

    align_phase(&mut src, &dest, &mapping, &mut script);

    insert_phase(
        &mut src,
        &dest,
        &mut mapping,
        options,
        &mut donors,
        &mut script,
        &rename_d_to_s,
    )?;

    move_phase(&mut src, &dest, &mapping, &mut script)?;

    delete_phase(&mut src, &mapping, &mut script)?;

    verify(&src, &dest, options)?;

    Ok(GeneratedScript {
        script,
        donors,
        renames_source_to_dest: rename_s_to_d,
    })
}

/// UPDATE stage over every mapped node. A full pass by itself, not
/// interleaved with ALIGN_KEYS/ALIGN: a list node's children must have
/// already taken their final name/kind before that list is reordered,
/// otherwise a child's own UPDATE could be emitted after the ALIGN edit
/// that moves it, breaking stage monotonicity.
#[allow(clippy::too_many_arguments)]
fn update_phase(
    src: &mut Tree,
    dest: &Tree,
    mapping: &Mapping,
    options: &GeneratorOptions,
    donors: &mut DonorSet,
    script: &mut EditScript,
    rename_s_to_d: &mut HashMap<String, String>,
    rename_d_to_s: &mut HashMap<String, String>,
) {
    for s_id in src.depth_first_ids() {
        let Some(d_id) = mapping.dest_of(s_id) else {
            continue;
        };
        if !dest.contains(d_id) {
            continue;
        }
        update_one(src, dest, s_id, d_id, options, donors, script, rename_s_to_d, rename_d_to_s);
    }
}

/// ALIGN_KEYS stage over every mapped node, run after all UPDATEs.
fn align_keys_phase(src: &mut Tree, dest: &Tree, mapping: &Mapping, script: &mut EditScript) {
    for s_id in src.depth_first_ids() {
        let Some(d_id) = mapping.dest_of(s_id) else {
            continue;
        };
        if !dest.contains(d_id) {
            continue;
        }
        align_keys_one(src, dest, mapping, s_id, d_id, script);
    }
}

/// ALIGN stage over every mapped list node, run after ALIGN_KEYS so a list
/// parent reorders using each child's final (post-update) kind and slot.
fn align_phase(src: &mut Tree, dest: &Tree, mapping: &Mapping, script: &mut EditScript) {
    for s_id in src.depth_first_ids() {
        let Some(d_id) = mapping.dest_of(s_id) else {
            continue;
        };
        if !dest.contains(d_id) {
            continue;
        }
        if src.get(s_id).map(|n| n.is_list).unwrap_or(false) {
            align_children(src, dest, mapping, s_id, d_id, script);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn update_one(
    src: &mut Tree,
    dest: &Tree,
    s_id: NodeId,
    d_id: NodeId,
    options: &GeneratorOptions,
    donors: &mut DonorSet,
    script: &mut EditScript,
    rename_s_to_d: &mut HashMap<String, String>,
    rename_d_to_s: &mut HashMap<String, String>,
) {
    let s_data = src.get(s_id).expect("walked id must exist").clone();
    let d_data = dest.get(d_id).expect("checked above").clone();
    if s_data.name == d_data.name {
        return;
    }

    trace!("UPDATE {s_id} -> {d_id}");
    donors.insert(d_id, d_data.clone());
    let rename = detect_update_rename(&s_data, &d_data, options, rename_s_to_d, rename_d_to_s);
    src.update(s_id, &d_data);
    let mut edit = Edit::update(s_id, d_id);
    if let Some(rename) = rename {
        edit = edit.with_rename(rename);
    }
    script.push(edit);
}

/// First-store-wins for referencing occurrences, unconditional overwrite
/// for binding occurrences. See `GeneratorOptions` for why kinds, not a
/// hardcoded AST-context flag, drive this.
fn detect_update_rename(
    s_data: &NodeData,
    d_data: &NodeData,
    options: &GeneratorOptions,
    rename_s_to_d: &mut HashMap<String, String>,
    rename_d_to_s: &mut HashMap<String, String>,
) -> Option<RenameInfo> {
    let is_binder = options.binder_kinds.iter().any(|k| k == &s_data.kind);
    let is_reference = options.reference_kinds.iter().any(|k| k == &s_data.kind);
    if !is_binder && !is_reference {
        return None;
    }
    if is_binder || !rename_s_to_d.contains_key(&s_data.name) {
        rename_s_to_d.insert(s_data.name.clone(), d_data.name.clone());
        rename_d_to_s.insert(d_data.name.clone(), s_data.name.clone());
    }
    Some(RenameInfo {
        old_name: s_data.name.clone(),
        new_name: d_data.name.clone(),
    })
}

fn detect_insert_rename(
    d_data: &NodeData,
    options: &GeneratorOptions,
    rename_d_to_s: &HashMap<String, String>,
) -> Option<RenameInfo> {
    if !options.reference_kinds.iter().any(|k| k == &d_data.kind) {
        return None;
    }
    rename_d_to_s.get(&d_data.name).map(|old| RenameInfo {
        old_name: old.clone(),
        new_name: d_data.name.clone(),
    })
}

fn align_keys_one(src: &mut Tree, dest: &Tree, mapping: &Mapping, s_id: NodeId, d_id: NodeId, script: &mut EditScript) {
    let Some(s_parent) = src.parent_id(s_id) else {
        return;
    };
    let Some(d_parent) = dest.parent_id(d_id) else {
        return;
    };
    if mapping.dest_of(s_parent) != Some(d_parent) {
        return;
    }
    if dest.get(d_parent).map(|p| p.is_list).unwrap_or(true) {
        return;
    }
    let Some(Slot::Named(d_key)) = dest.slot(d_id).cloned() else {
        return;
    };
    let current_key = match src.slot(s_id) {
        Some(Slot::Named(k)) => Some(k.clone()),
        Some(Slot::Displaced { original, .. }) => Some(original.clone()),
        _ => None,
    };
    if current_key.as_deref() == Some(d_key.as_str()) {
        return;
    }

    trace!("ALIGN_KEYS {s_id} -> key {d_key}");
    let fix_temp_key = match src.slot(s_id) {
        Some(Slot::Displaced { original, by }) => Some(TempKeyFix {
            orig_key: original.clone(),
            displaced_by_id: *by,
        }),
        _ => None,
    };
    src.reslot_at_key(s_parent, s_id, &d_key);
    let is_cleanup_after_node_type_change = !src.get(s_parent).map(|p| p.has_field(&d_key)).unwrap_or(true);
    script.push(Edit::structural(
        Action::Move,
        Stage::AlignKeys,
        s_id,
        s_parent,
        Placement::Keyed(KeyedPlacement {
            key_in_parent: d_key,
            fix_temp_key,
            is_cleanup_after_node_type_change,
        }),
    ));
}

/// Reorder the mapped children of list node `s_id` to match the order of
/// their correspondents under `d_id`, leaving already-aligned children
/// (the longest common subsequence between current and target order)
/// untouched.
fn align_children(src: &mut Tree, dest: &Tree, mapping: &Mapping, s_id: NodeId, d_id: NodeId, script: &mut EditScript) {
    let pairs: Vec<(NodeId, NodeId)> = src
        .children_ids(s_id)
        .into_iter()
        .filter_map(|c| {
            let d_c = mapping.dest_of(c)?;
            (dest.parent_id(d_c) == Some(d_id)).then_some((c, d_c))
        })
        .collect();

    let current_order: Vec<NodeId> = pairs.iter().map(|&(c, _)| c).collect();
    let target_order: Vec<NodeId> = dest
        .children_ids(d_id)
        .into_iter()
        .filter_map(|d_c| pairs.iter().find(|&&(_, dc)| dc == d_c).map(|&(c, _)| c))
        .collect();

    let matched = fixdiff_core::sequences::lcs_indices(&current_order, &target_order);
    let aligned: std::collections::HashSet<usize> = matched.iter().map(|&(_, b)| b).collect();

    for (i, &node) in target_order.iter().enumerate() {
        if aligned.contains(&i) {
            continue;
        }
        let before = if i > 0 { Some(target_order[i - 1]) } else { None };
        let after = target_order.get(i + 1).copied();
        trace!("ALIGN move {node} before={before:?} after={after:?}");
        src.add_child_between(s_id, before, after, node);
        script.push(Edit::structural(
            Action::Move,
            Stage::Align,
            node,
            s_id,
            Placement::List(ListPlacement { before, after }),
        ));
    }
}

/// Place `node_id` (already present in `src`, possibly freshly created and
/// detached) at the position its correspondent `d_id` occupies in `dest`,
/// mirroring dest's parent/slot or dest's list neighbourhood back through
/// `mapping`. Used by INSERT and MOVE, which — unlike ALIGN_KEYS/ALIGN —
/// may need to locate an entirely different parent.
fn place_via_dest_mirror(
    src: &mut Tree,
    dest: &Tree,
    mapping: &Mapping,
    node_id: NodeId,
    d_id: NodeId,
) -> Result<(NodeId, Placement), EditError> {
    let d_parent = dest.parent_id(d_id).ok_or_else(|| EditError::MappingInconsistency {
        node: node_id,
        detail: "destination node has no parent".to_string(),
    })?;
    let s_parent = mapping.source_of(d_parent).ok_or_else(|| EditError::MappingInconsistency {
        node: node_id,
        detail: "destination parent is not yet mapped".to_string(),
    })?;

    let temp_key_fix = match src.slot(node_id) {
        Some(Slot::Displaced { original, by }) => Some(TempKeyFix {
            orig_key: original.clone(),
            displaced_by_id: *by,
        }),
        _ => None,
    };

    let parent_is_list = src.get(s_parent).map(|p| p.is_list).unwrap_or(false);

    if parent_is_list {
        let valid_source_sibling = |d_sib: NodeId| -> Option<NodeId> {
            let s_sib = mapping.source_of(d_sib)?;
            (src.parent_id(s_sib) == Some(s_parent)).then_some(s_sib)
        };

        let (mut before_cursor, mut after_cursor) = dest.get_child_neighbors(d_parent, d_id);
        let mut before = None;
        while let Some(d_sib) = before_cursor {
            if let Some(s_sib) = valid_source_sibling(d_sib) {
                before = Some(s_sib);
                break;
            }
            before_cursor = dest.get_child_neighbors(d_parent, d_sib).0;
        }
        let mut after = None;
        while let Some(d_sib) = after_cursor {
            if let Some(s_sib) = valid_source_sibling(d_sib) {
                after = Some(s_sib);
                break;
            }
            after_cursor = dest.get_child_neighbors(d_parent, d_sib).1;
        }

        src.add_child_between(s_parent, before, after, node_id);
        Ok((s_parent, Placement::List(ListPlacement { before, after })))
    } else {
        let key = match dest.slot(d_id) {
            Some(Slot::Named(k)) => k.clone(),
            _ => {
                return Err(EditError::MappingInconsistency {
                    node: node_id,
                    detail: "destination slot is not a named slot".to_string(),
                });
            }
        };
        let is_cleanup_after_node_type_change = !src.get(s_parent).map(|p| p.has_field(&key)).unwrap_or(true);
        src.reslot_at_key(s_parent, node_id, &key);
        Ok((
            s_parent,
            Placement::Keyed(KeyedPlacement {
                key_in_parent: key,
                fix_temp_key: temp_key_fix,
                is_cleanup_after_node_type_change,
            }),
        ))
    }
}

fn insert_phase(
    src: &mut Tree,
    dest: &Tree,
    mapping: &mut Mapping,
    options: &GeneratorOptions,
    donors: &mut DonorSet,
    script: &mut EditScript,
    rename_d_to_s: &HashMap<String, String>,
) -> Result<(), EditError> {
    for d_id in dest.breadth_first_ids() {
        if mapping.contains_dest(d_id) {
            continue;
        }
        let d_data = dest.get(d_id).expect("walked id must exist").clone();
        debug!("INSERT {d_id} ({})", d_data.kind);
        donors.insert(d_id, d_data.clone());
        src.create_detached(d_data.clone());
        mapping.insert(d_id, d_id);

        let (parent_id, placement) = place_via_dest_mirror(src, dest, mapping, d_id, d_id)?;
        let mut edit = Edit::structural(Action::Insert, Stage::Insert, d_id, parent_id, placement);
        if let Some(rename) = detect_insert_rename(&d_data, options, rename_d_to_s) {
            edit = edit.with_rename(rename);
        }
        script.push(edit);
    }
    Ok(())
}

fn move_phase(src: &mut Tree, dest: &Tree, mapping: &Mapping, script: &mut EditScript) -> Result<(), EditError> {
    let root_d = dest.root_id();
    for d_id in dest.breadth_first_ids() {
        if d_id == root_d {
            continue;
        }
        let Some(s_id) = mapping.source_of(d_id) else {
            continue;
        };
        let Some(d_parent) = dest.parent_id(d_id) else {
            continue;
        };
        let Some(s_actual_parent) = src.parent_id(s_id) else {
            continue;
        };
        let Some(s_intended_parent) = mapping.source_of(d_parent) else {
            continue;
        };
        if s_actual_parent == s_intended_parent {
            continue;
        }
        trace!("MOVE {s_id} from {s_actual_parent} to {s_intended_parent}");
        let (parent_id, placement) = place_via_dest_mirror(src, dest, mapping, s_id, d_id)?;
        script.push(Edit::structural(Action::Move, Stage::Move, s_id, parent_id, placement));
    }
    Ok(())
}

fn delete_phase(src: &mut Tree, mapping: &Mapping, script: &mut EditScript) -> Result<(), EditError> {
    let root = src.root_id();
    let postorder = src.postorder_ids();
    for s_id in postorder {
        if s_id == root || mapping.contains_source(s_id) {
            continue;
        }
        if !src.is_leaf(s_id) {
            return Err(EditError::ForbiddenEdit {
                node: s_id,
                action: "delete",
            });
        }
        debug!("DELETE {s_id}");
        let parent_id = src.parent_id(s_id);
        let placement = parent_id.map(|p| {
            if src.get(p).map(|n| n.is_list).unwrap_or(false) {
                Placement::List(ListPlacement::default())
            } else {
                let key_in_parent = match src.slot(s_id) {
                    Some(Slot::Named(k)) => k.clone(),
                    Some(Slot::Displaced { original, .. }) => original.clone(),
                    _ => String::new(),
                };
                let fix_temp_key = match src.slot(s_id) {
                    Some(Slot::Displaced { original, by }) => Some(TempKeyFix {
                        orig_key: original.clone(),
                        displaced_by_id: *by,
                    }),
                    _ => None,
                };
                Placement::Keyed(KeyedPlacement {
                    key_in_parent,
                    fix_temp_key,
                    is_cleanup_after_node_type_change: false,
                })
            }
        });
        src.remove_child(s_id);
        script.push(Edit {
            action: Action::Delete,
            stage: Stage::Delete,
            node_id: s_id,
            parent_id,
            new_node_id: None,
            placement,
            rename: None,
        });
    }
    Ok(())
}

fn verify(src: &Tree, dest: &Tree, options: &GeneratorOptions) -> Result<(), EditError> {
    let src_str = src.to_printable_string();
    let dest_str = dest.to_printable_string();
    if src_str == dest_str {
        return Ok(());
    }
    let diagnostic = if options.collect_diagnostic_on_failure {
        format!("--- source ---\n{src_str}\n--- dest ---\n{dest_str}")
    } else {
        "(diagnostic dump disabled)".to_string()
    };
    Err(EditError::PostConditionFailed { diagnostic })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixdiff_core::NodeData;

    fn leaf(id: u64, kind: &str, name: &str) -> NodeData {
        NodeData::new(NodeId(id), kind, name)
    }

    #[test]
    fn rename_only_emits_two_updates() {
        // def f(x): return x  ->  def f(y): return y
        let mut source = Tree::new(NodeData::new(NodeId(0), "FunctionDef", "f").with_fields(["args", "body"]));
        let s_root = source.root_id();
        source.add_child_at_key(s_root, leaf(1, "arg", "x"), "args");
        source.add_child_at_key(s_root, leaf(2, "Name", "x"), "body");

        let mut dest = Tree::new(NodeData::new(NodeId(0), "FunctionDef", "f").with_fields(["args", "body"]));
        let d_root = dest.root_id();
        dest.add_child_at_key(d_root, leaf(1, "arg", "y"), "args");
        dest.add_child_at_key(d_root, leaf(2, "Name", "y"), "body");

        let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0)), (NodeId(1), NodeId(1)), (NodeId(2), NodeId(2))]);
        let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();

        assert_eq!(result.script.len(), 2);
        assert!(result.script.iter().all(|e| e.action == Action::Update));
        assert_eq!(result.renames_source_to_dest.get("x"), Some(&"y".to_string()));
    }

    #[test]
    fn pure_insertion_has_no_deletes() {
        let source = Tree::new(NodeData::list(NodeId(0), "Body", "body"));
        let mut dest = Tree::new(NodeData::list(NodeId(0), "Body", "body"));
        let d_root = dest.root_id();
        dest.push_list_child(d_root, leaf(1, "Assign", "x = 0"));

        let mapping = Mapping::from_pairs([(NodeId(0), NodeId(0))]);
        let result = generate_edit_script(&source, &dest, &mapping, &GeneratorOptions::default()).unwrap();
        assert!(result.script.iter().all(|e| e.action != Action::Delete));
        assert!(result.script.iter().any(|e| e.action == Action::Insert));
    }
}
