//! The tagged edit record emitted by the generator, and the donor set its
//! UPDATE/INSERT edits draw replacement content from.

use std::collections::HashMap;

use crate::error::EditError;
use crate::node::{NodeData, NodeId, Tree};

/// What an edit does to the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Update,
    Insert,
    Move,
    Delete,
}

/// The generation phase an edit was produced in. Ordering here is the
/// generator's stage order and the order `EditScript::is_stage_monotonic`
/// checks against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Update,
    AlignKeys,
    Align,
    Insert,
    Move,
    Delete,
}

pub const STAGE_ORDER: [Stage; 6] = [
    Stage::Update,
    Stage::AlignKeys,
    Stage::Align,
    Stage::Insert,
    Stage::Move,
    Stage::Delete,
];

/// Positional metadata for a keyed-parent placement.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct KeyedPlacement {
    pub key_in_parent: String,
    /// Set when the node being placed currently carries a sentinel key
    /// that this edit resolves.
    pub fix_temp_key: Option<TempKeyFix>,
    /// Set when the intended key is not a valid field of the (possibly
    /// newly updated) parent kind.
    pub is_cleanup_after_node_type_change: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TempKeyFix {
    pub orig_key: String,
    pub displaced_by_id: NodeId,
}

/// Positional metadata for a list-parent placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ListPlacement {
    pub before: Option<NodeId>,
    pub after: Option<NodeId>,
}

/// Where (if anywhere) a MOVE/INSERT edit places its subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Keyed(KeyedPlacement),
    List(ListPlacement),
}

/// Variable-rename annotation, informational only (never load-bearing for
/// tree-transform correctness, per the rename-symmetry testable property).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RenameInfo {
    pub old_name: String,
    pub new_name: String,
}

/// One entry of the edit script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub action: Action,
    pub stage: Stage,
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    /// For UPDATE: the donor id whose payload was adopted.
    pub new_node_id: Option<NodeId>,
    pub placement: Option<Placement>,
    pub rename: Option<RenameInfo>,
}

impl Edit {
    pub fn update(node_id: NodeId, new_node_id: NodeId) -> Self {
        Self {
            action: Action::Update,
            stage: Stage::Update,
            node_id,
            parent_id: None,
            new_node_id: Some(new_node_id),
            placement: None,
            rename: None,
        }
    }

    pub fn with_rename(mut self, rename: RenameInfo) -> Self {
        self.rename = Some(rename);
        self
    }

    pub fn structural(
        action: Action,
        stage: Stage,
        node_id: NodeId,
        parent_id: NodeId,
        placement: Placement,
    ) -> Self {
        Self {
            action,
            stage,
            node_id,
            parent_id: Some(parent_id),
            new_node_id: None,
            placement: Some(placement),
            rename: None,
        }
    }

    /// A compact, stable label used by consumers that need to identify an
    /// edit (e.g. to filter a script down to a subset) without depending on
    /// its full structure.
    pub fn short_string(&self) -> String {
        format!("{:?}:{:?}:{}", self.action, self.stage, self.node_id.0)
    }

    /// Apply this edit to `tree`, drawing UPDATE/INSERT content from
    /// `donors`. Applying the script as a whole is primarily a consumer
    /// concern, but the generator rehearses each edit as it emits it (§5),
    /// so the mutation logic lives here rather than being duplicated by
    /// every consumer. Donor lookup is always canonical: UPDATE and INSERT
    /// never read the destination tree directly.
    pub fn apply(&self, tree: &mut Tree, donors: &DonorSet) -> Result<(), EditError> {
        match self.action {
            Action::Update => {
                let donor_id = self.new_node_id.ok_or_else(|| EditError::MappingInconsistency {
                    node: self.node_id,
                    detail: "UPDATE edit missing new_node_id".to_string(),
                })?;
                let donor = donors.get(&donor_id).ok_or_else(|| EditError::MappingInconsistency {
                    node: self.node_id,
                    detail: "donor not found for UPDATE".to_string(),
                })?;
                tree.update(self.node_id, donor);
                Ok(())
            }
            Action::Insert => {
                let donor = donors.get(&self.node_id).ok_or_else(|| EditError::MappingInconsistency {
                    node: self.node_id,
                    detail: "donor not found for INSERT".to_string(),
                })?;
                tree.create_detached(donor.clone());
                self.place(tree)
            }
            Action::Move => self.place(tree),
            Action::Delete => {
                if !tree.is_leaf(self.node_id) {
                    return Err(EditError::ForbiddenEdit {
                        node: self.node_id,
                        action: "delete",
                    });
                }
                tree.remove_child(self.node_id);
                Ok(())
            }
        }
    }

    fn place(&self, tree: &mut Tree) -> Result<(), EditError> {
        let parent_id = self.parent_id.ok_or_else(|| EditError::MappingInconsistency {
            node: self.node_id,
            detail: "structural edit missing parent_id".to_string(),
        })?;
        match &self.placement {
            Some(Placement::Keyed(k)) => {
                tree.reslot_at_key(parent_id, self.node_id, &k.key_in_parent);
                Ok(())
            }
            Some(Placement::List(l)) => {
                tree.add_child_between(parent_id, l.before, l.after, self.node_id);
                Ok(())
            }
            None => Err(EditError::MappingInconsistency {
                node: self.node_id,
                detail: "structural edit missing placement".to_string(),
            }),
        }
    }
}

/// Shallow dest-tree node clones (no children), keyed by dest node id, that
/// consumers use to materialize UPDATE and INSERT content.
pub type DonorSet = HashMap<NodeId, NodeData>;

/// The full ordered edit script plus the donor set and rename map produced
/// alongside it.
#[derive(Clone, Debug, Default)]
pub struct EditScript {
    pub edits: Vec<Edit>,
}

impl EditScript {
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The "edit distance" to the reference: simply the script length. No
    /// minimality is implied or attempted (the generator is greedy per
    /// stage, not globally optimal).
    pub fn edit_distance(&self) -> usize {
        self.edits.len()
    }

    /// True iff stage labels are non-decreasing in `STAGE_ORDER`.
    pub fn is_stage_monotonic(&self) -> bool {
        self.edits.windows(2).all(|w| w[0].stage <= w[1].stage)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edit> {
        self.edits.iter()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a Edit;
    type IntoIter = std::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    #[test]
    fn apply_update_reads_from_donor_set_not_a_live_tree() {
        let mut tree = Tree::new(NodeData::new(NodeId(0), "Name", "x"));
        let mut donors = DonorSet::new();
        donors.insert(NodeId(1), NodeData::new(NodeId(1), "Name", "y"));

        Edit::update(NodeId(0), NodeId(1)).apply(&mut tree, &donors).unwrap();
        assert_eq!(tree.get(NodeId(0)).unwrap().name, "y");
    }

    #[test]
    fn apply_delete_rejects_non_leaf() {
        let mut tree = Tree::new(NodeData::new(NodeId(0), "Module", "m").with_fields(["body"]));
        let root = tree.root_id();
        tree.add_child_at_key(root, NodeData::new(NodeId(1), "Stmt", "s"), "body");
        let donors = DonorSet::new();

        let delete_root = Edit {
            action: Action::Delete,
            stage: Stage::Delete,
            node_id: root,
            parent_id: None,
            new_node_id: None,
            placement: None,
            rename: None,
        };
        assert!(matches!(delete_root.apply(&mut tree, &donors), Err(EditError::ForbiddenEdit { .. })));
    }

    #[test]
    fn apply_insert_places_a_leaf_into_a_keyed_slot() {
        let mut tree = Tree::new(NodeData::new(NodeId(0), "Module", "m").with_fields(["body"]));
        let root = tree.root_id();
        let mut donors = DonorSet::new();
        donors.insert(NodeId(1), NodeData::new(NodeId(1), "Stmt", "pass"));

        let insert = Edit::structural(
            Action::Insert,
            Stage::Insert,
            NodeId(1),
            root,
            Placement::Keyed(KeyedPlacement {
                key_in_parent: "body".to_string(),
                fix_temp_key: None,
                is_cleanup_after_node_type_change: false,
            }),
        );
        insert.apply(&mut tree, &donors).unwrap();
        assert_eq!(tree.named_child(root, "body"), Some(NodeId(1)));
    }
}
