//! The mutable tree model: stable node identity, keyed/list child slots, and
//! the tree mutation primitives the edit-script generator rehearses edits
//! against.

use std::collections::HashMap;
use std::fmt;

use indextree::Arena;

/// Stable node identity, independent of its position in the backing arena.
///
/// Arena positions are not safe to reuse as identity: the generator detaches
/// and reattaches nodes on a private working copy, and the INSERT phase
/// reuses a destination node's id for the freshly created source node. A
/// side index (`Tree::index`) maps an id to its current arena position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a node is addressed within its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// A valid named slot on a keyed parent (e.g. `"test"`, `"body"`).
    Named(String),
    /// A sentinel slot: this node has been displaced out of `original` to
    /// make room for the node identified by `by`, which now occupies it.
    Displaced { original: String, by: NodeId },
    /// A list parent's child; position is implied by sibling order and is
    /// never stored redundantly here.
    Ordinal,
    /// The tree root has no parent slot.
    Root,
}

impl Slot {
    /// The valid-field name this slot resolves to, if any (sentinel slots
    /// resolve to their pre-displacement name for invariant-checking).
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Slot::Named(k) => Some(k),
            Slot::Displaced { original, .. } => Some(original),
            Slot::Ordinal | Slot::Root => None,
        }
    }

    pub fn is_displaced(&self) -> bool {
        matches!(self, Slot::Displaced { .. })
    }
}

/// One node's payload, independent of its position in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeData {
    pub id: NodeId,
    pub kind: String,
    /// Printable short form; two corresponded nodes are "the same value"
    /// iff `name` is equal. A `kind` change always implies a `name` change.
    pub name: String,
    pub is_list: bool,
    /// Legal named-slot keys for this `kind`. Empty for list nodes.
    pub fields: Vec<String>,
}

impl NodeData {
    pub fn new(id: NodeId, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            name: name.into(),
            is_list: false,
            fields: Vec::new(),
        }
    }

    pub fn list(id: NodeId, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            name: name.into(),
            is_list: true,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f == key)
    }
}

struct Entry {
    data: NodeData,
    slot: Slot,
}

/// A mutable tree with stable node identities, keyed or list-valued child
/// slots, and the primitive mutations the generator needs.
pub struct Tree {
    arena: Arena<Entry>,
    root: indextree::NodeId,
    index: HashMap<NodeId, indextree::NodeId>,
}

impl Tree {
    /// Build a tree containing only `root_data`.
    pub fn new(root_data: NodeData) -> Self {
        let mut arena = Arena::new();
        let id = root_data.id;
        let root = arena.new_node(Entry {
            data: root_data,
            slot: Slot::Root,
        });
        let mut index = HashMap::new();
        index.insert(id, root);
        Self { arena, root, index }
    }

    pub fn root_id(&self) -> NodeId {
        self.arena[self.root].get().data.id
    }

    fn pos(&self, id: NodeId) -> Option<indextree::NodeId> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        let pos = self.pos(id)?;
        Some(&self.arena[pos].get().data)
    }

    pub fn slot(&self, id: NodeId) -> Option<&Slot> {
        let pos = self.pos(id)?;
        Some(&self.arena[pos].get().slot)
    }

    pub fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        let pos = self.pos(id)?;
        let parent = self.arena[pos].parent()?;
        Some(self.arena[parent].get().data.id)
    }

    /// Children in slot/sibling order.
    pub fn children_ids(&self, id: NodeId) -> Vec<NodeId> {
        let Some(pos) = self.pos(id) else {
            return Vec::new();
        };
        pos.children(&self.arena)
            .map(|c| self.arena[c].get().data.id)
            .collect()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children_ids(id).len()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.child_count(id) == 0
    }

    /// Insert a brand-new node (not yet present in this tree) as a child of
    /// `parent` at ordinal position, without going through a named slot.
    /// Used by builders and by the INSERT phase when `parent` is a list.
    pub fn push_list_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let parent_pos = self.pos(parent).expect("parent must exist");
        let id = data.id;
        let pos = self.arena.new_node(Entry {
            data,
            slot: Slot::Ordinal,
        });
        parent_pos.append(pos, &mut self.arena);
        self.index.insert(id, pos);
        id
    }

    /// Insert a brand-new node into a named slot of `parent`. If the slot is
    /// already occupied, the occupant is displaced into a sentinel slot
    /// naming `key` as its `original` and `data.id` as `by`. Displacement is
    /// at most one deep: displacing an already-displaced node is a caller
    /// error the algorithm never triggers, since a slot can hold only one
    /// occupant at a time.
    pub fn add_child_at_key(&mut self, parent: NodeId, data: NodeData, key: &str) -> NodeId {
        let id = self.create_detached(data);
        self.reslot_at_key(parent, id, key);
        id
    }

    /// Create a brand-new node not yet attached to any parent.
    pub fn create_detached(&mut self, data: NodeData) -> NodeId {
        let id = data.id;
        let pos = self.arena.new_node(Entry {
            data,
            slot: Slot::Ordinal,
        });
        self.index.insert(id, pos);
        id
    }

    /// Attach node `c` (new or previously detached via `remove_child`) into
    /// named slot `key` of `parent`, displacing any current occupant the
    /// same way `add_child_at_key` does.
    pub fn reslot_at_key(&mut self, parent: NodeId, c: NodeId, key: &str) {
        let parent_pos = self.pos(parent).expect("parent must exist");
        if let Some(occupant) = self.named_child(parent, key) {
            if occupant != c {
                let occupant_pos = self.pos(occupant).unwrap();
                self.arena[occupant_pos].get_mut().slot = Slot::Displaced {
                    original: key.to_string(),
                    by: c,
                };
            }
        }
        let c_pos = self.pos(c).expect("node must exist");
        c_pos.detach(&mut self.arena);
        parent_pos.append(c_pos, &mut self.arena);
        self.arena[c_pos].get_mut().slot = Slot::Named(key.to_string());
    }

    /// Find the current occupant of a named slot under `parent`, if any
    /// (sentinel/displaced children never match).
    pub fn named_child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        let parent_pos = self.pos(parent)?;
        parent_pos.children(&self.arena).find_map(|c| {
            let entry = self.arena[c].get();
            match &entry.slot {
                Slot::Named(k) if k == key => Some(entry.data.id),
                _ => None,
            }
        })
    }

    /// Detach `c` from its current parent. For list parents siblings shift
    /// implicitly (ordinal position is derived from order, never stored).
    pub fn remove_child(&mut self, c: NodeId) {
        let pos = self.pos(c).expect("node must exist");
        pos.detach(&mut self.arena);
    }

    /// Reinsert a detached (or newly created) node `c` into list parent
    /// `parent`, positioned using `before`/`after` neighbour references. If
    /// a reference is not actually a child of `parent`, it is ignored and
    /// insertion falls back to a deterministic end: the tail if `before`
    /// was given, otherwise the head.
    pub fn add_child_between(
        &mut self,
        parent: NodeId,
        before: Option<NodeId>,
        after: Option<NodeId>,
        c: NodeId,
    ) {
        let parent_pos = self.pos(parent).expect("parent must exist");
        let c_pos = self.pos(c).expect("node must exist");
        c_pos.detach(&mut self.arena);
        self.arena[c_pos].get_mut().slot = Slot::Ordinal;

        let valid_before = before.and_then(|b| self.pos(b)).filter(|&b| {
            self.arena[b].parent() == Some(parent_pos)
        });
        let valid_after = after.and_then(|a| self.pos(a)).filter(|&a| {
            self.arena[a].parent() == Some(parent_pos)
        });

        if let Some(after_pos) = valid_after {
            after_pos.insert_before(c_pos, &mut self.arena);
        } else if let Some(before_pos) = valid_before {
            before_pos.insert_after(c_pos, &mut self.arena);
        } else if before.is_some() {
            parent_pos.append(c_pos, &mut self.arena);
        } else {
            match parent_pos.children(&self.arena).next() {
                Some(first) => first.insert_before(c_pos, &mut self.arena),
                None => parent_pos.append(c_pos, &mut self.arena),
            }
        }
    }

    /// Immediate predecessor/successor of `c` among `parent`'s children.
    pub fn get_child_neighbors(&self, parent: NodeId, c: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        let children = self.children_ids(parent);
        let Some(idx) = children.iter().position(|&x| x == c) else {
            return (None, None);
        };
        let before = if idx > 0 { Some(children[idx - 1]) } else { None };
        let after = children.get(idx + 1).copied();
        (before, after)
    }

    /// Adopt `other`'s kind/name/fields, keeping `s`'s id and children.
    pub fn update(&mut self, s: NodeId, other: &NodeData) {
        let pos = self.pos(s).expect("node must exist");
        let entry = self.arena[pos].get_mut();
        entry.data.kind = other.kind.clone();
        entry.data.name = other.name.clone();
        entry.data.is_list = other.is_list;
        entry.data.fields = other.fields.clone();
    }

    /// Post-order list of all node ids, materialised eagerly so callers can
    /// safely mutate the tree while iterating over the snapshot.
    pub fn postorder_ids(&self) -> Vec<NodeId> {
        // indextree's `descendants` is pre-order; build post-order by hand.
        fn walk(tree: &Tree, id: indextree::NodeId, out: &mut Vec<NodeId>) {
            for child in id.children(&tree.arena) {
                walk(tree, child, out);
            }
            out.push(tree.arena[id].get().data.id);
        }
        let mut out = Vec::new();
        walk(self, self.root, &mut out);
        out
    }

    /// Breadth-first list of all node ids (root first).
    pub fn breadth_first_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(self.root);
        while let Some(pos) = queue.pop_front() {
            out.push(self.arena[pos].get().data.id);
            for child in pos.children(&self.arena) {
                queue.push_back(child);
            }
        }
        out
    }

    /// Depth-first (pre-order) list of all node ids.
    pub fn depth_first_ids(&self) -> Vec<NodeId> {
        self.root
            .descendants(&self.arena)
            .map(|pos| self.arena[pos].get().data.id)
            .collect()
    }

    /// Deep-clone the whole tree, preserving every node id.
    pub fn deep_clone(&self) -> Tree {
        let mut arena = Arena::new();
        let mut index = HashMap::new();

        fn clone_subtree(
            src: &Tree,
            src_pos: indextree::NodeId,
            dst_arena: &mut Arena<Entry>,
            dst_index: &mut HashMap<NodeId, indextree::NodeId>,
        ) -> indextree::NodeId {
            let entry = src.arena[src_pos].get();
            let new_pos = dst_arena.new_node(Entry {
                data: entry.data.clone(),
                slot: entry.slot.clone(),
            });
            dst_index.insert(entry.data.id, new_pos);
            for child in src_pos.children(&src.arena) {
                let child_pos = clone_subtree(src, child, dst_arena, dst_index);
                new_pos.append(child_pos, dst_arena);
            }
            new_pos
        }

        let root = clone_subtree(self, self.root, &mut arena, &mut index);
        Tree { arena, root, index }
    }

    /// A deterministic printable form used for the final fidelity check and
    /// for diagnostics/snapshots. Not meant to round-trip back into a tree.
    pub fn to_printable_string(&self) -> String {
        fn render(tree: &Tree, pos: indextree::NodeId, out: &mut String, depth: usize) {
            let entry = tree.arena[pos].get();
            out.push_str(&"  ".repeat(depth));
            out.push('(');
            out.push_str(&entry.data.kind);
            out.push(' ');
            out.push_str(&entry.data.name);
            out.push(')');
            out.push('\n');
            for child in pos.children(&tree.arena) {
                render(tree, child, out, depth + 1);
            }
        }
        let mut out = String::new();
        render(self, self.root, &mut out, 0);
        out
    }
}
