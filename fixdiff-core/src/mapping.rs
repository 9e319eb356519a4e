//! The node correspondence between a source and a destination tree.
//!
//! Computing this correspondence is out of scope here — it is the
//! generator's precondition, supplied by an external mapping oracle. This
//! module only holds the resulting partial bijection and the bookkeeping
//! the generator needs to extend it as it synthesises new nodes.

use std::collections::HashMap;

use crate::node::NodeId;

/// A partial bijection between source node ids and destination node ids:
/// each source id corresponds to at most one destination id and vice versa.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    source_to_dest: HashMap<NodeId, NodeId>,
    dest_to_source: HashMap<NodeId, NodeId>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (NodeId, NodeId)>) -> Self {
        let mut mapping = Self::new();
        for (s, d) in pairs {
            mapping.insert(s, d);
        }
        mapping
    }

    /// Record that `source` corresponds to `dest`. The generator calls this
    /// during INSERT to extend the mapping with freshly synthesised nodes.
    pub fn insert(&mut self, source: NodeId, dest: NodeId) {
        self.source_to_dest.insert(source, dest);
        self.dest_to_source.insert(dest, source);
    }

    pub fn dest_of(&self, source: NodeId) -> Option<NodeId> {
        self.source_to_dest.get(&source).copied()
    }

    pub fn source_of(&self, dest: NodeId) -> Option<NodeId> {
        self.dest_to_source.get(&dest).copied()
    }

    pub fn contains_source(&self, source: NodeId) -> bool {
        self.source_to_dest.contains_key(&source)
    }

    pub fn contains_dest(&self, dest: NodeId) -> bool {
        self.dest_to_source.contains_key(&dest)
    }

    pub fn len(&self) -> usize {
        self.source_to_dest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_to_dest.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.source_to_dest.iter().map(|(&s, &d)| (s, d))
    }
}
