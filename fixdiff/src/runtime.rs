//! Runtime-op alignment: given two executed op traces (each op already
//! attributed to the tree node that produced it), compute a longest-common-
//! subsequence alignment and the "last matching value" cursor used to rank
//! repair candidates.
//!
//! Executing a tree against a test and attributing each op to a node are
//! both external collaborators (`Tracer`, `OpNodeMapper`): this module only
//! aligns the results.

use fixdiff_core::{Mapping, NodeId, Tree};

use crate::trace;

/// How a test run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Raised,
    TimedOut,
}

/// One executed operation, already attributed to the tree node that
/// produced it (or `None` if the external mapper could not attribute it).
#[derive(Clone, Debug)]
pub struct TraceOp {
    pub op_id: String,
    pub node_id: Option<NodeId>,
    pub pushed_values: Vec<String>,
}

impl TraceOp {
    pub fn new(op_id: impl Into<String>, node_id: Option<NodeId>, pushed_values: Vec<String>) -> Self {
        Self {
            op_id: op_id.into(),
            node_id,
            pushed_values,
        }
    }
}

/// A single side's execution result.
#[derive(Clone, Debug)]
pub struct ExecutionTrace {
    pub ops: Vec<TraceOp>,
    pub outcome: RunOutcome,
    pub passed: bool,
}

/// Runs a tree against a test expression and returns its op trace. External
/// collaborator (§6): this crate never executes code.
pub trait Tracer {
    fn run_test(&self, tree: &Tree, test_expression: &str) -> ExecutionTrace;
}

/// Attributes executed ops back to the tree nodes that produced them.
/// External collaborator (§6): this crate has no bytecode model.
pub trait OpNodeMapper {
    fn op_to_node(&self, tree: &Tree, op_id: &str) -> Option<NodeId>;
}

/// Per-op alignment bookkeeping for one side of the comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeOpMappingData {
    pub is_mapped: bool,
    pub mapped_op_index: Option<usize>,
    pub value_matches: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum OpKey {
    /// Both sides' ops are attributed to nodes that correspond to each
    /// other (the dest id is used as the canonical join key).
    Mapped(NodeId),
    UnmappedSource(String),
    UnmappedDest(String),
}

fn source_key(op: &TraceOp, mapping: &Mapping) -> OpKey {
    match op.node_id.and_then(|n| mapping.dest_of(n)) {
        Some(d) => OpKey::Mapped(d),
        None => OpKey::UnmappedSource(op.op_id.clone()),
    }
}

fn dest_key(op: &TraceOp, mapping: &Mapping) -> OpKey {
    match op.node_id.filter(|&n| mapping.contains_dest(n)) {
        Some(d) => OpKey::Mapped(d),
        None => OpKey::UnmappedDest(op.op_id.clone()),
    }
}

/// Compares one candidate ("source") tree's execution against a reference
/// ("dest") tree's execution of the same test.
#[derive(Clone, Debug)]
pub struct RuntimeComparison {
    pub test: String,
    pub source: ExecutionTrace,
    pub dest: ExecutionTrace,
    source_mapping: Vec<RuntimeOpMappingData>,
    dest_mapping: Vec<RuntimeOpMappingData>,
    pub total_match_size: usize,
    last_matching_source_index: Option<usize>,
    last_matching_dest_index: Option<usize>,
}

impl RuntimeComparison {
    /// Build a comparison from two already-executed, already-attributed
    /// traces and the node correspondence between the two trees.
    pub fn from_traces(test: impl Into<String>, source: ExecutionTrace, dest: ExecutionTrace, mapping: &Mapping) -> Self {
        let source_keys: Vec<OpKey> = source.ops.iter().map(|op| source_key(op, mapping)).collect();
        let dest_keys: Vec<OpKey> = dest.ops.iter().map(|op| dest_key(op, mapping)).collect();

        let matched = fixdiff_core::sequences::lcs_indices(&source_keys, &dest_keys);
        trace!("runtime alignment matched {} of {}/{} ops", matched.len(), source.ops.len(), dest.ops.len());

        let mut source_mapping = vec![RuntimeOpMappingData::default(); source.ops.len()];
        let mut dest_mapping = vec![RuntimeOpMappingData::default(); dest.ops.len()];
        let mut last_matching_source_index = None;
        let mut last_matching_dest_index = None;

        for (i, j) in matched.iter().copied() {
            let value_matches = !source.ops[i].pushed_values.is_empty() && source.ops[i].pushed_values == dest.ops[j].pushed_values;
            source_mapping[i] = RuntimeOpMappingData {
                is_mapped: true,
                mapped_op_index: Some(j),
                value_matches,
            };
            dest_mapping[j] = RuntimeOpMappingData {
                is_mapped: true,
                mapped_op_index: Some(i),
                value_matches,
            };
            if value_matches {
                last_matching_source_index = Some(i);
                last_matching_dest_index = Some(j);
            }
        }

        Self {
            test: test.into(),
            total_match_size: matched.len(),
            source,
            dest,
            source_mapping,
            dest_mapping,
            last_matching_source_index,
            last_matching_dest_index,
        }
    }

    /// Convenience constructor that runs both trees via external `Tracer`/
    /// `OpNodeMapper` collaborators, mirroring the pipeline shape used to
    /// rank repair candidates end to end.
    pub fn run(
        tracer: &dyn Tracer,
        mapper: &dyn OpNodeMapper,
        source_tree: &Tree,
        dest_tree: &Tree,
        test: &str,
        mapping: &Mapping,
    ) -> Self {
        let mut source = tracer.run_test(source_tree, test);
        for op in &mut source.ops {
            op.node_id = mapper.op_to_node(source_tree, &op.op_id);
        }
        let mut dest = tracer.run_test(dest_tree, test);
        for op in &mut dest.ops {
            op.node_id = mapper.op_to_node(dest_tree, &op.op_id);
        }
        Self::from_traces(test.to_string(), source, dest, mapping)
    }

    pub fn completed(&self) -> bool {
        self.source.outcome == RunOutcome::Completed
    }

    pub fn passed(&self) -> bool {
        self.source.passed
    }

    /// The furthest-along aligned pair of positions where both sides pushed
    /// the same non-empty value. Everything after it is where the two
    /// executions have diverged computationally.
    pub fn deviation_point(&self) -> Option<(usize, usize)> {
        match (self.last_matching_source_index, self.last_matching_dest_index) {
            (Some(s), Some(d)) => Some((s, d)),
            _ => None,
        }
    }

    pub fn deviation_point_dest(&self) -> Option<usize> {
        self.last_matching_dest_index
    }

    pub fn source_op_mapping(&self, index: usize) -> Option<&RuntimeOpMappingData> {
        self.source_mapping.get(index)
    }

    pub fn dest_op_mapping(&self, index: usize) -> Option<&RuntimeOpMappingData> {
        self.dest_mapping.get(index)
    }

    /// The source op id of the first *mapped* op after the deviation cursor
    /// whose pushed values disagree with its corresponding dest op. Unmapped
    /// ops are skipped entirely: with no dest counterpart there is nothing
    /// to disagree with.
    pub fn find_first_wrong_value(&self) -> Option<&str> {
        let start = self.last_matching_source_index.map(|i| i + 1).unwrap_or(0);
        self.source.ops[start..].iter().enumerate().find_map(|(offset, op)| {
            let i = start + offset;
            let mapping = self.source_mapping.get(i)?;
            let j = mapping.mapped_op_index?;
            let dest_op = self.dest.ops.get(j)?;
            (op.pushed_values != dest_op.pushed_values).then_some(op.op_id.as_str())
        })
    }

    /// The op id of the last expression both sides agreed on, grounding a
    /// human-readable "things went right up to here" description.
    pub fn get_last_matching_expression(&self) -> Option<&str> {
        self.last_matching_dest_index.map(|i| self.dest.ops[i].op_id.as_str())
    }
}

#[cfg(test)]
impl RuntimeComparison {
    /// Test-only hook for ordering tests that want to exercise specific
    /// deviation-point values without constructing a full traced example.
    pub(crate) fn force_deviation_for_test(&mut self, dest_index: Option<usize>) {
        self.last_matching_dest_index = dest_index;
    }
}
