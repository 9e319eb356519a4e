//! A mapping-driven edit-script generator: given a source tree, a
//! destination tree, and a node correspondence between them, produces a
//! typed, ordered edit script that transforms the source into an exact
//! copy of the destination. Also includes runtime-trace comparison, used
//! to rank repair candidates by how close their execution gets to the
//! reference.
//!
//! Parsing source into a tree, computing the node correspondence, applying
//! the edit script, simplifying it against a test oracle, and executing
//! code are all out of scope: see the module docs on [`generator`] and
//! [`runtime`] for the external interfaces this crate consumes.

#![forbid(unsafe_code)]

#[macro_use]
mod tracing_macros;

pub mod generator;
pub mod ordering;
pub mod report;
pub mod runtime;

pub use fixdiff_core::{
    Action, DonorSet, Edit, EditError, EditScript, KeyedPlacement, ListPlacement, Mapping, NodeData, NodeId, Placement,
    RenameInfo, Slot, Stage, TempKeyFix, Tree,
};
pub use generator::{generate_edit_script, GeneratedScript, GeneratorOptions};
pub use ordering::{compare_comparisons, Effect};
pub use runtime::{ExecutionTrace, OpNodeMapper, RunOutcome, RuntimeComparison, RuntimeOpMappingData, Tracer, TraceOp};
