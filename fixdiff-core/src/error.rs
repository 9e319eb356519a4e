//! The error taxonomy shared by the generator and its consumers.

use thiserror::Error;

use crate::node::NodeId;

/// Failures the generator (or an `Edit::apply` consumer) can surface.
#[derive(Debug, Error)]
pub enum EditError {
    /// An insert or delete was attempted on a non-leaf node outside of a
    /// MOVE (which is internally a delete+insert that waives this guard).
    #[error("forbidden edit: node {node} is not a leaf but {action} does not allow subtrees")]
    ForbiddenEdit {
        node: NodeId,
        action: &'static str,
    },

    /// A parent link expected by the dest-mirrored position rule was
    /// missing; this is recovered defensively (outward neighbour walk or a
    /// deterministic fallback endpoint) but is reported when recovery itself
    /// cannot find any valid placement.
    #[error("mapping inconsistency while placing node {node}: {detail}")]
    MappingInconsistency { node: NodeId, detail: String },

    /// Fatal: after applying the full script, the working tree does not
    /// match the destination tree.
    #[error("post-condition failed: tree after applying the edit script does not match the destination\n{diagnostic}")]
    PostConditionFailed { diagnostic: String },
}
