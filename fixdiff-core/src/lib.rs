//! Core types shared by the `fixdiff` edit-script generator: the mutable
//! tree model, the edit record and donor set, the error taxonomy, and a
//! generic longest-common-subsequence helper used by both list-reordering
//! and runtime-trace alignment.

#![forbid(unsafe_code)]

mod display;
pub mod edit;
pub mod error;
pub mod mapping;
pub mod node;
pub mod sequences;
pub mod symbols;

pub use edit::{Action, DonorSet, Edit, EditScript, KeyedPlacement, ListPlacement, Placement, RenameInfo, Stage, TempKeyFix};
pub use error::EditError;
pub use mapping::Mapping;
pub use node::{NodeData, NodeId, Slot, Tree};
