//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::id::NodeId;

/// Errors raised while turning a flat record list into a tree.
///
/// Lookups and mutations on an existing tree never fail with an error; they
/// report misses through `Option`/`bool`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("invalid builder configuration: {message}")]
    Config { message: String },

    #[error("record #{index} has no usable id in field '{field}'")]
    InvalidId { index: usize, field: String },

    #[error("record {id} references unknown parent {parent}")]
    UnknownParent { id: NodeId, parent: String },

    #[error("no root record: every record references a parent")]
    NoRoot,

    #[error(
        "ambiguous root: {} records have no parent ({})",
        .candidates.len(),
        join_ids(.candidates)
    )]
    AmbiguousRoot { candidates: Vec<NodeId> },
}

impl BuildError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for tree building.
pub type BuildResult<T> = Result<T, BuildError>;
