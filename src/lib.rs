//! In-memory N-ary trees and a builder that reconstructs them from flat
//! records linked by a parent-reference field.
//!
//! ```
//! use listree::{ListTreeBuilder, NodeId, TreeBuilder, TreeBuilderConfig};
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({"id": 1}),
//!     json!({"id": 2, "fk": 1}),
//! ];
//! let tree = ListTreeBuilder::new()
//!     .build_tree(&TreeBuilderConfig::new("fk"), records)
//!     .unwrap();
//! assert_eq!(tree.to_list_id(), vec![NodeId::from(1), NodeId::from(2)]);
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod tree_traits;
pub mod util;

pub use domain::{
    BuildError, BuildResult, Fields, ListTreeBuilder, NodeId, Record, RootPolicy, SortFn, Tree,
    TreeBuilder, TreeBuilderConfig,
};
pub use tree_traits::TreeNodeConvert;
