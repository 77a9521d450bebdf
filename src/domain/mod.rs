//! Domain layer: the tree and the list-to-tree builder
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod error;
pub mod id;
pub mod record;
pub mod tree;

pub use builder::{ListTreeBuilder, RootPolicy, TreeBuilder, TreeBuilderConfig, DEFAULT_PK};
pub use error::{BuildError, BuildResult};
pub use id::NodeId;
pub use record::{is_truthy, Fields, Record};
pub use tree::{SortFn, Tree, TreeIterator};
