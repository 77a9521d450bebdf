//! Rebuilds a tree from flat records linked by a parent-reference field.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::error::{BuildError, BuildResult};
use crate::domain::id::NodeId;
use crate::domain::record::{is_truthy, Record};
use crate::domain::tree::Tree;

/// Field used as node id when the configuration names none.
pub const DEFAULT_PK: &str = "id";

/// What to do when the records do not single out exactly one root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Exactly one record may lack a parent reference.
    #[default]
    Strict,
    /// The last parentless record becomes the root; earlier ones are dropped.
    LastWins,
}

/// Builder options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeBuilderConfig {
    /// Record field holding the node id (default: `id`)
    pub pk: Option<String>,
    /// Record field holding the parent's id (required)
    pub fk: Option<String>,
    /// Caller-specific data, ignored by the builder
    pub extra: Option<Value>,
    pub root_policy: RootPolicy,
}

impl TreeBuilderConfig {
    pub fn new(fk: impl Into<String>) -> Self {
        Self {
            fk: Some(fk.into()),
            ..Self::default()
        }
    }

    pub fn with_pk(mut self, pk: impl Into<String>) -> Self {
        self.pk = Some(pk.into());
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn with_root_policy(mut self, root_policy: RootPolicy) -> Self {
        self.root_policy = root_policy;
        self
    }

    /// Reads a configuration from untyped data, e.g. `{"fk": "parent"}`.
    ///
    /// A missing or non-string `fk` is a configuration error.
    pub fn from_value(value: Value) -> BuildResult<Self> {
        match value.get("fk") {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(BuildError::config(format!(
                    "foreign key (fk) must be a string, got {}",
                    other
                )))
            }
            None => return Err(BuildError::config("foreign key (fk) must be provided")),
        }
        let config: Self =
            serde_json::from_value(value).map_err(|e| BuildError::config(e.to_string()))?;
        config.fk()?;
        Ok(config)
    }

    pub fn pk(&self) -> &str {
        match self.pk.as_deref() {
            Some(pk) if !pk.is_empty() => pk,
            _ => DEFAULT_PK,
        }
    }

    /// The validated foreign key field name.
    pub fn fk(&self) -> BuildResult<&str> {
        match self.fk.as_deref() {
            Some(fk) if !fk.trim().is_empty() => Ok(fk),
            _ => Err(BuildError::config("foreign key (fk) must be provided")),
        }
    }
}

/// Anything able to produce a tree from a configuration and input records.
pub trait TreeBuilder<E> {
    fn build_tree<I>(&self, config: &TreeBuilderConfig, records: I) -> BuildResult<Tree<E>>
    where
        I: IntoIterator<Item = E>;
}

/// Converts a flat record list into a tree.
///
/// Each record becomes a node keyed by its `pk` field. A record whose `fk`
/// field is truthy is attached under the record with that id; a record
/// without one is a root candidate. When several records share an id, the
/// first one is the one children attach to.
///
/// Ids compare by JSON type: an `fk` of `"1"` does not match a record whose id
/// is the number `1`, and fails with [`BuildError::UnknownParent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ListTreeBuilder;

impl ListTreeBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl<E: Record> TreeBuilder<E> for ListTreeBuilder {
    #[instrument(level = "debug", skip_all, fields(pk = config.pk(), fk = ?config.fk))]
    fn build_tree<I>(&self, config: &TreeBuilderConfig, records: I) -> BuildResult<Tree<E>>
    where
        I: IntoIterator<Item = E>,
    {
        let fk = config.fk()?;
        let pk = config.pk();

        let mut nodes: Vec<(Tree<E>, Option<Value>)> = Vec::new();
        let mut by_id: HashMap<NodeId, Tree<E>> = HashMap::new();

        for (index, record) in records.into_iter().enumerate() {
            let mut fields = record.fields();
            let id = fields
                .get(pk)
                .and_then(NodeId::from_value)
                .ok_or_else(|| BuildError::InvalidId {
                    index,
                    field: pk.to_string(),
                })?;
            let parent_ref = fields.remove(fk).filter(is_truthy);

            let node = Tree::new(id.clone(), record);
            match by_id.entry(id) {
                Entry::Occupied(e) => debug!("duplicate id {} shadowed by first record", e.key()),
                Entry::Vacant(e) => {
                    e.insert(node.clone());
                }
            }
            nodes.push((node, parent_ref));
        }
        debug!("wrapped {} records", nodes.len());

        let mut roots: Vec<Tree<E>> = Vec::new();
        for (node, parent_ref) in nodes {
            let Some(parent_ref) = parent_ref else {
                roots.push(node);
                continue;
            };
            let parent_id = NodeId::from_value(&parent_ref);
            let parent = parent_id
                .as_ref()
                .and_then(|parent_id| by_id.get(parent_id))
                .ok_or_else(|| BuildError::UnknownParent {
                    id: node.id(),
                    parent: parent_id
                        .as_ref()
                        .map_or_else(|| parent_ref.to_string(), NodeId::to_string),
                })?;
            if !parent.add_child(&node) {
                debug!("record {} not attached under {}", node.id(), parent.id());
            }
        }

        resolve_root(roots, config.root_policy)
    }
}

fn resolve_root<E>(mut roots: Vec<Tree<E>>, policy: RootPolicy) -> BuildResult<Tree<E>> {
    match (roots.len(), policy) {
        (0, _) => Err(BuildError::NoRoot),
        (1, _) | (_, RootPolicy::LastWins) => {
            if roots.len() > 1 {
                warn!(
                    "{} parentless records, keeping the last one as root",
                    roots.len()
                );
            }
            roots.pop().ok_or(BuildError::NoRoot)
        }
        (_, RootPolicy::Strict) => Err(BuildError::AmbiguousRoot {
            candidates: roots.iter().map(|r| r.id()).collect(),
        }),
    }
}
