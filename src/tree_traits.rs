//! Text rendering of trees via `termtree`.

use termtree::Tree as TextTree;
use tracing::instrument;

use crate::domain::{Record, Tree};

pub trait TreeNodeConvert {
    /// Indented text tree labelled with node ids.
    fn to_tree_string(&self) -> TextTree<String>;

    /// Like [`TreeNodeConvert::to_tree_string`], with the value of `field`
    /// appended to each label when the payload has it.
    fn to_labeled_tree(&self, field: &str) -> TextTree<String>;
}

impl<T: Record> TreeNodeConvert for Tree<T> {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> TextTree<String> {
        let leaves: Vec<_> = self
            .children()
            .iter()
            .map(|c| c.to_tree_string())
            .collect();

        TextTree::new(self.id().to_string()).with_leaves(leaves)
    }

    #[instrument(level = "trace", skip(self))]
    fn to_labeled_tree(&self, field: &str) -> TextTree<String> {
        let label = match T::field(&self.data(), field) {
            Some(serde_json::Value::String(s)) => format!("{} ({})", self.id(), s),
            Some(value) => format!("{} ({})", self.id(), value),
            None => self.id().to_string(),
        };
        let leaves: Vec<_> = self
            .children()
            .iter()
            .map(|c| c.to_labeled_tree(field))
            .collect();

        TextTree::new(label).with_leaves(leaves)
    }
}
