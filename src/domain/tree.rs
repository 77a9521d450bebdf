//! Reference-counted N-ary tree.
//!
//! Every node is shared through an `Rc<RefCell<..>>` handle ([`Tree`]). A node
//! owns its children; the link back to the parent is a `Weak` reference, so a
//! detached subtree is freed as soon as the last handle to it goes away.

use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::id::NodeId;
use crate::domain::record::{Fields, Record};

pub type TreeNodeRef<T> = Rc<RefCell<TreeNode<T>>>;
pub type WeakTreeNodeRef<T> = Weak<RefCell<TreeNode<T>>>;

/// Orders two sibling nodes; used to re-sort children during [`Tree::to_list`].
pub type SortFn<'a, T> = &'a dyn Fn(&Tree<T>, &Tree<T>) -> Ordering;

/// Storage behind a [`Tree`] handle.
pub struct TreeNode<T> {
    id: NodeId,
    data: T,
    parent: Option<WeakTreeNodeRef<T>>,
    children: Vec<Tree<T>>,
}

/// Handle to a tree node. Cloning the handle shares the node.
pub struct Tree<T>(TreeNodeRef<T>);

impl<T> Clone for Tree<T> {
    fn clone(&self) -> Self {
        Tree(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        f.debug_struct("Tree")
            .field("id", &node.id)
            .field("data", &node.data)
            .field("parent", &self.parent().map(|p| p.id()))
            .field("children", &node.children)
            .finish()
    }
}

impl<T> Tree<T> {
    pub fn new(id: impl Into<NodeId>, data: T) -> Self {
        Self::with_children(id, data, Vec::new())
    }

    /// Builds a node around an existing list of children.
    ///
    /// The children are taken as-is: their parent links are NOT pointed at the
    /// new node. Use [`Tree::add_child`] when the links matter.
    pub fn with_children(id: impl Into<NodeId>, data: T, children: Vec<Tree<T>>) -> Self {
        Tree(Rc::new(RefCell::new(TreeNode {
            id: id.into(),
            data,
            parent: None,
            children,
        })))
    }

    pub fn id(&self) -> NodeId {
        self.0.borrow().id.clone()
    }

    pub fn data(&self) -> Ref<'_, T> {
        Ref::map(self.0.borrow(), |node| &node.data)
    }

    pub fn data_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.0.borrow_mut(), |node| &mut node.data)
    }

    pub fn parent(&self) -> Option<Tree<T>> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Tree)
    }

    /// Handles to the direct children, in stored order.
    pub fn children(&self) -> Vec<Tree<T>> {
        self.0.borrow().children.clone()
    }

    pub fn len_children(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.borrow().children.is_empty()
    }

    /// True when both handles point at the same node.
    pub fn ptr_eq(&self, other: &Tree<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Depth-first pre-order search: this node first, then each child subtree
    /// from left to right.
    pub fn find_node(&self, id: &NodeId) -> Option<Tree<T>> {
        let node = self.0.borrow();
        if node.id == *id {
            return Some(self.clone());
        }
        node.children.iter().find_map(|child| child.find_node(id))
    }

    fn is_ancestor_or_self(&self, candidate: &Tree<T>) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.ptr_eq(candidate) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Unlinks this node from its parent, if it has one.
    fn detach(&self) {
        let parent = self
            .0
            .borrow_mut()
            .parent
            .take()
            .and_then(|weak| weak.upgrade());
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|c| !Rc::ptr_eq(&c.0, &self.0));
        }
    }

    /// Appends `child` to this node.
    ///
    /// Returns `false` without touching anything when a node with the child's
    /// id already exists anywhere in this subtree, or when `child` is this
    /// node or one of its ancestors. A child that is still attached elsewhere
    /// is moved, not shared.
    #[instrument(level = "trace", skip_all, fields(parent = %self.id(), child = %child.id()))]
    pub fn add_child(&self, child: &Tree<T>) -> bool {
        let child_id = child.id();
        if self.find_node(&child_id).is_some() {
            debug!("id {} already present, skipping", child_id);
            return false;
        }
        if self.is_ancestor_or_self(child) {
            debug!("node {} is an ancestor, refusing to attach", child_id);
            return false;
        }
        child.detach();
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().children.push(child.clone());
        true
    }

    /// Adds `child` under the node with `target_id` (searched from here).
    /// Returns `false` when the target does not exist or the target refuses
    /// the child.
    #[instrument(level = "trace", skip(self, child))]
    pub fn add_child_at(&self, child: &Tree<T>, target_id: &NodeId) -> bool {
        match self.find_node(target_id) {
            Some(target) => target.add_child(child),
            None => {
                debug!("target {} not found", target_id);
                false
            }
        }
    }

    /// Detaches the node with `id` from its parent and returns it.
    ///
    /// The parent is located by walking the child lists below this node, so
    /// children handed to [`Tree::with_children`] are removed as well. The
    /// detached node keeps its own children. Unknown ids are a no-op. Naming
    /// this node itself detaches it only when it has a parent.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&self, id: &NodeId) -> Option<Tree<T>> {
        if self.0.borrow().id == *id {
            self.parent()?;
            self.detach();
            return Some(self.clone());
        }
        let (parent, node) = self.find_parent_of(id)?;
        parent
            .0
            .borrow_mut()
            .children
            .retain(|c| !Rc::ptr_eq(&c.0, &node.0));

        let mut inner = node.0.borrow_mut();
        // a link to some other parent belongs to that parent's child list
        let linked_here = inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map_or(true, |p| Rc::ptr_eq(&p, &parent.0));
        if linked_here {
            inner.parent = None;
        }
        drop(inner);
        Some(node)
    }

    /// First node in pre-order whose child list holds `id`, with that child.
    fn find_parent_of(&self, id: &NodeId) -> Option<(Tree<T>, Tree<T>)> {
        self.iter().find_map(|node| {
            let child = node
                .0
                .borrow()
                .children
                .iter()
                .find(|c| c.0.borrow().id == *id)
                .cloned();
            child.map(|c| (node, c))
        })
    }

    /// All ids in pre-order, this node first.
    pub fn to_list_id(&self) -> Vec<NodeId> {
        self.iter().map(|node| node.id()).collect()
    }

    /// Ids of all nodes without children, left to right.
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.id())
            .collect()
    }

    /// Number of levels below and including this node; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .0
            .borrow()
            .children
            .iter()
            .map(|child| child.depth())
            .max()
            .unwrap_or(0)
    }

    /// Pre-order iterator over node handles.
    pub fn iter(&self) -> TreeIterator<T> {
        TreeIterator {
            stack: vec![self.clone()],
        }
    }
}

impl<T: Record> Tree<T> {
    /// Flattens the subtree into one projected payload per node, pre-order.
    ///
    /// With `sort_fn`, the children of every visited node are stably sorted
    /// before descending, and the sorted order is stored back into the node.
    pub fn to_list(&self, keys: Option<&[&str]>, sort_fn: Option<SortFn<'_, T>>) -> Vec<Fields> {
        let mut list = Vec::new();
        self.collect_list(keys, sort_fn, &mut list);
        list
    }

    /// [`Tree::to_list`] sorting siblings by a derived key.
    pub fn to_list_sorted_by_key<K, F>(&self, keys: Option<&[&str]>, key_fn: F) -> Vec<Fields>
    where
        K: Ord,
        F: Fn(&Tree<T>) -> K,
    {
        let cmp = |a: &Tree<T>, b: &Tree<T>| key_fn(a).cmp(&key_fn(b));
        let sort_fn: SortFn<'_, T> = &cmp;
        self.to_list(keys, Some(sort_fn))
    }

    fn collect_list(
        &self,
        keys: Option<&[&str]>,
        sort_fn: Option<SortFn<'_, T>>,
        list: &mut Vec<Fields>,
    ) {
        list.push(T::project(&self.data(), keys));

        let children = match sort_fn {
            Some(cmp) => {
                let sorted: Vec<Tree<T>> = self
                    .children()
                    .into_iter()
                    .sorted_by(|a, b| cmp(a, b))
                    .collect();
                self.0.borrow_mut().children = sorted.clone();
                sorted
            }
            None => self.children(),
        };
        for child in &children {
            child.collect_list(keys, sort_fn, list);
        }
    }

    /// Projected payloads of the direct children only.
    pub fn get_child_list(&self, keys: Option<&[&str]>) -> Vec<Fields> {
        self.0
            .borrow()
            .children
            .iter()
            .map(|child| T::project(&child.data(), keys))
            .collect()
    }

    /// Nested export: the payload's fields plus, for nodes with children, a
    /// `children_field` array holding the exported children. Leaves carry no
    /// children field at all.
    pub fn to_json(&self, children_field: &str) -> Value {
        let mut object = T::fields(&self.data());
        let children = self.children();
        if !children.is_empty() {
            let exported = children
                .iter()
                .map(|child| child.to_json(children_field))
                .collect();
            object.insert(children_field.to_string(), Value::Array(exported));
        }
        Value::Object(object)
    }
}

pub struct TreeIterator<T> {
    stack: Vec<Tree<T>>,
}

impl<T> Iterator for TreeIterator<T> {
    type Item = Tree<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in current.0.borrow().children.iter().rev() {
            self.stack.push(child.clone());
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: i64) -> Tree<Value> {
        Tree::new(id, json!({ "id": id }))
    }

    //      1
    //     / \
    //    2   3
    //    |
    //    4
    fn sample() -> Tree<Value> {
        let root = node(1);
        root.add_child(&node(2));
        root.add_child(&node(3));
        root.add_child_at(&node(4), &NodeId::from(2));
        root
    }

    #[test]
    fn test_new_node_has_no_parent_and_no_children() {
        let tree = Tree::new(1, json!({"prop": "foo"}));
        assert_eq!(tree.id(), NodeId::from(1));
        assert!(tree.parent().is_none());
        assert!(tree.is_leaf());
        assert_eq!(tree.data()["prop"], json!("foo"));
    }

    #[test]
    fn test_with_children_does_not_reparent() {
        let child = node(2);
        let tree = Tree::with_children(1, json!({}), vec![child.clone()]);
        assert_eq!(tree.len_children(), 1);
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_iter_is_preorder() {
        let ids: Vec<NodeId> = sample().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![NodeId::from(1), NodeId::from(2), NodeId::from(4), NodeId::from(3)]);
    }

    #[test]
    fn test_depth_and_leaves() {
        let tree = sample();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_ids(), vec![NodeId::from(4), NodeId::from(3)]);
    }

    #[test]
    fn test_refuses_to_attach_ancestor() {
        let tree = sample();
        let four = tree.find_node(&NodeId::from(4)).unwrap();
        assert!(four.add_child(&node(99)));
        // the root is an ancestor of node 4 and must not become its child
        assert!(!four.add_child(&tree));
        assert_eq!(four.len_children(), 1);
        assert!(tree.is_root());
    }

    #[test]
    fn test_add_child_moves_attached_node() {
        let tree = sample();
        let four = tree.find_node(&NodeId::from(4)).unwrap();
        let three = tree.find_node(&NodeId::from(3)).unwrap();
        let other = node(10);
        assert!(other.add_child(&four));
        assert!(four.parent().unwrap().ptr_eq(&other));
        assert!(tree.find_node(&NodeId::from(4)).is_none());
        assert!(three.parent().unwrap().ptr_eq(&tree));
    }

    #[test]
    fn test_data_mut_updates_payload() {
        let tree = sample();
        tree.data_mut()["name"] = json!("root");
        assert_eq!(tree.to_json("c")["name"], json!("root"));
    }
}
