// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Node storage and path resolution.

use alloc::string::String;
use alloc::vec::Vec;

use crate::node::{Node, NodeId, PATH_SEPARATOR};
use crate::property::Property;

/// Storage for device tree nodes.
///
/// A `Tree` owns every node created through it and hands out [`NodeId`]s.
/// Each node records its parent as a plain handle, so a node can find its
/// way to the root without owning it. Nodes are attached to their parent
/// when they are created and are never moved or removed afterwards.
///
/// A parentless node is a root. A `Tree` usually holds exactly one, created
/// with [`new_root`](Self::new_root).
///
/// # Examples
///
/// ```
/// # use qdt::Tree;
/// let mut tree = Tree::new();
/// let root = tree.new_root();
/// let cpus = tree.add_subnode(root, "cpus");
/// let cpu = tree.add_subnode(cpus, "cpu@0");
/// tree.node_mut(cpu).set_property_string("device_type", "cpu");
///
/// assert_eq!(tree.get_node(root, "/cpus/cpu@0"), Some(cpu));
/// assert_eq!(tree.get_node(root, "/cpus/cpu@1"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Creates an empty `Tree`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parentless node.
    ///
    /// # Panics
    ///
    /// Panics if `name` contains `/`.
    pub fn new_node(&mut self, name: &str) -> NodeId {
        self.insert(Node::new(name, None))
    }

    /// Creates a root node with the conventional empty name.
    pub fn new_root(&mut self) -> NodeId {
        self.new_node("")
    }

    /// Creates a node and appends it to the children of `parent`.
    ///
    /// Sibling names are not checked for uniqueness. Path lookups only ever
    /// find the first of several same-named siblings.
    ///
    /// # Panics
    ///
    /// Panics if `name` contains `/` or `parent` is not a node of this tree.
    pub fn add_subnode(&mut self, parent: NodeId, name: &str) -> NodeId {
        let child = Node::new(name, Some(parent));
        let id = self.insert(child);
        self.node_mut(parent).push_child(id);
        id
    }

    /// Returns the number of nodes in this tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a reference to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a node of this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id.0)
            .unwrap_or_else(|| panic!("no node {id} in this tree"))
    }

    /// Returns a mutable reference to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a node of this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("no node {id} in this tree"))
    }

    /// Resolves a `/`-separated path relative to `node`.
    ///
    /// Every segment must exactly match the name of a direct child of the
    /// node reached so far; the first matching child is taken. There is no
    /// special meaning for `.` or `..`, and an empty segment (from `""`, a
    /// doubled or a trailing `/`) only matches a child with an empty name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// let soc = tree.add_subnode(root, "soc");
    /// let uart = tree.add_subnode(soc, "uart@9000000");
    ///
    /// assert_eq!(tree.get_node_relative(root, "soc/uart@9000000"), Some(uart));
    /// assert_eq!(tree.get_node_relative(soc, "uart@9000000"), Some(uart));
    /// assert_eq!(tree.get_node_relative(root, "soc/"), None);
    /// ```
    #[must_use]
    pub fn get_node_relative(&self, node: NodeId, path: &str) -> Option<NodeId> {
        path.split(PATH_SEPARATOR)
            .try_fold(node, |current, segment| self.subnode(current, segment))
    }

    /// Resolves an absolute path starting at `root`.
    ///
    /// The leading `/` is stripped and the rest is resolved with
    /// [`get_node_relative`](Self::get_node_relative). As a consequence `"/"`
    /// alone does not name the root itself.
    ///
    /// # Panics
    ///
    /// Panics if `root` has a parent or `path` does not start with `/`.
    #[must_use]
    pub fn get_node(&self, root: NodeId, path: &str) -> Option<NodeId> {
        self.assert_root(root, "get_node");
        let Some(relative) = path.strip_prefix(PATH_SEPARATOR) else {
            panic!("absolute path {path:?} does not start with '{PATH_SEPARATOR}'");
        };
        self.get_node_relative(root, relative)
    }

    /// Returns the full path of a node, `/` for a root.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// let cpus = tree.add_subnode(root, "cpus");
    /// let cpu = tree.add_subnode(cpus, "cpu@0");
    /// assert_eq!(tree.path(cpu), "/cpus/cpu@0");
    /// assert_eq!(tree.path(root), "/");
    /// ```
    #[must_use]
    pub fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = self.node(id);
        while let Some(parent) = current.parent() {
            names.push(current.name());
            current = self.node(parent);
        }

        if names.is_empty() {
            return String::from(PATH_SEPARATOR);
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push(PATH_SEPARATOR);
            path.push_str(name);
        }
        path
    }

    /// Copies the value of property `name` of node `from` into property
    /// `new_name` of node `to`.
    ///
    /// Returns the new property, or `None` (and changes nothing) if `from`
    /// has no property `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// let intc = tree.add_subnode(root, "intc");
    /// tree.node_mut(intc).set_phandle(1);
    /// tree.copy_property(intc, "phandle", root, "interrupt-parent");
    /// assert_eq!(tree.node(root).property("interrupt-parent").unwrap().as_u32(), Some(1));
    /// ```
    pub fn copy_property(
        &mut self,
        from: NodeId,
        name: &str,
        to: NodeId,
        new_name: &str,
    ) -> Option<&Property> {
        let value = self.node(from).property(name)?.value().to_vec();
        Some(self.node_mut(to).set_property(new_name, value))
    }

    pub(crate) fn assert_root(&self, id: NodeId, operation: &str) {
        assert!(
            self.node(id).is_root(),
            "{operation}() requires a root node, but {} has a parent",
            self.path(id)
        );
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn subnode(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)
            .children()
            .iter()
            .copied()
            .find(|&child| self.node(child).name() == name)
    }
}
