// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use indexmap::IndexMap;
use twox_hash::xxhash64;

use crate::property::Property;

/// Separator between the node names of a path.
pub const PATH_SEPARATOR: char = '/';

/// Handles reserved by the device tree format.
const INVALID_PHANDLES: [u32; 2] = [0, u32::MAX];

/// A handle to a node stored in a [`Tree`](crate::Tree).
///
/// Handles are only meaningful for the tree that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A device tree node.
///
/// Properties are kept in an [`IndexMap`], which gives lookups by name while
/// preserving insertion order for flattening. Children are handles into the
/// owning [`Tree`](crate::Tree), in the order they were added; siblings may
/// share a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    properties: IndexMap<String, Property, xxhash64::State>,
    children: Vec<NodeId>,
}

impl Node {
    /// # Panics
    ///
    /// Panics if `name` contains [`PATH_SEPARATOR`].
    pub(crate) fn new(name: &str, parent: Option<NodeId>) -> Self {
        assert!(
            !name.contains(PATH_SEPARATOR),
            "node name {name:?} contains '{PATH_SEPARATOR}'"
        );
        Self {
            name: name.to_owned(),
            parent,
            properties: IndexMap::with_hasher(xxhash64::State::with_seed(0xdead_cafe)),
            children: Vec::new(),
        }
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Returns the name of this node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent of this node, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns `true` if this node has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the children of this node in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns an iterator over the properties of this node in insertion
    /// order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Finds a property by its name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// let node = tree.node_mut(root);
    /// node.set_property("my-prop", [1, 2, 3, 4]);
    /// assert_eq!(node.property("my-prop").unwrap().value(), &[1, 2, 3, 4]);
    /// assert!(node.property("other").is_none());
    /// ```
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Removes a property by its name. Does nothing if there is none.
    pub fn delete_property(&mut self, name: &str) {
        self.properties.shift_remove(name);
    }

    /// Sets a property to a copy of `value`.
    ///
    /// Any existing property with the same name is removed first, so the new
    /// property always comes last in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// let node = tree.node_mut(root);
    /// node.set_property("a", [1]);
    /// node.set_property("b", [2]);
    /// node.set_property("a", [3]);
    /// let names: Vec<_> = node.properties().map(|p| p.name()).collect();
    /// assert_eq!(names, ["b", "a"]);
    /// ```
    pub fn set_property(&mut self, name: &str, value: impl Into<Vec<u8>>) -> &Property {
        self.properties.shift_remove(name);
        let (index, _) = self
            .properties
            .insert_full(name.to_owned(), Property::new(name, value));
        &self.properties[index]
    }

    /// Sets a string property, stored with its NUL terminator.
    pub fn set_property_string(&mut self, name: &str, value: &str) -> &Property {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        self.set_property(name, bytes)
    }

    /// Sets a property to a list of big-endian 32-bit cells.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// let prop = tree.node_mut(root).set_property_cells("#address-cells", &[2]);
    /// assert_eq!(prop.value(), &[0, 0, 0, 2]);
    /// ```
    pub fn set_property_cells(&mut self, name: &str, values: &[u32]) -> &Property {
        let bytes: Vec<u8> = values.iter().flat_map(|value| value.to_be_bytes()).collect();
        self.set_property(name, bytes)
    }

    /// Sets a property to a list of big-endian 64-bit values.
    pub fn set_property_u64s(&mut self, name: &str, values: &[u64]) -> &Property {
        let bytes: Vec<u8> = values.iter().flat_map(|value| value.to_be_bytes()).collect();
        self.set_property(name, bytes)
    }

    /// Sets a property without a value, such as `dma-coherent`.
    pub fn set_property_empty(&mut self, name: &str) -> &Property {
        self.set_property(name, Vec::new())
    }

    /// Sets a property to a copy of another property's value.
    ///
    /// To copy between two nodes of the same tree, use
    /// [`Tree::copy_property`](crate::Tree::copy_property).
    pub fn set_property_dup(&mut self, name: &str, source: &Property) -> &Property {
        self.set_property(name, source.value())
    }

    /// Sets both `phandle` and `linux,phandle` to `phandle`.
    ///
    /// # Panics
    ///
    /// Panics if `phandle` is 0 or `0xffffffff`, which the format reserves.
    pub fn set_phandle(&mut self, phandle: u32) {
        assert!(
            !INVALID_PHANDLES.contains(&phandle),
            "invalid phandle {phandle:#x} for node {:?}",
            self.name
        );
        self.set_property_cells("linux,phandle", &[phandle]);
        self.set_property_cells("phandle", &[phandle]);
    }
}
