// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Serialization of a [`Tree`] into a flattened device tree blob.

use alloc::vec::Vec;

use log::{debug, trace, warn};
use qdt_fdt::FdtWriter;
use qdt_fdt::header::FdtHeader;

use crate::error::{Error, Step};
use crate::node::NodeId;
use crate::tree::Tree;

/// Receives the structure of a tree, one event at a time.
///
/// [`Tree::flatten_into`] calls `begin_node` when entering a node, then
/// `property` for each of its properties and recurses into each child, all
/// in insertion order, and finally calls `end_node`.
pub trait Encoder {
    /// Starts a node.
    ///
    /// # Errors
    ///
    /// Returns the encoder's failure code; flattening stops at the first one.
    fn begin_node(&mut self, name: &str) -> qdt_fdt::Result<()>;

    /// Emits a property of the current node.
    ///
    /// # Errors
    ///
    /// Returns the encoder's failure code; flattening stops at the first one.
    fn property(&mut self, name: &str, value: &[u8]) -> qdt_fdt::Result<()>;

    /// Ends the current node.
    ///
    /// # Errors
    ///
    /// Returns the encoder's failure code; flattening stops at the first one.
    fn end_node(&mut self) -> qdt_fdt::Result<()>;
}

impl Encoder for FdtWriter {
    fn begin_node(&mut self, name: &str) -> qdt_fdt::Result<()> {
        FdtWriter::begin_node(self, name)
    }

    fn property(&mut self, name: &str, value: &[u8]) -> qdt_fdt::Result<()> {
        FdtWriter::property(self, name, value)
    }

    fn end_node(&mut self) -> qdt_fdt::Result<()> {
        FdtWriter::end_node(self)
    }
}

impl Tree {
    /// Flattens the tree under `root` into a blob of `bufsize` bytes.
    ///
    /// The memory reservation map is left empty. On success the whole buffer
    /// is returned; its header's `totalsize` gives the number of bytes used.
    /// On failure nothing is returned and the buffer is released.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Tree;
    /// let mut tree = Tree::new();
    /// let root = tree.new_root();
    /// tree.node_mut(root).set_property_string("compatible", "linux,dummy-virt");
    ///
    /// let dtb = tree.flatten(root, 4096).unwrap();
    /// assert_eq!(dtb.len(), 4096);
    /// assert_eq!(&dtb[..4], &[0xd0, 0x0d, 0xfe, 0xed]);
    ///
    /// assert!(tree.flatten(root, 64).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first failure reported by the encoder, most commonly
    /// [`qdt_fdt::Error::NoSpace`] when `bufsize` is too small.
    ///
    /// # Panics
    ///
    /// Panics if `root` has a parent.
    pub fn flatten(&self, root: NodeId, bufsize: usize) -> Result<Vec<u8>, Error> {
        self.assert_root(root, "flatten");
        debug!("flattening device tree into a {bufsize} byte buffer");

        let dtb = self
            .write_blob(root, bufsize)
            .inspect_err(|err| warn!("{err}"))?;

        if let Some(header) = FdtHeader::from_blob(&dtb) {
            debug!(
                "flattened device tree uses {} of {bufsize} bytes",
                header.totalsize()
            );
        }
        Ok(dtb)
    }

    /// Emits the structure of the tree under `root` to `encoder`.
    ///
    /// Stops at the first encoder failure and returns it; events emitted
    /// before the failure are not undone.
    ///
    /// # Errors
    ///
    /// Returns the first failure reported by the encoder.
    ///
    /// # Panics
    ///
    /// Panics if `root` has a parent.
    pub fn flatten_into<E: Encoder + ?Sized>(
        &self,
        root: NodeId,
        encoder: &mut E,
    ) -> Result<(), Error> {
        self.assert_root(root, "flatten_into");
        self.flatten_node(root, encoder)
    }

    fn write_blob(&self, root: NodeId, bufsize: usize) -> Result<Vec<u8>, Error> {
        let mut writer = FdtWriter::new(bufsize).map_err(Error::at(Step::Create))?;
        writer
            .finish_reservemap()
            .map_err(Error::at(Step::FinishReservemap))?;
        self.flatten_node(root, &mut writer)?;
        writer.finish().map_err(Error::at(Step::Finish))
    }

    fn flatten_node<E: Encoder + ?Sized>(&self, id: NodeId, encoder: &mut E) -> Result<(), Error> {
        let node = self.node(id);
        trace!("flattening node {}", self.path(id));

        encoder
            .begin_node(node.name())
            .map_err(Error::at(Step::BeginNode))?;
        for property in node.properties() {
            encoder
                .property(property.name(), property.value())
                .map_err(Error::at(Step::Property))?;
        }
        for &child in node.children() {
            self.flatten_node(child, encoder)?;
        }
        encoder.end_node().map_err(Error::at(Step::EndNode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bufsize_below_header() {
        let mut tree = Tree::new();
        let root = tree.new_root();
        let err = tree.flatten(root, 8).unwrap_err();
        assert_eq!(err.step(), Step::Create);
        assert_eq!(err.code(), qdt_fdt::Error::NoSpace);
    }

    #[test]
    fn bufsize_below_reservation_map() {
        let mut tree = Tree::new();
        let root = tree.new_root();
        let err = tree.flatten(root, FdtHeader::SIZE + 4).unwrap_err();
        assert_eq!(err.step(), Step::FinishReservemap);
    }

    #[test]
    fn no_room_for_end_token() {
        // header + map + empty root node, without the final token.
        let mut tree = Tree::new();
        let root = tree.new_root();
        let err = tree.flatten(root, 40 + 16 + 8 + 4).unwrap_err();
        assert_eq!(err.step(), Step::Finish);
        assert!(tree.flatten(root, 40 + 16 + 8 + 4 + 4).is_ok());
    }
}
