// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An in-memory builder for Open Firmware style device trees.
//!
//! Firmware describes the hardware it presents to a guest (CPUs, memory,
//! interrupt controllers, peripherals) by building a [`Tree`] top-down and
//! then flattening it once into a blob the guest kernel can consume.
//!
//! ## Building
//!
//! A [`Tree`] owns all of its [`Node`]s and hands out [`NodeId`] handles.
//! Nodes are created as children of an existing node with
//! [`Tree::add_subnode`] and can later be found again by path with
//! [`Tree::get_node`]. Properties are plain byte values; [`Node`] has setters
//! for the common encodings (NUL-terminated strings, big-endian cells,
//! phandles).
//!
//! ## Flattening
//!
//! [`Tree::flatten`] walks the tree depth-first and writes it with a
//! [`qdt_fdt::FdtWriter`] into a buffer of a size chosen by the caller.
//! Nodes and properties come out in exactly the order they were added.
//! Other encoders can be driven through the [`Encoder`] trait with
//! [`Tree::flatten_into`].
//!
//! ## Errors
//!
//! Caller bugs (a `/` in a node name, an absolute lookup or a flatten that
//! does not start at a root, a reserved phandle value) panic. Encoder
//! failures, such as a buffer that is too small, are returned as an
//! [`Error`].
//!
//! # Examples
//!
//! ```
//! use qdt::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.new_root();
//! tree.node_mut(root).set_property_string("compatible", "linux,dummy-virt");
//! tree.node_mut(root).set_property_cells("#address-cells", &[2]);
//!
//! let cpus = tree.add_subnode(root, "cpus");
//! let cpu = tree.add_subnode(cpus, "cpu@0");
//! tree.node_mut(cpu).set_property_string("device_type", "cpu");
//! tree.node_mut(cpu).set_property_cells("reg", &[0]);
//!
//! let memory = tree.add_subnode(root, "memory@40000000");
//! tree.node_mut(memory).set_property_u64s("reg", &[0x4000_0000, 0x800_0000]);
//!
//! let cpu = tree.get_node(root, "/cpus/cpu@0").unwrap();
//! assert_eq!(tree.node(cpu).property("reg").unwrap().as_u32(), Some(0));
//!
//! let dtb = tree.flatten(root, 0x1000).unwrap();
//! assert_eq!(dtb.len(), 0x1000);
//! ```

#![no_std]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

extern crate alloc;

pub mod error;
mod flatten;
mod node;
mod property;
mod tree;

pub use error::{Error, Step};
pub use flatten::Encoder;
pub use node::{Node, NodeId, PATH_SEPARATOR};
pub use property::Property;
pub use tree::Tree;
