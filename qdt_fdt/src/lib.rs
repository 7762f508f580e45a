// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A sequential-write encoder for Flattened Device Tree (FDT) blobs.
//!
//! The [`FdtWriter`] produces a blob one structural event at a time: the
//! memory reservation map first, then a depth-first stream of
//! `begin_node`/`property`/`end_node` calls, and finally [`FdtWriter::finish`]
//! which lays out the strings block and fills in the header.
//!
//! The writer works inside a buffer of fixed capacity chosen up front. Any
//! call that would not fit fails with [`Error::NoSpace`] and writes nothing.
//!
//! # Examples
//!
//! ```
//! use qdt_fdt::FdtWriter;
//! use qdt_fdt::header::FdtHeader;
//!
//! let mut writer = FdtWriter::new(256).unwrap();
//! writer.finish_reservemap().unwrap();
//! writer.begin_node("").unwrap();
//! writer.property("compatible", b"linux,dummy-virt\0").unwrap();
//! writer.end_node().unwrap();
//! let dtb = writer.finish().unwrap();
//!
//! assert_eq!(dtb.len(), 256);
//! let header = FdtHeader::from_blob(&dtb).unwrap();
//! assert!(header.totalsize() as usize <= dtb.len());
//! ```

#![no_std]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

extern crate alloc;

pub mod error;
pub mod header;
pub mod memreserve;
mod writer;

pub use error::{Error, Result};
pub use memreserve::MemoryReservation;
pub use writer::FdtWriter;
